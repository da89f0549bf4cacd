//! CRC-16 (ARC polynomial, reflected, zero init) over stored blocks.
//!
//! The bitwise form costs no table space and the blocks are small enough
//! that speed is irrelevant.

/// Fold one byte into a running CRC.
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ byte as u16;
    for _ in 0..8 {
        crc = if crc & 0x0001 != 0 {
            (crc >> 1) ^ 0xA001
        } else {
            crc >> 1
        };
    }
    crc
}

/// CRC over a whole slice, zero initial value.
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |crc, &b| crc16_update(crc, b))
}
