//! Interrupt-Shared Pulse State
//!
//! The only state in the system shared across execution contexts. The
//! interrupt side mutates, the main loop snapshot-copies; neither ever
//! does anything else while the critical section is held. Every field is a
//! plain integer so the copy is a handful of loads and stores.
//!
//! Both state types are `const`-constructible so a board can place them in
//! a `static` and call the `on_*` methods from its interrupt handlers.

use core::cell::Cell;
use critical_section::Mutex;

use crate::time::Micros;

/// Raw cells for the elapsed-time strategy.
#[derive(Debug, Clone, Copy, Default)]
struct PulseCells {
    /// Total falling edges seen since boot, wrapping.
    edges_total: u16,
    /// Edges accumulated toward the next capture.
    edges_pending: u16,
    /// Timestamp of the capture before last (µs).
    last_capture_us: Micros,
    /// Timestamp of the most recent capture (µs).
    this_capture_us: Micros,
}

/// Shared state written by the edge interrupt, read by
/// [`super::ElapsedTimeEstimator`].
pub struct PulseState {
    cells: Mutex<Cell<PulseCells>>,
    edges_per_capture: u16,
}

/// Consistent copy of [`PulseState`] taken in one critical section.
#[derive(Debug, Clone, Copy)]
pub struct PulseSnapshot {
    /// Total edges seen since boot, wrapping.
    pub edges_total: u16,
    /// Timestamp of the capture before last (µs).
    pub last_capture_us: Micros,
    /// Timestamp of the most recent capture (µs).
    pub this_capture_us: Micros,
}

impl PulseState {
    /// Create state that captures a timestamp every `edges_per_capture`
    /// falling edges (10 or more; fewer makes per-edge jitter visible).
    pub const fn new(edges_per_capture: u16) -> Self {
        Self {
            cells: Mutex::new(Cell::new(PulseCells {
                edges_total: 0,
                edges_pending: 0,
                last_capture_us: 0,
                this_capture_us: 0,
            })),
            edges_per_capture,
        }
    }

    /// Edges between timestamp captures.
    pub fn edges_per_capture(&self) -> u16 {
        self.edges_per_capture
    }

    /// Record one falling edge. Called from the edge interrupt with the
    /// current microsecond clock.
    pub fn on_edge(&self, now_us: Micros) {
        critical_section::with(|cs| {
            let cell = self.cells.borrow(cs);
            let mut cells = cell.get();
            cells.edges_total = cells.edges_total.wrapping_add(1);
            cells.edges_pending += 1;
            if cells.edges_pending == self.edges_per_capture {
                cells.last_capture_us = cells.this_capture_us;
                cells.this_capture_us = now_us;
                cells.edges_pending = 0;
            }
            cell.set(cells);
        });
    }

    /// Momentary copy of the counters; the section covers the copy and
    /// nothing else.
    pub fn snapshot(&self) -> PulseSnapshot {
        let cells = critical_section::with(|cs| self.cells.borrow(cs).get());
        PulseSnapshot {
            edges_total: cells.edges_total,
            last_capture_us: cells.last_capture_us,
            this_capture_us: cells.this_capture_us,
        }
    }
}

/// Raw cells for the hardware-capture strategy.
#[derive(Debug, Clone, Copy, Default)]
struct CaptureCells {
    /// Edges accumulated toward the next counter capture.
    edges_pending: u16,
    /// Total edge interrupts since boot, wrapping.
    edge_interrupts: u16,
    /// Total counter-overflow interrupts since boot, wrapping.
    overflow_interrupts: u16,
    /// Which slot holds the most recent capture.
    current_slot: u8,
    /// Captured counter values, double-buffered.
    ticks: [u16; 2],
    /// Overflow interrupt count at each capture, double-buffered.
    overflows: [u16; 2],
}

/// Shared state written by the edge and overflow interrupts, read by
/// [`super::CaptureEstimator`].
pub struct CaptureState {
    cells: Mutex<Cell<CaptureCells>>,
    edges_per_capture: u16,
}

/// Consistent copy of [`CaptureState`] taken in one critical section.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSnapshot {
    /// Counter value at the most recent capture.
    pub this_ticks: u16,
    /// Counter value at the capture before.
    pub last_ticks: u16,
    /// Overflow interrupt count at the most recent capture.
    pub this_overflows: u16,
    /// Overflow interrupt count at the capture before.
    pub last_overflows: u16,
    /// Total edge interrupts since boot, wrapping.
    pub edge_interrupts: u16,
    /// Total overflow interrupts since boot, wrapping.
    pub overflow_interrupts: u16,
}

impl CaptureState {
    /// Create state that samples the free-running counter every
    /// `edges_per_capture` edges.
    pub const fn new(edges_per_capture: u16) -> Self {
        Self {
            cells: Mutex::new(Cell::new(CaptureCells {
                edges_pending: 0,
                edge_interrupts: 0,
                overflow_interrupts: 0,
                current_slot: 0,
                ticks: [0; 2],
                overflows: [0; 2],
            })),
            edges_per_capture,
        }
    }

    /// Edges between counter captures.
    pub fn edges_per_capture(&self) -> u16 {
        self.edges_per_capture
    }

    /// Record one falling edge. Called from the edge interrupt with the
    /// live value of the free-running counter.
    pub fn on_edge(&self, counter: u16) {
        critical_section::with(|cs| {
            let cell = self.cells.borrow(cs);
            let mut cells = cell.get();
            cells.edge_interrupts = cells.edge_interrupts.wrapping_add(1);
            cells.edges_pending += 1;
            if cells.edges_pending == self.edges_per_capture {
                let slot = (cells.current_slot + 1) & 0x01;
                cells.ticks[slot as usize] = counter;
                cells.overflows[slot as usize] = cells.overflow_interrupts;
                cells.current_slot = slot;
                cells.edges_pending = 0;
            }
            cell.set(cells);
        });
    }

    /// Record one counter overflow. Called from the overflow interrupt.
    pub fn on_overflow(&self) {
        critical_section::with(|cs| {
            let cell = self.cells.borrow(cs);
            let mut cells = cell.get();
            cells.overflow_interrupts = cells.overflow_interrupts.wrapping_add(1);
            cell.set(cells);
        });
    }

    /// Momentary copy of the capture slots and interrupt counters.
    pub fn snapshot(&self) -> CaptureSnapshot {
        let cells = critical_section::with(|cs| self.cells.borrow(cs).get());
        let this = cells.current_slot as usize;
        let last = this ^ 1;
        CaptureSnapshot {
            this_ticks: cells.ticks[this],
            last_ticks: cells.ticks[last],
            this_overflows: cells.overflows[this],
            last_overflows: cells.overflows[last],
            edge_interrupts: cells.edge_interrupts,
            overflow_interrupts: cells.overflow_interrupts,
        }
    }
}
