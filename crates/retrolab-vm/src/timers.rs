//! The four frame-decrement timer counters.
//!
//! Unlike the interrupt controller or register file, timers have no
//! state of their own: each counter lives as a 16-bit little-endian
//! word at its `TIMER_FRAME_n` memory address, readable and writable
//! by a running program exactly like any other memory cell.

use crate::interrupts::InterruptController;
use crate::memory::Memory;
use crate::mmap::{INT_TIMER, TIMER_FRAME_0, TIMER_FRAME_1, TIMER_FRAME_2, TIMER_FRAME_3};

const ADDRS: [u16; 4] = [TIMER_FRAME_0, TIMER_FRAME_1, TIMER_FRAME_2, TIMER_FRAME_3];

pub struct Timers;

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Zeroes all four counters. Called on both soft and hard reset —
    /// the timer words are reinitialised even when the rest of RAM
    /// (and the loaded ROM) survives a soft reset.
    pub fn reset(&mut self, memory: &mut Memory) {
        for addr in ADDRS {
            memory.write16(addr, 0);
        }
    }

    /// Decrements every counter by one frame, raising `INT_TIMER` with
    /// sub-code `i` for each that reaches zero.
    pub fn tick(&mut self, memory: &mut Memory, interrupts: &mut InterruptController) {
        for (i, addr) in ADDRS.iter().enumerate() {
            let value = memory.read16(*addr).wrapping_sub(1);
            memory.write16(*addr, value);
            if value == 0 {
                interrupts.enqueue(INT_TIMER, i as u16);
            }
        }
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaching_zero_raises_timer_interrupt() {
        let mut mem = Memory::new();
        let mut timers = Timers::new();
        let mut ic = InterruptController::new();
        ic.set_vector(INT_TIMER, 0x100);
        mem.write16(TIMER_FRAME_2, 1);
        timers.tick(&mut mem, &mut ic);
        let q = ic.take_ready().unwrap();
        assert_eq!(q.number, INT_TIMER);
        assert_eq!(q.xt_value, 2);
        assert_eq!(mem.read16(TIMER_FRAME_2), 0);
    }

    #[test]
    fn nonzero_counters_do_not_fire() {
        let mut mem = Memory::new();
        let mut timers = Timers::new();
        let mut ic = InterruptController::new();
        ic.set_vector(INT_TIMER, 0x100);
        mem.write16(TIMER_FRAME_0, 5);
        timers.tick(&mut mem, &mut ic);
        assert!(ic.queued().is_empty());
        assert_eq!(mem.read16(TIMER_FRAME_0), 4);
    }

    #[test]
    fn decrementing_from_zero_wraps_and_does_not_fire_again_until_it_returns_to_zero() {
        let mut mem = Memory::new();
        let mut timers = Timers::new();
        let mut ic = InterruptController::new();
        ic.set_vector(INT_TIMER, 0x100);
        mem.write16(TIMER_FRAME_0, 0);
        timers.tick(&mut mem, &mut ic);
        assert_eq!(mem.read16(TIMER_FRAME_0), 0xFFFF);
        assert!(ic.queued().is_empty());
    }
}
