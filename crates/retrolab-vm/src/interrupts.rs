//! Priority queue of pending interrupts plus the one-shot handler
//! dispatch state.

use std::collections::VecDeque;

pub const NO_INTERRUPT: u16 = 0xFF;
const QUEUE_CAPACITY: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedInterrupt {
    pub number: u8,
    pub xt_value: u16,
}

pub struct InterruptController {
    vector: [u16; 256],
    queue: VecDeque<QueuedInterrupt>,
    active: bool,
    happening: bool,
    waiting: bool,
    ret_addr: u16,
}

impl InterruptController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vector: [NO_INTERRUPT; 256],
            queue: VecDeque::new(),
            active: true,
            happening: false,
            waiting: false,
            ret_addr: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn set_vector(&mut self, number: u8, handler_pc: u16) {
        self.vector[number as usize] = handler_pc;
    }

    #[must_use]
    pub fn vector(&self, number: u8) -> u16 {
        self.vector[number as usize]
    }

    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn happening(&self) -> bool {
        self.happening
    }

    #[must_use]
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    pub fn set_waiting(&mut self) {
        self.waiting = true;
    }

    #[must_use]
    pub fn return_address(&self) -> u16 {
        self.ret_addr
    }

    #[must_use]
    pub fn queued(&self) -> &VecDeque<QueuedInterrupt> {
        &self.queue
    }

    /// Enqueues an interrupt. Silently dropped when disabled, the
    /// vector is unbound, or the queue is full.
    pub fn enqueue(&mut self, number: u8, xt_value: u16) {
        if !self.active || self.vector[number as usize] == NO_INTERRUPT || self.queue.len() >= QUEUE_CAPACITY {
            return;
        }
        self.queue.push_back(QueuedInterrupt { number, xt_value });
        self.waiting = false;
    }

    /// Pops the next interrupt if one is pending and no handler is
    /// currently running.
    pub fn take_ready(&mut self) -> Option<QueuedInterrupt> {
        if !self.active || self.happening {
            return None;
        }
        self.queue.pop_front()
    }

    /// Transitions into a handler: saves `current_pc` as the return
    /// address and returns the vector's target PC.
    pub fn enter(&mut self, number: u8, current_pc: u16) -> u16 {
        self.happening = true;
        self.ret_addr = current_pc;
        self.vector[number as usize]
    }

    /// Restores the saved return PC, or does nothing if no handler is
    /// running — callers should raise `INT_CPU`/`XT_CPU_IRET` in that
    /// case.
    pub fn leave(&mut self) -> Option<u16> {
        if !self.happening {
            return None;
        }
        self.happening = false;
        Some(self.ret_addr)
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

const INTERRUPT_QUERY_PATHS: &[&str] =
    &["active", "happening", "waiting", "return_address", "queue_len"];

impl crate::observable::Observable for InterruptController {
    fn query(&self, path: &str) -> Option<crate::observable::Value> {
        match path {
            "active" => Some(self.active.into()),
            "happening" => Some(self.happening.into()),
            "waiting" => Some(self.waiting.into()),
            "return_address" => Some(self.ret_addr.into()),
            "queue_len" => Some((self.queue.len() as u16).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        INTERRUPT_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_vector_drops_enqueue() {
        let mut ic = InterruptController::new();
        ic.enqueue(0x18, 0x1234);
        assert!(ic.queued().is_empty());
    }

    #[test]
    fn bound_vector_queues_fifo() {
        let mut ic = InterruptController::new();
        ic.set_vector(1, 0x100);
        ic.set_vector(2, 0x200);
        ic.enqueue(1, 1);
        ic.enqueue(2, 2);
        assert_eq!(ic.take_ready().unwrap().number, 1);
        assert_eq!(ic.take_ready().unwrap().number, 2);
    }

    #[test]
    fn enqueue_clears_waiting() {
        let mut ic = InterruptController::new();
        ic.set_vector(1, 0x100);
        ic.set_waiting();
        assert!(ic.waiting());
        ic.enqueue(1, 0);
        assert!(!ic.waiting());
    }

    #[test]
    fn no_dispatch_while_handler_running() {
        let mut ic = InterruptController::new();
        ic.set_vector(1, 0x100);
        ic.enqueue(1, 0);
        ic.enter(1, 0x10);
        assert!(ic.take_ready().is_none());
    }

    #[test]
    fn disabled_controller_drops_enqueue() {
        let mut ic = InterruptController::new();
        ic.set_vector(1, 0x100);
        ic.set_active(false);
        ic.enqueue(1, 0);
        assert!(ic.queued().is_empty());
    }

    #[test]
    fn disabling_after_enqueue_holds_the_pending_entry() {
        let mut ic = InterruptController::new();
        ic.set_vector(1, 0x100);
        ic.enqueue(1, 0);
        ic.set_active(false);
        assert!(ic.take_ready().is_none());
        assert_eq!(ic.queued().len(), 1);

        ic.set_active(true);
        assert_eq!(ic.take_ready().unwrap().number, 1);
    }
}
