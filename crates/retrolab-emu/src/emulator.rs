//! Step/frame driver: ties the CPU core to breakpoints and the
//! per-frame timer/video tick.

use retrolab_asm::debuginfo::DebugTable;
use retrolab_vm::cpu::Cpu;
use retrolab_vm::error::{CpuFault, StepOutcome};

use crate::breakpoints::Breakpoints;

/// 4 MHz (3.88 MHz) worth of steps before a frame boundary.
pub const STEPS_PER_FRAME: u32 = 64_800;

/// Construction-time emulator parameters, generalizing the original's
/// hardcoded frame length into per-instance configuration, in the same
/// spirit as the teacher's `emu-core::MasterClock`.
#[derive(Debug, Clone, Copy)]
pub struct EmulatorConfig {
    pub steps_per_frame: u32,
}

impl EmulatorConfig {
    #[must_use]
    pub const fn new(steps_per_frame: u32) -> Self {
        Self { steps_per_frame }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::new(STEPS_PER_FRAME)
    }
}

pub struct Emulator {
    pub cpu: Cpu,
    pub breakpoints: Breakpoints,
    debug: DebugTable,
    steps_per_frame: u32,
    steps_left: u32,
    end_of_frame: bool,
    break_at_eof: bool,
    suspended: bool,
    on_breakpoint: Option<Box<dyn FnMut()>>,
}

impl Emulator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            breakpoints: Breakpoints::new(),
            debug: DebugTable::new(),
            steps_per_frame: config.steps_per_frame,
            steps_left: config.steps_per_frame,
            end_of_frame: false,
            break_at_eof: false,
            suspended: false,
            on_breakpoint: None,
        }
    }

    pub fn load_rom(&mut self, bytes: &[u8]) {
        self.cpu.load_rom(bytes);
    }

    pub fn load_debug_info(&mut self, debug: DebugTable) {
        self.debug = debug;
    }

    #[must_use]
    pub fn debug_info(&self) -> &DebugTable {
        &self.debug
    }

    pub fn set_breakpoint_listener(&mut self, listener: Box<dyn FnMut()>) {
        self.on_breakpoint = Some(listener);
    }

    pub fn set_break_at_eof(&mut self) {
        self.break_at_eof = true;
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    #[must_use]
    pub fn end_of_frame(&self) -> bool {
        self.end_of_frame
    }

    fn reinit(&mut self) {
        self.suspended = false;
        self.steps_left = self.steps_per_frame;
        self.end_of_frame = false;
        self.break_at_eof = false;
        self.breakpoints.clear();
    }

    pub fn hard_reset(&mut self) {
        self.cpu.hard_reset();
        self.reinit();
    }

    pub fn soft_reset(&mut self) {
        self.cpu.soft_reset();
        self.reinit();
    }

    fn fire_breakpoint_hook(&mut self) {
        if let Some(mut hook) = self.on_breakpoint.take() {
            hook();
            self.on_breakpoint = Some(hook);
        }
    }

    /// Runs one CPU step, then the frame/breakpoint bookkeeping the
    /// outer loop relies on.
    pub fn step(&mut self) -> Result<StepOutcome, CpuFault> {
        self.end_of_frame = false;
        let outcome = self.cpu.step()?;

        self.steps_left -= 1;
        if self.steps_left == 0 {
            self.cpu.tick_timers();
            self.steps_left = self.steps_per_frame;
            self.end_of_frame = true;

            if self.break_at_eof {
                self.fire_breakpoint_hook();
                self.break_at_eof = false;
                return Ok(outcome);
            }
        }

        if let Some(pc) = self.cpu.take_pending_temp_breakpoint() {
            self.breakpoints.set_temp(pc);
        }

        if self.breakpoints.is_addr(self.cpu.registers.pc()) {
            self.fire_breakpoint_hook();
            self.end_of_frame = true;
        }

        Ok(outcome)
    }

    /// Runs `step()` until a frame boundary, a `DBG` cooperative stop
    /// request, or a fault. `DBG` ends the frame early regardless of
    /// the step budget remaining, mirroring its role as a debugger
    /// breakpoint rather than an ordinary instruction.
    pub fn frame(&mut self) -> Result<StepOutcome, CpuFault> {
        loop {
            let outcome = self.step()?;
            if matches!(outcome, StepOutcome::DebuggerRequested) || self.end_of_frame {
                return Ok(outcome);
            }
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_config_shortens_the_frame_boundary() {
        let mut emu = Emulator::with_config(EmulatorConfig::new(2));
        emu.load_rom(&[0x00, 0x00, 0x00]); // three NOPs
        let outcome = emu.frame().unwrap();
        assert!(matches!(outcome, StepOutcome::Ok));
        assert!(emu.end_of_frame());
        assert_eq!(emu.cpu.registers.pc(), 2);
    }

    #[test]
    fn frame_runs_until_steps_per_frame_elapses() {
        let mut emu = Emulator::new();
        emu.load_rom(&[0x00]); // nop, PC wraps and keeps re-executing nop
        emu.frame().unwrap();
        assert!(emu.end_of_frame());
    }

    #[test]
    fn breakpoint_hit_invokes_listener() {
        use std::cell::Cell;
        use std::rc::Rc;

        let hit = Rc::new(Cell::new(false));
        let hit_clone = Rc::clone(&hit);

        let mut emu = Emulator::new();
        emu.load_rom(&[0x00, 0x00, 0x00]);
        emu.breakpoints.set_temp(1);
        emu.set_breakpoint_listener(Box::new(move || hit_clone.set(true)));
        emu.step().unwrap();
        assert!(hit.get());
    }
}
