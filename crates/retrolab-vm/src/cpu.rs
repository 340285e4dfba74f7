//! Fetch/decode/execute core: the one `step()` contract everything
//! else in this crate drives.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::decode::{self, ParamKind, Parameter};
use crate::devices::Devices;
use crate::error::{CpuFault, StepOutcome};
use crate::interrupts::InterruptController;
use crate::memory::Memory;
use crate::mmap::{
    CPU_RANDOM, CPU_VERSION_MAJOR, CPU_VERSION_MINOR, INT_CPU, INT_JOYSTICK, INT_KEYBOARD,
    JOYSTICK_STATE, STACK_BOTTOM, XT_CPU_DIVZERO, XT_CPU_IRET,
};
use crate::registers::{Reg, Registers};
use crate::timers::Timers;

const DEBUGGER_REQUESTED_OPCODE: u8 = 0x01;

/// Number of parameters (0, 1 or 2) each opcode decodes, indexed by
/// opcode byte.
#[rustfmt::skip]
const N_PARAMETERS: [u8; 256] = {
    let mut t = [0u8; 256];
    // 0x0_: special / mov
    t[0x00] = 0; t[0x01] = 0; t[0x02] = 2;
    // 0x1_: logic
    t[0x10] = 2; t[0x11] = 2; t[0x12] = 2; t[0x13] = 2; t[0x14] = 2; t[0x15] = 1;
    // 0x2_: arithmetic (0x28 left unused/generous like the source table)
    t[0x20] = 2; t[0x21] = 2; t[0x22] = 2; t[0x23] = 2; t[0x24] = 2; t[0x25] = 2;
    t[0x26] = 2; t[0x27] = 2; t[0x28] = 2; t[0x29] = 2; t[0x2A] = 1; t[0x2B] = 1;
    // 0x3_: skip/compare
    t[0x30] = 2; t[0x31] = 2; t[0x32] = 2; t[0x33] = 2; t[0x34] = 2; t[0x35] = 2;
    t[0x36] = 2; t[0x37] = 2; t[0x38] = 2; t[0x39] = 2; t[0x3A] = 2; t[0x3B] = 2;
    t[0x3C] = 2; t[0x3D] = 2; t[0x3E] = 2;
    // 0x5_: stack
    t[0x50] = 1; t[0x51] = 1; t[0x52] = 1; t[0x53] = 1; t[0x56] = 1;
    // 0x6_: jumps
    t[0x60] = 1; t[0x61] = 1; t[0x63] = 1;
    // 0x7_: i/o
    t[0x70] = 2; t[0x71] = 2; t[0x72] = 2; t[0x75] = 1;
    t
};

/// Construction-time CPU parameters, generalizing the original's
/// process-wide globals (`static reg_t reg[16]`, a hardcoded stack
/// bottom) into per-instance configuration, in the same spirit as the
/// teacher's `emu-core::MasterClock`.
#[derive(Debug, Clone, Copy)]
pub struct CpuConfig {
    pub initial_sp: u16,
    pub version_major: u8,
    pub version_minor: u8,
}

impl CpuConfig {
    #[must_use]
    pub const fn new(initial_sp: u16, version_major: u8, version_minor: u8) -> Self {
        Self {
            initial_sp,
            version_major,
            version_minor,
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self::new(STACK_BOTTOM, 1, 1)
    }
}

pub struct Cpu {
    pub memory: Memory,
    pub registers: Registers,
    pub interrupts: InterruptController,
    pub timers: Timers,
    pub devices: Devices,
    config: CpuConfig,
    rng: StdRng,
    break_next: bool,
    skip_next: bool,
    pending_temp_breakpoint: Option<u16>,
}

impl Cpu {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    #[must_use]
    pub fn with_config(config: CpuConfig) -> Self {
        let mut cpu = Self {
            memory: Memory::new(),
            registers: Registers::new(),
            interrupts: InterruptController::new(),
            timers: Timers::new(),
            devices: Devices::new(),
            config,
            rng: StdRng::from_os_rng(),
            break_next: false,
            skip_next: false,
            pending_temp_breakpoint: None,
        };
        cpu.init_registers();
        cpu
    }

    fn init_registers(&mut self) {
        self.registers.reset();
        self.registers.set_sp(self.config.initial_sp);
        self.memory.write8(CPU_VERSION_MAJOR, self.config.version_major);
        self.memory.write8(CPU_VERSION_MINOR, self.config.version_minor);
    }

    /// Resets registers, interrupts, SP, CPU version and the four
    /// timer words without touching the rest of RAM (the loaded ROM
    /// survives).
    pub fn soft_reset(&mut self) {
        self.interrupts.reset();
        self.timers.reset(&mut self.memory);
        self.break_next = false;
        self.skip_next = false;
        self.pending_temp_breakpoint = None;
        self.init_registers();
    }

    /// A soft reset plus clearing all of RAM and writing a one-byte
    /// `jmp` opcode at address 0, matching `emulator_init`'s
    /// `ram[0x0] = 0x60` boot stub (no operand bytes are written
    /// either, same as the original).
    pub fn hard_reset(&mut self) {
        self.memory.reset();
        self.memory.write8(0, 0x60);
        self.devices.reset();
        self.soft_reset();
    }

    pub fn load_rom(&mut self, bytes: &[u8]) {
        self.memory.load(bytes);
    }

    pub fn request_break_next(&mut self) {
        self.break_next = true;
    }

    /// Installs an external hardware callback at `DEV` opcode slot
    /// `index`, per the `hw_fptr` callback table.
    pub fn bind_device(&mut self, index: u8, handler: crate::devices::DeviceHandler) {
        self.devices.set_handler(index, handler);
    }

    /// Writes the joystick state register and raises `INT_JOYSTICK`
    /// with the new state as the XT sub-code, matching `set_joystick`.
    pub fn set_joystick_state(&mut self, state: u16) {
        self.memory.write16(JOYSTICK_STATE, state);
        self.interrupts.enqueue(INT_JOYSTICK, state);
    }

    /// Raises `INT_KEYBOARD` with `code` (an ASCII byte or one of the
    /// `KEY_*` special-key codes) as the XT sub-code, matching
    /// `send_keypress`. No physical key state is latched anywhere;
    /// this is the interrupt contract only.
    pub fn send_keypress(&mut self, code: u16) {
        self.interrupts.enqueue(INT_KEYBOARD, code);
    }

    /// Returns and clears the PC of a one-shot breakpoint requested by
    /// `DBG`-adjacent tooling, for the emulator loop to install.
    pub fn take_pending_temp_breakpoint(&mut self) -> Option<u16> {
        self.pending_temp_breakpoint.take()
    }

    #[must_use]
    pub fn waiting_for_interrupt(&self) -> bool {
        self.interrupts.waiting()
    }

    /// Advances once per frame-counter tick (see `retrolab-emu`'s
    /// frame driver), decrementing the four timer counters.
    pub fn tick_timers(&mut self) {
        self.timers.tick(&mut self.memory, &mut self.interrupts);
    }

    pub fn step(&mut self) -> Result<StepOutcome, CpuFault> {
        let r: u16 = self.rng.random();
        self.memory.write8(CPU_RANDOM, (r & 0xFF) as u8);
        self.memory.write8(CPU_RANDOM.wrapping_add(1), (r >> 8) as u8);

        if self.interrupts.waiting() {
            return Ok(StepOutcome::Ok);
        }

        if let Some(interrupt) = self.interrupts.take_ready() {
            self.registers.set(Reg::Xt, interrupt.xt_value);
            let pc = self.registers.pc();
            let target = self.interrupts.enter(interrupt.number, pc);
            self.registers.set_pc(target);
            return Ok(StepOutcome::Ok);
        }

        let pc = self.registers.pc();
        let opcode = self.memory.read8(pc);
        self.registers.set_pc(pc.wrapping_add(1));

        if opcode == 0x63 {
            let pc = self.registers.pc();
            let target = self.memory.read16(pc);
            self.registers.set_pc(pc.wrapping_add(2));
            if self.skip_next {
                self.skip_next = false;
            } else {
                self.registers.set_pc(target);
            }
            return Ok(StepOutcome::Ok);
        }

        let n_params = N_PARAMETERS[opcode as usize];
        let par1 = if n_params >= 1 {
            Some(self.fetch_parameter())
        } else {
            None
        };
        let par2 = if n_params >= 2 {
            Some(self.fetch_parameter())
        } else {
            None
        };

        if self.break_next {
            self.pending_temp_breakpoint = Some(self.registers.pc());
            self.break_next = false;
        }

        if self.skip_next {
            self.skip_next = false;
            return Ok(StepOutcome::Ok);
        }

        self.execute(opcode, par1, par2)
    }

    fn fetch_parameter(&mut self) -> Parameter {
        let pc = self.registers.pc();
        let (parameter, next_pc) = decode::fetch(&self.memory, &self.registers, pc);
        self.registers.set_pc(next_pc);
        parameter
    }

    fn push_byte_bypass(&mut self, value: u8) {
        let sp = self.registers.sp();
        self.memory.write8_bypass(sp, value);
        self.registers.set_sp(sp.wrapping_sub(1));
    }

    fn push_word_bypass(&mut self, value: u16) {
        self.push_byte_bypass((value >> 8) as u8);
        self.push_byte_bypass((value & 0xFF) as u8);
    }

    fn pop_byte(&mut self) -> u8 {
        let sp = self.registers.sp().wrapping_add(1);
        self.registers.set_sp(sp);
        self.memory.read8(sp)
    }

    fn pop_word(&mut self) -> u16 {
        let sp = self.registers.sp().wrapping_add(2);
        self.registers.set_sp(sp);
        let low = self.memory.read8(sp.wrapping_sub(1));
        let high = self.memory.read8(sp);
        u16::from(low) | (u16::from(high) << 8)
    }

    #[allow(clippy::too_many_lines)]
    fn execute(
        &mut self,
        op: u8,
        par1: Option<Parameter>,
        par2: Option<Parameter>,
    ) -> Result<StepOutcome, CpuFault> {
        let write1 = |cpu: &mut Self, v: u16| {
            if let Some(p) = par1 {
                p.write(&mut cpu.memory, &mut cpu.registers, v);
            }
        };
        let write1_ov = |cpu: &mut Self, v: u32| {
            if let Some(p) = par1 {
                p.write_with_overflow(&mut cpu.memory, &mut cpu.registers, v);
            }
        };

        match op {
            0x00 => {} // NOP
            DEBUGGER_REQUESTED_OPCODE => return Ok(StepOutcome::DebuggerRequested),
            0x02 => write1(self, par2.unwrap().value), // MOV

            0x10 => write1(self, par1.unwrap().value | par2.unwrap().value), // OR
            0x11 => write1(self, par1.unwrap().value & par2.unwrap().value), // AND
            0x12 => write1(self, par1.unwrap().value ^ par2.unwrap().value), // XOR
            0x13 => {
                // SHL
                let v = u32::from(par1.unwrap().value).wrapping_shl(u32::from(par2.unwrap().value));
                write1_ov(self, v);
            }
            0x14 => {
                // SHR
                let shift = par2.unwrap().value;
                let v = if shift >= 16 { 0 } else { par1.unwrap().value >> shift };
                write1(self, v);
            }
            0x15 => write1(self, !par1.unwrap().value),                       // NOT

            0x20 => {
                // ADD
                let v = u32::from(par1.unwrap().value) + u32::from(par2.unwrap().value);
                write1_ov(self, v);
            }
            0x22 => {
                // SUB
                let v = u32::from(par1.unwrap().value).wrapping_sub(u32::from(par2.unwrap().value));
                write1_ov(self, v);
            }
            0x24 => {
                // MUL
                let v = u32::from(par1.unwrap().value) * u32::from(par2.unwrap().value);
                write1_ov(self, v);
            }
            0x26 => {
                // DIV
                let divisor = par2.unwrap().value;
                if divisor == 0 {
                    self.interrupts.enqueue(INT_CPU, XT_CPU_DIVZERO);
                } else {
                    write1(self, par1.unwrap().value / divisor);
                }
            }
            0x27 => {
                // DIV$ (signed)
                let divisor = par2.unwrap().value;
                if divisor == 0 {
                    self.interrupts.enqueue(INT_CPU, XT_CPU_DIVZERO);
                } else {
                    let result = i32::from(par1.unwrap().value) / i32::from(divisor as i16);
                    write1(self, result as u16);
                }
            }
            0x29 => {
                // MOD
                let divisor = par2.unwrap().value;
                if divisor == 0 {
                    self.interrupts.enqueue(INT_CPU, XT_CPU_DIVZERO);
                } else {
                    write1(self, par1.unwrap().value % divisor);
                }
            }
            0x2A => {
                // INC
                let v = u32::from(par1.unwrap().value) + 1;
                write1_ov(self, v);
            }
            0x2B => {
                // DEC
                let v = u32::from(par1.unwrap().value).wrapping_sub(1);
                write1_ov(self, v);
            }

            0x30 => self.skip_unless(par1.unwrap().value != par2.unwrap().value), // IFNE
            0x31 => self.skip_unless(par1.unwrap().value == par2.unwrap().value), // IFEQ
            0x32 => self.skip_unless(par1.unwrap().value > par2.unwrap().value),  // IFGT
            0x33 => self.skip_unless((par1.unwrap().value as i16) > (par2.unwrap().value as i16)), // IFGT$
            0x35 => self.skip_unless(par1.unwrap().value < par2.unwrap().value), // IFLT
            0x36 => self.skip_unless((par1.unwrap().value as i16) < (par2.unwrap().value as i16)), // IFLT$
            0x38 => self.skip_unless(par1.unwrap().value >= par2.unwrap().value), // IFGE
            0x39 => self.skip_unless((par1.unwrap().value as i16) >= (par2.unwrap().value as i16)), // IFGE$
            0x3C => self.skip_unless(par1.unwrap().value <= par2.unwrap().value), // IFLE
            0x3D => self.skip_unless((par1.unwrap().value as i16) <= (par2.unwrap().value as i16)), // IFLE$

            0x50 => self.push_byte_bypass(par1.unwrap().value as u8), // PUSHB
            0x51 => self.push_word_bypass(par1.unwrap().value),      // PUSHW
            0x52 => {
                let v = self.pop_byte();
                write1(self, u16::from(v));
            } // POPB
            0x53 => {
                let v = self.pop_word();
                write1(self, v);
            } // POPW
            0x54 => {
                // PUSHA
                for reg in [
                    Reg::A, Reg::B, Reg::C, Reg::D, Reg::E, Reg::F, Reg::I, Reg::J, Reg::K,
                    Reg::X, Reg::Y, Reg::Fp, Reg::Ov,
                ] {
                    let v = self.registers.get(reg);
                    self.push_word_bypass(v);
                }
            }
            0x55 => {
                // POPA
                for reg in [
                    Reg::Ov, Reg::Fp, Reg::Y, Reg::X, Reg::K, Reg::J, Reg::I, Reg::F, Reg::E,
                    Reg::D, Reg::C, Reg::B, Reg::A,
                ] {
                    let v = self.pop_word();
                    self.registers.set(reg, v);
                }
            }
            0x56 => {
                // POPN
                let n = par1.unwrap().value;
                let sp = self.registers.sp().wrapping_add(n);
                self.registers.set_sp(sp);
            }

            0x60 => self.registers.set_pc(par1.unwrap().value), // JMP
            0x61 => {
                // JSR
                let pc = self.registers.pc();
                self.push_word_bypass(pc);
                self.registers.set_pc(par1.unwrap().value);
            }
            0x62 => {
                // RET
                let target = self.pop_word();
                self.registers.set_pc(target);
            }

            0x70 => {
                // DEV
                let dev = par1.unwrap().value & 0xFF;
                let data = par2.unwrap().value;
                self.devices
                    .dispatch(dev as u8, data, &mut self.memory, &self.registers);
            }
            0x71 => {
                // IVEC
                let n = par1.unwrap().value & 0xFF;
                let addr = par2.unwrap().value;
                self.interrupts.set_vector(n as u8, addr);
            }
            0x72 => {
                // INT
                let n = par1.unwrap().value & 0xFF;
                let xt = par2.unwrap().value;
                self.interrupts.enqueue(n as u8, xt);
            }
            0x73 => {
                // IRET
                if self.interrupts.happening() {
                    if let Some(pc) = self.interrupts.leave() {
                        self.registers.set_pc(pc);
                    }
                } else {
                    self.interrupts.enqueue(INT_CPU, XT_CPU_IRET);
                }
            }
            0x74 => self.interrupts.set_waiting(), // WAIT
            0x75 => {
                // IENAB
                let v = par1.unwrap().value;
                self.interrupts.set_active(v & 1 != 0);
            }

            other => {
                return Err(CpuFault::InvalidOpcode {
                    opcode: other,
                    pc: self.registers.pc(),
                })
            }
        }

        Ok(StepOutcome::Ok)
    }

    fn skip_unless(&mut self, condition_true: bool) {
        if !condition_true {
            self.skip_next = true;
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

const CPU_QUERY_PATHS: &[&str] = &[
    "registers.a", "registers.b", "registers.c", "registers.d", "registers.e", "registers.f",
    "registers.i", "registers.j", "registers.k", "registers.x", "registers.y", "registers.xt",
    "registers.sp", "registers.fp", "registers.pc", "registers.ov",
    "interrupts.active", "interrupts.happening", "interrupts.waiting",
    "interrupts.return_address", "interrupts.queue_len",
    "timers.frame0", "timers.frame1", "timers.frame2", "timers.frame3",
    "skip_next", "break_next", "memory.last_write", "memory.stack",
];

impl crate::observable::Observable for Cpu {
    fn query(&self, path: &str) -> Option<crate::observable::Value> {
        use crate::observable::Observable as _;

        if let Some(rest) = path.strip_prefix("registers.") {
            return self.registers.query(rest);
        }
        if let Some(rest) = path.strip_prefix("interrupts.") {
            return self.interrupts.query(rest);
        }
        match path {
            "timers.frame0" => Some(self.memory.read16(crate::mmap::TIMER_FRAME_0).into()),
            "timers.frame1" => Some(self.memory.read16(crate::mmap::TIMER_FRAME_1).into()),
            "timers.frame2" => Some(self.memory.read16(crate::mmap::TIMER_FRAME_2).into()),
            "timers.frame3" => Some(self.memory.read16(crate::mmap::TIMER_FRAME_3).into()),
            "skip_next" => Some(self.skip_next.into()),
            "break_next" => Some(self.break_next.into()),
            "memory.last_write" => self.memory.last_written().map(Into::into),
            "memory.stack" => Some(self.memory.stack_dump(self.registers.sp()).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        CPU_QUERY_PATHS
    }
}
