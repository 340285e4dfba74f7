//! Step-level fault reporting.

use std::fmt;

/// The outcome of a single [`crate::cpu::Cpu::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    DebuggerRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuFault {
    InvalidOpcode { opcode: u8, pc: u16 },
}

impl fmt::Display for CpuFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuFault::InvalidOpcode { opcode, pc } => {
                write!(f, "invalid CPU operation {opcode:#04X} at PC {pc:#06X}")
            }
        }
    }
}

impl std::error::Error for CpuFault {}
