//! Glue between [`retrolab_vm`] and [`retrolab_asm`]: the step/frame
//! driver, breakpoints and debug-info wiring a CLI or test harness
//! runs a compiled ROM through.

pub mod breakpoints;
pub mod emulator;

pub use breakpoints::Breakpoints;
pub use emulator::{Emulator, EmulatorConfig, STEPS_PER_FRAME};
