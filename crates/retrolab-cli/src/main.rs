//! Thin command-line shell around `retrolab-asm` and `retrolab-emu`.
//!
//! Deliberately minimal (`std::env::args`, no argument-parsing crate):
//! spec.md places the CLI out of scope as an external collaborator,
//! and the teacher workspace's own `*-runner`/`*-test-runner` binaries
//! follow the same plain-args style.

use std::fs;
use std::process::ExitCode;

use retrolab_asm::Output;
use retrolab_emu::emulator::Emulator;
use retrolab_vm::error::{CpuFault, StepOutcome};
use retrolab_vm::observable::Observable;

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct Args {
    rom: Option<String>,
    compile_file: Option<String>,
    source_file: Option<String>,
    source_dir: Option<String>,
    debug: bool,
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut args = Args {
        rom: None,
        compile_file: None,
        source_file: None,
        source_dir: None,
        debug: false,
    };
    let mut it = argv.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-r" | "--rom" => args.rom = Some(take_value(&mut it, arg)?),
            "-c" | "--compile-file" => args.compile_file = Some(take_value(&mut it, arg)?),
            "-s" | "--source-file" => args.source_file = Some(take_value(&mut it, arg)?),
            "-d" | "--source-dir" => args.source_dir = Some(take_value(&mut it, arg)?),
            "-D" | "--debug" => args.debug = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                println!("Retrolab emulator/compiler version {VERSION}");
                std::process::exit(0);
            }
            other => return Err(format!("unrecognised option '{other}'")),
        }
    }
    Ok(args)
}

fn take_value(it: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<String, String> {
    it.next()
        .cloned()
        .ok_or_else(|| format!("option '{flag}' requires a value"))
}

fn print_help() {
    println!("Usage: retrolab [OPTIONS]");
    println!("   -r, --rom <FILE>            Load and execute a ROM (binary) file");
    println!("   -c, --compile-file <FILE>   Compile a source file and output the ROM file to stdout");
    println!("   -s, --source-file <FILE>    Compile a source file and execute on the emulator");
    println!("   -d, --source-dir <DIR>      Compile a project directory and execute on the emulator");
    println!("   -D, --debug                 Show debugging information for each CPU step");
    println!("   -h, --help                  Show this help");
    println!("   -v, --version                Show version and exit");
}

/// Reads every regular file directly inside `dir`, keyed by basename
/// (not the directory-prefixed path) so `main.s`/`*.def` ordering in
/// `retrolab_asm::preprocess` resolves the way a single-directory
/// project expects.
fn read_source_dir(dir: &str) -> Result<Vec<(String, String)>, String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("could not open source directory '{dir}': {e}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("non-UTF-8 filename in '{dir}'"))?
            .to_string();
        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("could not read file '{}': {e}", path.display()))?;
        files.push((name, contents));
    }
    Ok(files)
}

/// Reads a single source file, presented to the assembler as
/// `main.s` regardless of its on-disk name — matching the original
/// compiler's `compile_file`, which always wraps a standalone source
/// string as the `main.s` entry of its input set.
fn read_source_file(path: &str) -> Result<Vec<(String, String)>, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("could not read file '{path}': {e}"))?;
    Ok(vec![("main.s".to_string(), contents)])
}

fn assemble_or_report(files: &[(String, String)]) -> Result<Output, String> {
    let output = retrolab_asm::assemble(files);
    if let Some(err) = &output.error {
        return Err(err.to_string());
    }
    Ok(output)
}

fn compile_to_stdout(path: &str) -> ExitCode {
    let files = match read_source_file(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match assemble_or_report(&files) {
        Ok(output) => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&output.binary)
                .expect("stdout write failed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_until_fault(emulator: &mut Emulator, debug: bool) -> ExitCode {
    loop {
        match emulator.frame() {
            Ok(StepOutcome::DebuggerRequested) => {
                if debug {
                    print_debug_line(emulator);
                }
                return ExitCode::SUCCESS;
            }
            Ok(StepOutcome::Ok) => {
                if debug {
                    print_debug_line(emulator);
                }
            }
            Err(CpuFault::InvalidOpcode { opcode, pc }) => {
                eprintln!("invalid CPU operation {opcode:#04X} at PC {pc:#06X}");
                return ExitCode::FAILURE;
            }
        }
        if emulator.is_suspended() {
            return ExitCode::SUCCESS;
        }
    }
}

fn print_debug_line(emulator: &Emulator) {
    let pc = emulator.cpu.registers.pc();
    let source = emulator
        .debug_info()
        .source_of(pc)
        .map_or_else(|| "?:?".to_string(), |(f, l)| format!("{f}:{l}"));
    let regs = ["a", "b", "c", "d", "x", "y", "sp"]
        .iter()
        .filter_map(|name| {
            let path = format!("registers.{name}");
            emulator.cpu.query(&path).map(|v| format!("{name}={v}"))
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("pc={pc:#06X} ({source}) {regs}");
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.compile_file {
        return compile_to_stdout(path);
    }

    let mut emulator = Emulator::new();

    if let Some(path) = &args.rom {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("could not read ROM '{path}': {e}");
                return ExitCode::FAILURE;
            }
        };
        emulator.load_rom(&bytes);
    } else if let Some(path) = &args.source_file {
        let files = match read_source_file(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        let output = match assemble_or_report(&files) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        emulator.load_rom(&output.binary);
        emulator.load_debug_info(output.debug);
    } else if let Some(dir) = &args.source_dir {
        let files = match read_source_dir(dir.as_str()) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        let output = match assemble_or_report(&files) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        emulator.load_rom(&output.binary);
        emulator.load_debug_info(output.debug);
    } else {
        print_help();
        return ExitCode::SUCCESS;
    }

    run_until_fault(&mut emulator, args.debug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rom_flag() {
        let args = parse_args(&["--rom".to_string(), "game.bin".to_string()]).unwrap();
        assert_eq!(args.rom.as_deref(), Some("game.bin"));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse_args(&["--bogus".to_string()]).is_err());
    }

    #[test]
    fn short_flags_behave_like_long_ones() {
        let args = parse_args(&["-D".to_string(), "-s".to_string(), "x.s".to_string()]).unwrap();
        assert!(args.debug);
        assert_eq!(args.source_file.as_deref(), Some("x.s"));
    }
}
