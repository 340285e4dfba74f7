//! Two-pass assembler for the retrolab fantasy CPU.
//!
//! [`assemble`] takes a set of named source files, preprocesses them
//! into a single tagged stream (see [`preprocess`]), and drives a
//! [`context::CompilationContext`] through its sizing and emission
//! passes to produce an [`Output`].

pub mod ast;
pub mod bytes;
pub mod context;
pub mod debuginfo;
pub mod encode;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod opcodes;
pub mod parser;
pub mod preprocess;
pub mod symtab;

pub use ast::{BinOp, DataItem, Expr, Operand, Reg, Statement};
pub use bytes::ByteArray;
pub use context::CompilationContext;
pub use debuginfo::{DebugRecord, DebugTable};
pub use error::{CompileError, EvalError};
pub use symtab::SymbolTable;

/// Result of assembling a set of source files: either a binary plus
/// its debug table, or the first compilation error encountered.
#[derive(Debug, Clone)]
pub struct Output {
    pub binary: Vec<u8>,
    pub debug: DebugTable,
    pub error: Option<CompileError>,
}

impl Output {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Assembles `files` (each a `(filename, contents)` pair) into a flat
/// binary. File ordering and skip rules are documented on
/// [`preprocess::preprocess`].
#[must_use]
pub fn assemble(files: &[(String, String)]) -> Output {
    let source = preprocess::preprocess(files);
    let ctx = CompilationContext::new();
    let (binary, debug, error) = ctx.compile(&source);
    Output { binary, debug, error }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(text: &str) -> Vec<(String, String)> {
        vec![("main.s".to_string(), text.to_string())]
    }

    #[test]
    fn assembles_nop() {
        let out = assemble(&src("nop"));
        assert!(out.is_ok());
        assert_eq!(out.binary, vec![0x00]);
    }

    #[test]
    fn assembles_pushb_variants() {
        assert_eq!(assemble(&src("pushb 32")).binary, vec![0x50, 0x20]);
        assert_eq!(assemble(&src("pushb -2")).binary, vec![0x50, 0x7E]);
        assert_eq!(assemble(&src("pushb 128")).binary, vec![0x50, 0x8A, 0x80]);
        assert_eq!(
            assemble(&src("pushb 0x1234")).binary,
            vec![0x50, 0x8B, 0x34, 0x12]
        );
        assert_eq!(
            assemble(&src("pushb [B + 12]")).binary,
            vec![0x50, 0xC1, 0x0C]
        );
    }

    #[test]
    fn assembles_mov_immediate() {
        assert_eq!(assemble(&src("mov A, 0x12")).binary, vec![0x02, 0x90, 0x12]);
    }

    #[test]
    fn special_jmp_peephole() {
        assert_eq!(assemble(&src("jmp 0x1234")).binary, vec![0x63, 0x34, 0x12]);
    }

    #[test]
    fn db_with_escaped_quote_string() {
        let out = assemble(&src(r#"db "AB\"CD""#));
        assert_eq!(out.binary, vec![0x41, 0x42, 0x22, 0x43, 0x44]);
    }

    #[test]
    fn forward_reference_forces_word_form_even_though_value_is_small() {
        // `label` resolves to 5, which alone would fit the 1-byte
        // literal mode, but the pass-1 forward reference forces the
        // 16-bit form so pass 2's layout matches pass 1's sizing.
        let out = assemble(&src("mov A, label\nlabel: nop"));
        assert!(out.is_ok());
        assert_eq!(out.binary, vec![0x02, 0x90, 0x8B, 0x05, 0x00, 0x00]);
    }

    #[test]
    fn value_too_high_is_a_compile_error() {
        let out = assemble(&src("pushb 0x123456"));
        assert!(!out.is_ok());
        assert!(out.error.unwrap().message.contains("too high"));
    }

    #[test]
    fn duplicate_symbol_is_a_compile_error() {
        let out = assemble(&src("xx = 3\nxx = 4"));
        assert!(!out.is_ok());
    }

    #[test]
    fn define_starting_with_dot_is_an_error() {
        let out = assemble(&src(".abc = 3"));
        assert!(!out.is_ok());
    }

    #[test]
    fn local_labels_scope_to_enclosing_global_label() {
        let out = assemble(&src("loop: nop\n.again: nop\njmp .again"));
        assert!(out.is_ok());
    }
}
