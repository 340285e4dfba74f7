//! Compilation context (C7): drives the two-pass assembly loop —
//! symbol/PC bookkeeping on pass 1, binary emission and debug-record
//! capture on pass 2.

use crate::ast::{DataItem, Expr, Operand, Statement};
use crate::debuginfo::DebugTable;
use crate::encode::{self, Resolved};
use crate::error::{CompileError, EvalError};
use crate::expr::{eval, EvalContext, SymbolResolver};
use crate::opcodes;
use crate::parser;
use crate::symtab::SymbolTable;

const SPECIAL_JMP_OPCODE: u8 = 0x63;

struct PassResolver<'a> {
    symtab: &'a mut SymbolTable,
    pass: u8,
    had_undefined: bool,
}

impl SymbolResolver for PassResolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<i64, EvalError> {
        let qualified = self.symtab.qualify(name);
        match self.symtab.value(&qualified) {
            Some(v) => Ok(v),
            None if self.pass == 1 => {
                self.had_undefined = true;
                Ok(0)
            }
            None => Err(EvalError::UndefinedSymbol(qualified)),
        }
    }
}

pub struct CompilationContext {
    symtab: SymbolTable,
    pending: Vec<u16>,
    binary: Vec<u8>,
    debug: DebugTable,
    pc: u32,
    stmt_start_pc: u32,
    last_label_pc: u32,
    saved_org: Option<u32>,
    pass: u8,
    error: Option<CompileError>,
    file: String,
    line: u32,
}

impl CompilationContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symtab: SymbolTable::new(),
            pending: Vec::new(),
            binary: Vec::new(),
            debug: DebugTable::new(),
            pc: 0,
            stmt_start_pc: 0,
            last_label_pc: 0,
            saved_org: None,
            pass: 1,
            error: None,
            file: String::new(),
            line: 0,
        }
    }

    /// Runs both passes over the preprocessed, marker-tagged source
    /// and consumes `self` into its final output.
    #[must_use]
    pub fn compile(mut self, preprocessed: &str) -> (Vec<u8>, DebugTable, Option<CompileError>) {
        self.run_pass(preprocessed, 1);
        if self.error.is_none() {
            self.pending.sort_unstable();
            self.pc = 0;
            self.last_label_pc = 0;
            self.saved_org = None;
            self.symtab.set_global_prefix("");
            self.run_pass(preprocessed, 2);
        }
        if self.error.is_some() {
            self.binary.clear();
        }
        (self.binary, self.debug, self.error)
    }

    fn run_pass(&mut self, preprocessed: &str, pass: u8) {
        self.pass = pass;
        for line in preprocessed.lines() {
            if self.error.is_some() {
                break;
            }
            let Some((file, lineno, rest)) = parser::split_marker(line) else {
                continue;
            };
            self.file = file.to_string();
            self.line = lineno;
            let stmt = match parser::parse_line(rest) {
                Ok(Some(stmt)) => stmt,
                Ok(None) => continue,
                Err(err) => {
                    self.record_error(err);
                    break;
                }
            };
            if let Err(err) = self.process_statement(&stmt) {
                self.record_error(err);
                break;
            }
        }
    }

    fn record_error(&mut self, err: EvalError) {
        if self.error.is_none() {
            self.error = Some(CompileError::new(err.to_string(), self.file.clone(), self.line));
        }
    }

    fn process_statement(&mut self, stmt: &Statement) -> Result<(), EvalError> {
        self.stmt_start_pc = self.pc;
        match stmt {
            Statement::Label(name) => self.process_label(name),
            Statement::Define { name, expr } => self.process_define(name, expr),
            Statement::Org(expr) => self.process_org(expr),
            Statement::OrgRestore => self.process_org_restore(),
            Statement::Bss(expr) => self.process_bss(expr),
            Statement::Db(items) => self.process_db(items),
            Statement::Dw(exprs) => self.process_dw(exprs),
            Statement::Instruction { mnemonic, operands } => {
                self.process_instruction(mnemonic, operands)
            }
        }
    }

    fn process_label(&mut self, name: &str) -> Result<(), EvalError> {
        if !name.starts_with('.') {
            self.last_label_pc = self.pc;
        }
        if self.pass == 1 {
            self.symtab.add(name, i64::from(self.pc), true)?;
        } else if !name.starts_with('.') {
            // Pass 2 doesn't re-insert (the value is already known
            // from pass 1); it only needs to keep the global prefix
            // in step for subsequent local-label qualification.
            self.symtab.set_global_prefix(name);
        }
        Ok(())
    }

    fn process_define(&mut self, name: &str, expr: &Expr) -> Result<(), EvalError> {
        if self.pass != 1 {
            return Ok(());
        }
        if name.starts_with('.') {
            return Err(EvalError::DefineStartsWithDot(name.to_string()));
        }
        let (value, _) = self.eval_tracking(expr)?;
        self.symtab.add(name, value, false)?;
        Ok(())
    }

    fn process_org(&mut self, expr: &Expr) -> Result<(), EvalError> {
        let (value, _) = self.eval_tracking(expr)?;
        if self.saved_org.is_none() {
            self.saved_org = Some(self.pc);
        }
        self.pc = (value as u32) & 0xFFFF;
        Ok(())
    }

    fn process_org_restore(&mut self) -> Result<(), EvalError> {
        self.pc = self.saved_org.take().ok_or(EvalError::OrgRestoreWithoutSave)?;
        Ok(())
    }

    fn process_bss(&mut self, expr: &Expr) -> Result<(), EvalError> {
        let (count, _) = self.eval_tracking(expr)?;
        let count = count.max(0) as u32;
        if self.pass == 2 {
            self.ensure_len(self.pc + count);
        }
        self.pc += count;
        Ok(())
    }

    fn process_db(&mut self, items: &[DataItem]) -> Result<(), EvalError> {
        for item in items {
            match item {
                DataItem::Str(s) => {
                    for b in s.bytes() {
                        self.emit_or_advance(b);
                    }
                }
                DataItem::Byte(expr) => {
                    let (value, _) = self.eval_tracking(expr)?;
                    self.emit_or_advance(value as u8);
                }
            }
        }
        Ok(())
    }

    fn process_dw(&mut self, exprs: &[Expr]) -> Result<(), EvalError> {
        for expr in exprs {
            let (value, _) = self.eval_tracking(expr)?;
            let v = value as u32 as u16;
            self.emit_or_advance((v & 0xFF) as u8);
            self.emit_or_advance((v >> 8) as u8);
        }
        Ok(())
    }

    fn process_instruction(&mut self, mnemonic: &str, operands: &[Operand]) -> Result<(), EvalError> {
        let pc_instr_start = self.pc;

        if mnemonic.eq_ignore_ascii_case("jmp") {
            if let [Operand::Value(expr)] = operands {
                let (target, _) = self.eval_tracking(expr)?;
                if self.pass == 2 {
                    self.debug.add_line(pc_instr_start as u16, &self.file, self.line);
                    self.emit_byte(SPECIAL_JMP_OPCODE);
                    let v = target as u32 as u16;
                    self.emit_byte((v & 0xFF) as u8);
                    self.emit_byte((v >> 8) as u8);
                } else {
                    self.pc += 3;
                }
                return Ok(());
            }
        }

        let (opcode, _arity) = opcodes::lookup(mnemonic)
            .ok_or_else(|| EvalError::InvalidLiteral(format!("unknown mnemonic '{mnemonic}'")))?;

        if self.pass == 2 {
            self.debug.add_line(pc_instr_start as u16, &self.file, self.line);
            self.emit_byte(opcode);
        } else {
            self.pc += 1;
        }

        for operand in operands {
            let site_pc = self.pc;
            let (resolved, had_undefined) = self.resolve_operand(operand)?;
            let force_word = if self.pass == 1 {
                had_undefined
            } else {
                self.pending.binary_search(&(site_pc as u16)).is_ok()
            };
            let bytes = encode::encode(&resolved, force_word)?;
            if self.pass == 1 {
                if had_undefined {
                    self.pending.push(site_pc as u16);
                }
                self.pc += bytes.len() as u32;
            } else {
                for &b in bytes.as_slice() {
                    self.emit_byte(b);
                }
            }
        }
        Ok(())
    }

    fn resolve_operand(&mut self, operand: &Operand) -> Result<(Resolved, bool), EvalError> {
        Ok(match operand {
            Operand::Value(e) => {
                let (v, u) = self.eval_tracking(e)?;
                (Resolved::Value(v), u)
            }
            Operand::Register(r) => (Resolved::Register(*r), false),
            Operand::IndByte(e) => {
                let (v, u) = self.eval_tracking(e)?;
                (Resolved::IndByte(v), u)
            }
            Operand::IndWord(e) => {
                let (v, u) = self.eval_tracking(e)?;
                (Resolved::IndWord(v), u)
            }
            Operand::IndReg(r) => (Resolved::IndReg(*r), false),
            Operand::IndRegWord(r) => (Resolved::IndRegWord(*r), false),
            Operand::IndRegOffset(r, e) => {
                let (v, u) = self.eval_tracking(e)?;
                (Resolved::IndRegOffset(*r, v), u)
            }
            Operand::IndRegOffsetWord(r, e) => {
                let (v, u) = self.eval_tracking(e)?;
                (Resolved::IndRegOffsetWord(*r, v), u)
            }
        })
    }

    fn eval_tracking(&mut self, expr: &Expr) -> Result<(i64, bool), EvalError> {
        let mut resolver = PassResolver {
            symtab: &mut self.symtab,
            pass: self.pass,
            had_undefined: false,
        };
        let value = {
            let mut ctx = EvalContext {
                current_pc: i64::from(self.stmt_start_pc),
                last_label_pc: i64::from(self.last_label_pc),
                resolver: &mut resolver,
            };
            eval(expr, &mut ctx)?
        };
        Ok((value, resolver.had_undefined))
    }

    fn ensure_len(&mut self, len: u32) {
        if (self.binary.len() as u32) < len {
            self.binary.resize(len as usize, 0);
        }
    }

    fn emit_byte(&mut self, b: u8) {
        let idx = self.pc;
        self.ensure_len(idx + 1);
        self.binary[idx as usize] = b;
        self.pc += 1;
    }

    fn emit_or_advance(&mut self, b: u8) {
        if self.pass == 2 {
            self.emit_byte(b);
        } else {
            self.pc += 1;
        }
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}
