//! Name → value symbol table with scoped local-label namespace.
//!
//! Names starting with `.` are local: they are qualified with the
//! current "global prefix" (the most recently declared non-local
//! label) before being stored or looked up. The prefix is updated at
//! label *declaration* in both passes — pass 1 via [`SymbolTable::add`]
//! (which inserts the symbol too), pass 2 via
//! [`SymbolTable::set_global_prefix`] directly, since the symbol is
//! already known from pass 1 and must not be re-inserted.

use crate::error::EvalError;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: HashMap<String, i64>,
    global_prefix: String,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `name` to its fully-qualified form (prefixing local
    /// names with the current global prefix) without touching the
    /// prefix itself.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        if let Some(local) = name.strip_prefix('.') {
            format!("{}{local}", self.global_prefix)
        } else {
            name.to_string()
        }
    }

    #[must_use]
    pub fn global_prefix(&self) -> &str {
        &self.global_prefix
    }

    pub fn set_global_prefix(&mut self, name: &str) {
        self.global_prefix = name.to_string();
    }

    /// Adds a symbol. `update_global` mirrors pass 1's behaviour: a
    /// non-local name declared becomes the new global prefix.
    pub fn add(&mut self, name: &str, value: i64, update_global: bool) -> Result<(), EvalError> {
        if update_global && !name.starts_with('.') {
            self.global_prefix = name.to_string();
        }
        let qualified = self.qualify(name);
        if self.values.contains_key(&qualified) {
            return Err(EvalError::DuplicateSymbol(qualified));
        }
        self.values.insert(qualified, value);
        Ok(())
    }

    #[must_use]
    pub fn value(&self, qualified_name: &str) -> Option<i64> {
        self.values.get(qualified_name).copied()
    }

    #[must_use]
    pub fn contains(&self, qualified_name: &str) -> bool {
        self.values.contains_key(qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_label_scoped_to_prefix() {
        let mut t = SymbolTable::new();
        t.add("loop", 0x100, true).unwrap();
        t.add(".again", 0x102, true).unwrap();
        assert_eq!(t.value("loopagain"), Some(0x102));
    }

    #[test]
    fn duplicate_symbol_is_error() {
        let mut t = SymbolTable::new();
        t.add("xx", 3, true).unwrap();
        let err = t.add("xx", 4, true).unwrap_err();
        assert_eq!(err, EvalError::DuplicateSymbol("xx".to_string()));
    }

    #[test]
    fn update_global_is_skipped_for_local_names() {
        let mut t = SymbolTable::new();
        t.add("loop", 0x100, true).unwrap();
        t.add(".a", 1, true).unwrap();
        // `.a` never becomes the global prefix, even with update_global set.
        assert_eq!(t.global_prefix(), "loop");
    }

    #[test]
    fn pass2_set_global_prefix_without_reinserting() {
        let mut t = SymbolTable::new();
        t.add("a", 1, false).unwrap();
        t.add(".x", 2, false).unwrap();
        assert_eq!(t.value("x"), Some(2));
        t.set_global_prefix("b");
        assert_eq!(t.global_prefix(), "b");
        assert!(t.value("b").is_none());
    }
}
