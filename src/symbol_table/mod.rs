//! Scoped symbol tables.
//!
//! `ScopeTable<T>` is the shared enter/leave/shadowing structure;
//! `SymbolTable` specialises it for the type checker. Each pass builds its
//! own fresh table.

pub mod symbol_table;

#[cfg(test)]
mod tests;
