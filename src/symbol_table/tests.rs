use proptest::prelude::*;

use super::symbol_table::{ScopeTable, SymbolKind, SymbolTable};
use crate::ast::types::DataType;

#[test]
fn test_insert_and_lookup() {
    let mut table = SymbolTable::new();

    assert!(table.insert("x", SymbolKind::Variable, DataType::Byte));
    let symbol = table.lookup("x").unwrap();
    assert_eq!(symbol.kind, SymbolKind::Variable);
    assert_eq!(symbol.data_type, DataType::Byte);
    assert_eq!(symbol.scope_level, 0);
    assert!(table.lookup("y").is_none());
}

#[test]
fn test_duplicate_in_same_scope_is_rejected() {
    let mut table = SymbolTable::new();

    assert!(table.insert("x", SymbolKind::Variable, DataType::Byte));
    assert!(!table.insert("x", SymbolKind::Parameter, DataType::Chip));

    let symbol = table.lookup("x").unwrap();
    assert_eq!(symbol.kind, SymbolKind::Variable);
    assert_eq!(symbol.data_type, DataType::Byte);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_shadowing_round_trips() {
    let mut table = SymbolTable::new();
    table.insert("x", SymbolKind::Variable, DataType::Byte);

    table.enter_scope();
    assert!(table.insert("x", SymbolKind::Variable, DataType::Chip));
    assert_eq!(table.lookup("x").unwrap().data_type, DataType::Chip);
    assert_eq!(table.lookup("x").unwrap().scope_level, 1);

    table.leave_scope();
    assert_eq!(table.lookup("x").unwrap().data_type, DataType::Byte);
    assert_eq!(table.current_scope(), 0);
}

#[test]
fn test_lookup_current_scope_ignores_outer() {
    let mut table = SymbolTable::new();
    table.insert("x", SymbolKind::Variable, DataType::Byte);
    table.enter_scope();

    assert!(table.lookup_current_scope("x").is_none());
    assert!(table.lookup("x").is_some());
}

#[test]
fn test_leave_scope_only_removes_current_depth() {
    let mut table = SymbolTable::new();
    table.insert("a", SymbolKind::Variable, DataType::Byte);
    table.enter_scope();
    table.insert("b", SymbolKind::Variable, DataType::Byte);
    table.enter_scope();
    table.insert("c", SymbolKind::Variable, DataType::Byte);

    table.leave_scope();
    assert!(table.lookup("c").is_none());
    assert!(table.lookup("b").is_some());
    assert!(table.lookup("a").is_some());

    table.leave_scope();
    assert!(table.lookup("b").is_none());
    assert!(table.lookup("a").is_some());
}

#[test]
fn test_leave_scope_at_top_level_is_a_no_op() {
    let mut table = SymbolTable::new();
    table.insert("a", SymbolKind::Variable, DataType::Byte);

    table.leave_scope();
    assert_eq!(table.current_scope(), 0);
    assert!(table.lookup("a").is_some());
}

#[test]
fn test_insert_function_records_signature() {
    let mut table = SymbolTable::new();

    assert!(table.insert_function("f", vec![DataType::Byte, DataType::Byte], DataType::Byte));
    let function = table.lookup("f").unwrap();
    assert_eq!(function.kind, SymbolKind::Function);
    assert_eq!(function.arity(), 2);
    assert_eq!(function.signature.as_ref().unwrap().return_type, DataType::Byte);

    assert!(!table.insert_function("f", vec![], DataType::Void));
    assert_eq!(table.lookup("f").unwrap().arity(), 2);
}

#[test]
fn test_function_and_variable_share_namespace() {
    let mut table = SymbolTable::new();
    table.insert_function("f", vec![], DataType::Void);

    assert!(!table.insert("f", SymbolKind::Variable, DataType::Byte));
}

#[test]
fn test_single_bucket_table_still_separates_names() {
    let mut table = SymbolTable::with_buckets(1);
    table.insert("a", SymbolKind::Variable, DataType::Byte);
    table.insert("b", SymbolKind::Variable, DataType::Chip);

    assert_eq!(table.lookup("a").unwrap().data_type, DataType::Byte);
    assert_eq!(table.lookup("b").unwrap().data_type, DataType::Chip);
}

#[test]
fn test_bind_replaces_at_current_depth() {
    let mut table: ScopeTable<i32> = ScopeTable::new();
    table.bind("x", 1);
    table.enter_scope();
    table.bind("x", 2);
    table.bind("x", 3);

    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup("x"), Some(&3));

    table.leave_scope();
    assert_eq!(table.lookup("x"), Some(&1));
}

#[test]
fn test_lookup_mut_targets_innermost() {
    let mut table: ScopeTable<String> = ScopeTable::new();
    table.insert("s", String::from("outer"));
    table.enter_scope();
    table.insert("s", String::from("inner"));

    *table.lookup_mut("s").unwrap() = String::from("changed");
    table.leave_scope();

    assert_eq!(table.lookup("s").map(String::as_str), Some("outer"));
}

#[test]
fn test_lookup_at_ignores_later_shadowing() {
    let mut table: ScopeTable<i32> = ScopeTable::new();
    table.insert("x", 1);
    let mark = table.mark();

    table.enter_scope();
    table.insert("x", 5);
    table.insert("y", 2);

    assert_eq!(table.lookup("x"), Some(&5));
    assert_eq!(table.lookup_at("x", mark), Some(&1));
    assert_eq!(table.lookup_at("y", mark), None);
}

#[test]
fn test_lookup_at_skips_same_depth_bindings_made_later() {
    let mut table: ScopeTable<i32> = ScopeTable::new();
    table.insert("x", 1);
    table.enter_scope();
    let mark = table.mark();
    table.insert("x", 2);

    assert_eq!(table.lookup_at("x", mark), Some(&1));

    *table.lookup_at_mut("x", mark).unwrap() = 7;
    assert_eq!(table.lookup("x"), Some(&2));
    table.leave_scope();
    assert_eq!(table.lookup("x"), Some(&7));
}

proptest! {
    #[test]
    fn prop_inner_declaration_shadows_then_restores(
        name in "[a-z_][a-z0-9_]{0,8}",
        depth in 1usize..6,
    ) {
        let mut table = SymbolTable::with_buckets(7);
        table.insert(&name, SymbolKind::Variable, DataType::Byte);

        for _ in 0..depth {
            table.enter_scope();
        }
        prop_assert!(table.insert(&name, SymbolKind::Variable, DataType::Chip));
        prop_assert_eq!(table.lookup(&name).unwrap().data_type, DataType::Chip);

        for _ in 0..depth {
            table.leave_scope();
        }
        prop_assert_eq!(table.lookup(&name).unwrap().data_type, DataType::Byte);
        prop_assert_eq!(table.len(), 1);
    }

    #[test]
    fn prop_second_insert_at_same_depth_fails(
        name in "[a-z_][a-z0-9_]{0,8}",
        depth in 0usize..4,
    ) {
        let mut table = SymbolTable::new();
        for _ in 0..depth {
            table.enter_scope();
        }

        prop_assert!(table.insert(&name, SymbolKind::Parameter, DataType::Byte));
        prop_assert!(!table.insert(&name, SymbolKind::Variable, DataType::Bit));

        let symbol = table.lookup(&name).unwrap();
        prop_assert_eq!(symbol.kind, SymbolKind::Parameter);
        prop_assert_eq!(symbol.data_type, DataType::Byte);
    }

    #[test]
    fn prop_balanced_scopes_leave_no_residue(
        names in proptest::collection::vec("[a-z]{1,4}", 1..20),
    ) {
        let mut table: ScopeTable<usize> = ScopeTable::with_buckets(5);
        table.enter_scope();
        for (index, name) in names.iter().enumerate() {
            table.bind(name, index);
        }
        table.leave_scope();

        prop_assert!(table.is_empty());
        prop_assert_eq!(table.current_scope(), 0);
    }
}
