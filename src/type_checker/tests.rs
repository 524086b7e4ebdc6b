use std::rc::Rc;

use super::type_checker::{type_check, TypeChecker, RESERVED_NAMES};
use crate::{
    ast::{ast::Program, types::DataType},
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    symbol_table::symbol_table::SymbolKind,
};

fn program(body: &str) -> Program {
    let source = format!("boot test\n{}\nshutdown test", body);
    let tokens = tokenize(source, Some("test.tf".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.tf".to_string()));
    result.unwrap()
}

fn check(body: &str) -> Result<TypeChecker, Vec<Error>> {
    type_check(&program(body))
}

fn error_names(body: &str) -> Vec<String> {
    match check(body) {
        Ok(_) => vec![],
        Err(errors) => errors
            .iter()
            .map(|error| error.get_error_name().to_string())
            .collect(),
    }
}

fn expression_type(expr: &str) -> Result<DataType, Error> {
    let program = program(&format!("log {}", expr));
    let mut checker = TypeChecker::new();
    match &program.declarations[0] {
        crate::ast::ast::Declaration::Log(log) => checker.check_expression(&log.expression),
        other => panic!("expected a log statement, got {:?}", other),
    }
}

#[test]
fn test_literal_and_operator_types() {
    assert_eq!(expression_type("1 + 2").unwrap(), DataType::Byte);
    assert_eq!(expression_type("7 % 3 * 2").unwrap(), DataType::Byte);
    assert_eq!(expression_type("1 < 2").unwrap(), DataType::Bit);
    assert_eq!(expression_type("\"a\" == \"b\"").unwrap(), DataType::Bit);
    assert_eq!(expression_type("true and not false").unwrap(), DataType::Bit);
    assert_eq!(expression_type("[1, 2]").unwrap(), DataType::Array);
    assert_eq!(expression_type("-5").unwrap(), DataType::Byte);
}

#[test]
fn test_equality_requires_matching_types() {
    let error = expression_type("1 == \"a\"").unwrap_err();

    assert_eq!(error.get_error_name(), "BinaryOperandError");
}

#[test]
fn test_logical_operators_require_bits() {
    assert_eq!(
        expression_type("true and 1").unwrap_err().get_error_name(),
        "BinaryOperandError"
    );
    assert_eq!(
        expression_type("not 1").unwrap_err().get_error_name(),
        "UnaryOperandError"
    );
}

#[test]
fn test_arithmetic_rejects_strings() {
    assert_eq!(
        expression_type("\"a\" + 1").unwrap_err().get_error_name(),
        "BinaryOperandError"
    );
    assert_eq!(
        expression_type("\"a\" < \"b\"").unwrap_err().get_error_name(),
        "BinaryOperandError"
    );
}

#[test]
fn test_concat_accepts_printable_operands() {
    assert_eq!(expression_type("\"n=\" ++ 3").unwrap(), DataType::Chip);
    assert_eq!(expression_type("1 ++ true").unwrap(), DataType::Chip);
    assert_eq!(
        expression_type("\"a\" ++ [1]").unwrap_err().get_error_name(),
        "BinaryOperandError"
    );
}

#[test]
fn test_undeclared_identifier() {
    assert_eq!(error_names("log y"), vec!["VariableNotDeclared"]);
}

#[test]
fn test_declaration_type_mismatch() {
    assert_eq!(error_names("byte x = \"hi\""), vec!["TypeMatchError"]);
    assert_eq!(error_names("chip s = 1"), vec!["TypeMatchError"]);
}

#[test]
fn test_bit_widens_into_byte() {
    assert!(check("byte x = true\nx = 1 < 2").is_ok());
    assert_eq!(error_names("bit b = 1"), vec!["TypeMatchError"]);
}

#[test]
fn test_redeclaration_in_same_scope() {
    assert_eq!(
        error_names("byte x = 1\nbyte x = 2"),
        vec!["VariableAlreadyDeclared"]
    );
}

#[test]
fn test_shadowing_in_nested_scope() {
    let checker = check("byte x = 1\nping true process chip x = \"s\"\nlog x ++ \"!\" ping_end\nx = x + 1")
        .unwrap();

    let x = checker.symbols.lookup("x").unwrap();
    assert_eq!(x.data_type, DataType::Byte);
    assert_eq!(checker.symbols.current_scope(), 0);
}

#[test]
fn test_block_locals_do_not_leak() {
    assert_eq!(
        error_names("ping true process byte inner = 1 ping_end\nlog inner"),
        vec!["VariableNotDeclared"]
    );
}

#[test]
fn test_errors_accumulate_across_statements() {
    let names = error_names("byte a = \"x\"\nlog missing\nbit b = 1 + 2");

    assert_eq!(
        names,
        vec!["TypeMatchError", "VariableNotDeclared", "TypeMatchError"]
    );
}

#[test]
fn test_assignment_checks_target() {
    assert_eq!(error_names("x = 1"), vec!["VariableNotDeclared"]);
    assert_eq!(
        error_names("chip s = \"a\"\ns = 3"),
        vec!["TypeMatchError"]
    );
    assert_eq!(
        error_names("module f() process module_end\nf = 1"),
        vec!["NotAValue"]
    );
}

#[test]
fn test_conditions_must_be_bits() {
    assert_eq!(
        error_names("ping 1 process ping_end"),
        vec!["ConditionTypeError"]
    );
    assert_eq!(
        error_names("stream \"s\" process stream_end"),
        vec!["ConditionTypeError"]
    );
    assert!(check("byte x = 0\nstream x < 3 process x = x + 1 stream_end").is_ok());
}

#[test]
fn test_condition_error_still_checks_body() {
    assert_eq!(
        error_names("ping 1 process log nope ping_end"),
        vec!["ConditionTypeError", "VariableNotDeclared"]
    );
}

#[test]
fn test_for_loop_binds_byte_iterator() {
    assert!(check("loop 3 as i process byte doubled = i * 2 loop_end").is_ok());
    assert!(check("array a = [1, 2]\nloop a as item process log item + 1 loop_end").is_ok());
    assert_eq!(
        error_names("loop 3 as i process loop_end\nlog i"),
        vec!["VariableNotDeclared"]
    );
}

#[test]
fn test_for_loop_rejects_strings() {
    assert_eq!(
        error_names("loop \"abc\" as c process loop_end"),
        vec!["IterationTypeError"]
    );
}

#[test]
fn test_function_call_arity() {
    let definition = "module f(a, b) process return a + b module_end\n";

    assert_eq!(
        error_names(&format!("{}byte r = f(1)", definition)),
        vec!["MissingArguments"]
    );
    assert_eq!(
        error_names(&format!("{}byte r = f(1, 2, 3)", definition)),
        vec!["UnexpectedArguments"]
    );
    assert!(check(&format!("{}byte r = f(1, 2)", definition)).is_ok());
}

#[test]
fn test_function_argument_types() {
    assert_eq!(
        error_names("module f(a) process module_end\nf(\"s\")"),
        vec!["ArgumentTypeMatchError"]
    );
    assert!(check("module f(a) process module_end\nf(true)").is_ok());
}

#[test]
fn test_function_signature_recorded() {
    let checker = check("module add(a, b) process return a + b module_end\nmodule hello() process log 1 module_end")
        .unwrap();

    let add = checker.symbols.lookup("add").unwrap();
    assert_eq!(add.kind, SymbolKind::Function);
    assert_eq!(add.arity(), 2);
    assert_eq!(add.data_type, DataType::Byte);
    assert_eq!(checker.symbols.lookup("hello").unwrap().data_type, DataType::Void);
    assert!(checker.symbols.lookup("a").is_none());
}

#[test]
fn test_recursive_call_is_visible() {
    assert!(check(
        "module fact(n) process byte r = 1\nping n > 1 process r = n * fact(n - 1) ping_end\nreturn r module_end"
    )
    .is_ok());
}

#[test]
fn test_return_type_must_be_byte() {
    assert_eq!(
        error_names("module f() process return \"s\" module_end"),
        vec!["ReturnTypeMatchError"]
    );
    assert_eq!(
        error_names("module f() process return true module_end"),
        vec!["ReturnTypeMatchError"]
    );
}

#[test]
fn test_duplicate_parameter() {
    assert_eq!(
        error_names("module f(a, a) process module_end"),
        vec!["ParameterAlreadyDeclared"]
    );
    // The scope is still left, so later top-level code resolves normally
    assert!(check("module f(a) process module_end\nbyte a = 1\nlog a").is_ok());
}

#[test]
fn test_duplicate_function() {
    assert_eq!(
        error_names("module f() process module_end\nmodule f() process module_end"),
        vec!["FunctionAlreadyDeclared"]
    );
}

#[test]
fn test_main_is_reserved() {
    assert_eq!(
        error_names("module main() process module_end"),
        vec!["ReservedName"]
    );
}

#[test]
fn test_runtime_helper_names_are_reserved() {
    for name in RESERVED_NAMES {
        assert_eq!(
            error_names(&format!("module {}(a) process return a module_end", name)),
            vec!["ReservedName"]
        );
        assert_eq!(
            error_names(&format!("byte {} = 1", name)),
            vec!["ReservedName"]
        );
    }
}

#[test]
fn test_inner_function_may_shadow_outer() {
    assert!(check(
        "module f() process return 1 module_end
        ping true process
            module f() process return 2 module_end
            log f()
        ping_end"
    )
    .is_ok());
}

#[test]
fn test_void_call_has_no_value() {
    let definition = "module hello() process log 1 module_end\n";

    assert_eq!(
        error_names(&format!("{}log hello()", definition)),
        vec!["VoidValue"]
    );
    assert_eq!(
        error_names(&format!("{}byte x = hello()", definition)),
        vec!["TypeMatchError"]
    );
    assert!(check(&format!("{}hello()", definition)).is_ok());
}

#[test]
fn test_function_used_as_value() {
    assert_eq!(
        error_names("module f() process module_end\nlog f"),
        vec!["NotAValue"]
    );
}

#[test]
fn test_undeclared_function() {
    assert_eq!(error_names("g(1)"), vec!["FunctionNotDeclared"]);
}

#[test]
fn test_switch_cases_match_subject() {
    assert!(check(
        "chip s = \"b\"\nselect s process when \"a\" process log 1 when \"b\" process log 2 otherwise process log 3 select_end"
    )
    .is_ok());
    assert_eq!(
        error_names("select 1 process when \"a\" process select_end"),
        vec!["TypeMatchError"]
    );
    assert_eq!(
        error_names("select [1] process otherwise process select_end"),
        vec!["TypeMatchError"]
    );
}
