//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at(offset: u32) -> Position {
    Position(offset, Rc::new("test.tf".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: "byte".to_string(),
            received: "chip".to_string(),
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "TypeMatchError");
    assert_eq!(
        error.get_tip().to_string(),
        "Expected type `byte`, received `chip`"
    );
}

#[test]
fn test_arity_errors_name_the_function() {
    let too_many = Error::new(
        ErrorImpl::UnexpectedArguments {
            function: "f".to_string(),
            expected: 2,
            received: 3,
        },
        at(0),
    );
    let too_few = Error::new(
        ErrorImpl::MissingArguments {
            function: "f".to_string(),
            expected: 2,
            received: 1,
        },
        at(0),
    );

    assert_eq!(too_many.get_error_name(), "UnexpectedArguments");
    assert_eq!(too_few.get_error_name(), "MissingArguments");
    assert_eq!(too_few.get_tip().to_string(), "`f` takes 2 arguments, received 1");
}

#[test]
fn test_redeclaration_errors() {
    let variable = Error::new(
        ErrorImpl::VariableAlreadyDeclared {
            variable: "x".to_string(),
        },
        at(0),
    );
    let parameter = Error::new(
        ErrorImpl::ParameterAlreadyDeclared {
            parameter: "a".to_string(),
            function: "f".to_string(),
        },
        at(0),
    );

    assert_eq!(variable.get_error_name(), "VariableAlreadyDeclared");
    assert_eq!(parameter.get_error_name(), "ParameterAlreadyDeclared");
}

#[test]
fn test_only_unsupported_is_a_warning() {
    let warning = Error::new(
        ErrorImpl::Unsupported {
            feature: "array iteration".to_string(),
        },
        at(0),
    );
    let error = Error::new(ErrorImpl::DivisionByZero, at(0));

    assert!(warning.is_warning());
    assert!(!error.is_warning());
    assert_eq!(
        warning.get_tip().to_string(),
        "array iteration is not implemented and was skipped"
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_display_uses_message() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "foo".to_string(),
        },
        at(0),
    );

    assert_eq!(error.to_string(), "variable \"foo\" not declared");
    assert_eq!(
        error.get_kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: "foo".to_string()
        }
    );
}
