use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        tracing::trace!(error = %error_impl, offset = position.0, "diagnostic created");
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.internal_error, ErrorImpl::Unsupported { .. })
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::ProgramNameMismatch { .. } => "ProgramNameMismatch",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::ParameterAlreadyDeclared { .. } => "ParameterAlreadyDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::NotAValue { .. } => "NotAValue",
            ErrorImpl::ReservedName { .. } => "ReservedName",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ReturnTypeMatchError { .. } => "ReturnTypeMatchError",
            ErrorImpl::ConditionTypeError { .. } => "ConditionTypeError",
            ErrorImpl::IterationTypeError { .. } => "IterationTypeError",
            ErrorImpl::BinaryOperandError { .. } => "BinaryOperandError",
            ErrorImpl::UnaryOperandError { .. } => "UnaryOperandError",
            ErrorImpl::VoidValue { .. } => "VoidValue",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::ForeignLocal { .. } => "ForeignLocal",
            ErrorImpl::BuilderError { .. } => "BuilderError",
            ErrorImpl::VerificationFailed { .. } => "VerificationFailed",
            ErrorImpl::TargetError { .. } => "TargetError",
            ErrorImpl::OutputError { .. } => "OutputError",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::RuntimeTypeError { .. } => "RuntimeTypeError",
            ErrorImpl::Unsupported { .. } => "Unsupported",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the byte limit?",
                token
            )),
            ErrorImpl::ProgramNameMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "`boot {}` must be closed by `shutdown {}`, found `shutdown {}`",
                expected, expected, received
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` already declared in this scope",
                variable
            )),
            ErrorImpl::ParameterAlreadyDeclared {
                parameter,
                function,
            } => ErrorTip::Suggestion(format!(
                "Parameter `{}` appears more than once in `{}`",
                parameter, function
            )),
            ErrorImpl::FunctionAlreadyDeclared { function } => ErrorTip::Suggestion(format!(
                "Function `{}` already declared in this scope",
                function
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::FunctionNotDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` not declared", function))
            }
            ErrorImpl::NotAValue { name } => ErrorTip::Suggestion(format!(
                "`{}` is a function, call it with `{}(...)`",
                name, name
            )),
            ErrorImpl::ReservedName { name } => ErrorTip::Suggestion(format!(
                "`{}` is defined by the compiler; pick another name",
                name
            )),
            ErrorImpl::UnexpectedArguments {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` takes {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::MissingArguments {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` takes {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ReturnTypeMatchError {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` returns `{}`, received `{}`",
                function, expected, received
            )),
            ErrorImpl::ConditionTypeError {
                construct,
                received,
            } => ErrorTip::Suggestion(format!(
                "The condition of `{}` must be `bit`, received `{}`",
                construct, received
            )),
            ErrorImpl::IterationTypeError { received } => ErrorTip::Suggestion(format!(
                "`loop` iterates a `byte` count or an `array`, received `{}`",
                received
            )),
            ErrorImpl::BinaryOperandError {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::UnaryOperandError { operator, operand } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}`",
                operator, operand
            )),
            ErrorImpl::VoidValue { context } => {
                ErrorTip::Suggestion(format!("A void call has no value to {}", context))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::ForeignLocal { variable } => ErrorTip::Suggestion(format!(
                "`{}` lives on another function's stack",
                variable
            )),
            ErrorImpl::BuilderError { .. } => ErrorTip::None,
            ErrorImpl::VerificationFailed { .. } => ErrorTip::Suggestion(String::from(
                "The generated module is malformed, this is a compiler bug",
            )),
            ErrorImpl::TargetError { .. } => ErrorTip::None,
            ErrorImpl::OutputError { .. } => ErrorTip::None,
            ErrorImpl::DivisionByZero => ErrorTip::None,
            ErrorImpl::RuntimeTypeError { .. } => ErrorTip::None,
            ErrorImpl::Unsupported { feature } => ErrorTip::Suggestion(format!(
                "{} is not implemented and was skipped",
                feature
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::new(
            ErrorImpl::BuilderError {
                message: error.to_string(),
            },
            Position::null(),
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("program {expected:?} closed as {received:?}")]
    ProgramNameMismatch { expected: String, received: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("parameter {parameter:?} of {function:?} already declared")]
    ParameterAlreadyDeclared { parameter: String, function: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("function {function:?} not declared")]
    FunctionNotDeclared { function: String },
    #[error("{name:?} is a function, not a value")]
    NotAValue { name: String },
    #[error("name {name:?} is reserved")]
    ReservedName { name: String },
    #[error("too many arguments to {function:?}: expected {expected}, received {received}")]
    UnexpectedArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("missing arguments to {function:?}: expected {expected}, received {received}")]
    MissingArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("argument types do not match: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("return type of {function:?} does not match: expected {expected:?}, received {received:?}")]
    ReturnTypeMatchError {
        function: String,
        expected: String,
        received: String,
    },
    #[error("condition of {construct:?} must be bit, received {received:?}")]
    ConditionTypeError { construct: String, received: String },
    #[error("cannot iterate over {received:?}")]
    IterationTypeError { received: String },
    #[error("invalid operands for {operator:?}: {left:?} and {right:?}")]
    BinaryOperandError {
        operator: String,
        left: String,
        right: String,
    },
    #[error("invalid operand for {operator:?}: {operand:?}")]
    UnaryOperandError { operator: String, operand: String },
    #[error("void value used where a value is required ({context})")]
    VoidValue { context: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("variable {variable:?} belongs to another function")]
    ForeignLocal { variable: String },
    #[error("instruction builder failed: {message}")]
    BuilderError { message: String },
    #[error("module verification failed: {message}")]
    VerificationFailed { message: String },
    #[error("target setup failed: {message}")]
    TargetError { message: String },
    #[error("could not write output: {message}")]
    OutputError { message: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("runtime type error: {message}")]
    RuntimeTypeError { message: String },
    #[error("{feature} is not implemented")]
    Unsupported { feature: String },
}
