use crate::Span;

use super::ast::{Declaration, Expr};

/// The declared type as written in source, resolved by the passes.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDeclaration {
    pub type_ref: TypeRef,
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Log {
    pub expression: Expr,
    pub span: Span,
}

/// One `ping` (or `pong ping`) arm of a conditional.
#[derive(Debug, Clone)]
pub struct IfBlock {
    pub condition: Expr,
    pub body: Vec<Declaration>,
    pub span: Span,
}

/// An unconditional body: the `pong` of a conditional or a switch's `otherwise`.
#[derive(Debug, Clone)]
pub struct ElseBlock {
    pub body: Vec<Declaration>,
    pub span: Span,
}

/// An if/elif chain. `branches` is never empty once parsed.
#[derive(Debug, Clone)]
pub struct Conditional {
    pub branches: Vec<IfBlock>,
    pub else_block: Option<ElseBlock>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub expression: Expr,
    pub iterator: String,
    pub body: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileLoop {
    pub condition: Expr,
    pub body: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Switch {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub otherwise: Option<ElseBlock>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub expression: Expr,
    pub span: Span,
}

/// A `module ... module_end` definition.
///
/// Parameters carry no type syntax and are always `byte`. The function
/// returns `byte` exactly when `return_clause` is present.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Declaration>,
    pub return_clause: Option<Return>,
    pub span: Span,
}
