use crate::Span;

use super::{
    expressions::{
        ArrayLiteral, BinaryExpr, BooleanLiteral, FunctionCall, Identifier, NumberLiteral,
        StringLiteral, UnaryExpr,
    },
    statements::{
        Assignment, Conditional, ForLoop, FunctionDefinition, Log, Switch, VarDeclaration,
        WhileLoop,
    },
};

/// The root of every parsed source file: `boot NAME ... shutdown NAME`.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

/// Everything that may appear in a declaration list.
#[derive(Debug, Clone)]
pub enum Declaration {
    Variable(VarDeclaration),
    Assignment(Assignment),
    Function(FunctionDefinition),
    Conditional(Conditional),
    ForLoop(ForLoop),
    WhileLoop(WhileLoop),
    Switch(Switch),
    Call(FunctionCall),
    Log(Log),
}

impl Declaration {
    pub fn get_span(&self) -> &Span {
        match self {
            Declaration::Variable(decl) => &decl.span,
            Declaration::Assignment(assignment) => &assignment.span,
            Declaration::Function(function) => &function.span,
            Declaration::Conditional(conditional) => &conditional.span,
            Declaration::ForLoop(for_loop) => &for_loop.span,
            Declaration::WhileLoop(while_loop) => &while_loop.span,
            Declaration::Switch(switch) => &switch.span,
            Declaration::Call(call) => &call.span,
            Declaration::Log(log) => &log.span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(NumberLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Array(ArrayLiteral),
    Identifier(Identifier),
    Call(FunctionCall),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
}

impl Expr {
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Number(literal) => &literal.span,
            Expr::String(literal) => &literal.span,
            Expr::Boolean(literal) => &literal.span,
            Expr::Array(literal) => &literal.span,
            Expr::Identifier(identifier) => &identifier.span,
            Expr::Call(call) => &call.span,
            Expr::Binary(binary) => &binary.span,
            Expr::Unary(unary) => &unary.span,
        }
    }
}
