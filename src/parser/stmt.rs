use crate::{
    ast::{
        ast::{Declaration, Program},
        statements::{
            Assignment, Conditional, ElseBlock, ForLoop, FunctionDefinition, IfBlock, Log,
            Parameter, Return, Switch, SwitchCase, TypeRef, VarDeclaration, WhileLoop,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    expr::{parse_call, parse_expr},
    lookups::BindingPower,
    parser::Parser,
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let kind = parser.current_token_kind();
    let Some(stmt_fn) = parser.get_stmt_lookup().get(&kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a declaration or statement"),
            },
            parser.get_position(),
        ));
    };

    stmt_fn(parser)
}

/// Parses declarations until one of `terminators` is the current token.
///
/// The terminator itself is left for the caller to consume.
pub fn parse_declarations(
    parser: &mut Parser,
    terminators: &[TokenKind],
) -> Result<Vec<Declaration>, Error> {
    let mut declarations = vec![];

    while !parser.current_token().is_one_of_many(terminators) {
        if !parser.has_tokens() {
            let expected = terminators
                .iter()
                .map(|kind| format!("{:?}", kind))
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: format!("unexpected end of file, expected {}", expected),
                },
                parser.get_position(),
            ));
        }

        declarations.push(parse_stmt(parser)?);
    }

    Ok(declarations)
}

pub fn parse_program(parser: &mut Parser) -> Result<Program, Error> {
    let start = parser
        .expect_error(TokenKind::Boot, "a program starts with `boot NAME`")?
        .span
        .start;
    let name = parser
        .expect_error(TokenKind::Identifier, "expected the program name after `boot`")?
        .value;

    let declarations = parse_declarations(parser, &[TokenKind::Shutdown])?;

    parser.expect(TokenKind::Shutdown)?;
    let end_name = parser.expect_error(
        TokenKind::Identifier,
        "expected the program name after `shutdown`",
    )?;
    if end_name.value != name {
        return Err(Error::new(
            ErrorImpl::ProgramNameMismatch {
                expected: name,
                received: end_name.value,
            },
            end_name.span.start,
        ));
    }

    parser.expect_error(TokenKind::EOF, "nothing may follow `shutdown`")?;

    Ok(Program {
        name,
        declarations,
        span: parser.span_from(start),
    })
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let type_token = parser.advance();
    let name = parser
        .expect_error(TokenKind::Identifier, "expected a variable name")?
        .value;
    parser.expect_error(
        TokenKind::Assignment,
        "variables must be initialised with `=`",
    )?;
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Declaration::Variable(VarDeclaration {
        type_ref: TypeRef {
            name: type_token.value,
            span: type_token.span.clone(),
        },
        name,
        value,
        span: parser.span_from(type_token.span.start),
    }))
}

/// An identifier at statement position is either a call or an assignment.
pub fn parse_identifier_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    match parser.peek_kind() {
        TokenKind::OpenParen => Ok(Declaration::Call(parse_call(parser)?)),
        TokenKind::Assignment => {
            let target = parser.advance();
            parser.advance();
            let value = parse_expr(parser, BindingPower::Default)?;

            Ok(Declaration::Assignment(Assignment {
                target: target.value,
                value,
                span: parser.span_from(target.span.start),
            }))
        }
        _ => {
            let token = parser.advance();
            Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: token.value,
                    message: String::from("expected `=` or `(` after the name"),
                },
                token.span.start,
            ))
        }
    }
}

pub fn parse_log_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Log)?.span.start;
    let expression = parse_expr(parser, BindingPower::Default)?;

    Ok(Declaration::Log(Log {
        expression,
        span: parser.span_from(start),
    }))
}

/// `ping c process ... [pong ping c process ...]* [pong process ...] ping_end`
pub fn parse_conditional_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Ping)?.span.start;
    let mut branches = vec![parse_if_block(parser, start.clone())?];
    let mut else_block = None;

    while parser.current_token_kind() == TokenKind::Pong {
        let pong = parser.advance().span.start;

        if parser.current_token_kind() == TokenKind::Ping {
            parser.advance();
            branches.push(parse_if_block(parser, pong)?);
            continue;
        }

        parser.expect_error(TokenKind::Process, "expected `process` after `pong`")?;
        let body = parse_declarations(parser, &[TokenKind::PingEnd])?;
        else_block = Some(ElseBlock {
            body,
            span: parser.span_from(pong),
        });
        break;
    }

    parser.expect_error(TokenKind::PingEnd, "expected `ping_end` to close `ping`")?;

    Ok(Declaration::Conditional(Conditional {
        branches,
        else_block,
        span: parser.span_from(start),
    }))
}

fn parse_if_block(parser: &mut Parser, start: crate::Position) -> Result<IfBlock, Error> {
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_error(TokenKind::Process, "expected `process` after the condition")?;
    let body = parse_declarations(parser, &[TokenKind::Pong, TokenKind::PingEnd])?;

    Ok(IfBlock {
        condition,
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Loop)?.span.start;
    let expression = parse_expr(parser, BindingPower::Default)?;
    parser.expect_error(TokenKind::As, "expected `as` after the loop bound")?;
    let iterator = parser
        .expect_error(TokenKind::Identifier, "expected the iterator name")?
        .value;
    parser.expect_error(TokenKind::Process, "expected `process` to open the loop body")?;
    let body = parse_declarations(parser, &[TokenKind::LoopEnd])?;
    parser.expect(TokenKind::LoopEnd)?;

    Ok(Declaration::ForLoop(ForLoop {
        expression,
        iterator,
        body,
        span: parser.span_from(start),
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Stream)?.span.start;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_error(TokenKind::Process, "expected `process` after the condition")?;
    let body = parse_declarations(parser, &[TokenKind::StreamEnd])?;
    parser.expect(TokenKind::StreamEnd)?;

    Ok(Declaration::WhileLoop(WhileLoop {
        condition,
        body,
        span: parser.span_from(start),
    }))
}

/// `select e process [when v process ...]* [otherwise process ...] select_end`
pub fn parse_switch_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Select)?.span.start;
    let subject = parse_expr(parser, BindingPower::Default)?;
    parser.expect_error(TokenKind::Process, "expected `process` after the subject")?;

    let case_end = [TokenKind::When, TokenKind::Otherwise, TokenKind::SelectEnd];
    let mut cases = vec![];
    while parser.current_token_kind() == TokenKind::When {
        let when = parser.advance().span.start;
        let value = parse_expr(parser, BindingPower::Default)?;
        parser.expect_error(TokenKind::Process, "expected `process` after the case value")?;
        let body = parse_declarations(parser, &case_end)?;

        cases.push(SwitchCase {
            value,
            body,
            span: parser.span_from(when),
        });
    }

    let mut otherwise = None;
    if parser.current_token_kind() == TokenKind::Otherwise {
        let otherwise_start = parser.advance().span.start;
        parser.expect_error(TokenKind::Process, "expected `process` after `otherwise`")?;
        let body = parse_declarations(parser, &[TokenKind::SelectEnd])?;
        otherwise = Some(ElseBlock {
            body,
            span: parser.span_from(otherwise_start),
        });
    }

    parser.expect_error(TokenKind::SelectEnd, "expected `select_end` to close `select`")?;

    Ok(Declaration::Switch(Switch {
        subject,
        cases,
        otherwise,
        span: parser.span_from(start),
    }))
}

/// `module name(a, b) process ... [return expr] module_end`
pub fn parse_function_stmt(parser: &mut Parser) -> Result<Declaration, Error> {
    let start = parser.expect(TokenKind::Module)?.span.start;
    let name = parser
        .expect_error(TokenKind::Identifier, "expected the function name")?
        .value;

    parser.expect(TokenKind::OpenParen)?;
    let mut params = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        let param = parser.expect_error(TokenKind::Identifier, "expected a parameter name")?;
        params.push(Parameter {
            name: param.value,
            span: param.span,
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }
    parser.expect_error(TokenKind::CloseParen, "expected `)` after the parameters")?;
    parser.expect_error(TokenKind::Process, "expected `process` to open the function body")?;

    let body = parse_declarations(parser, &[TokenKind::Return, TokenKind::ModuleEnd])?;

    let mut return_clause = None;
    if parser.current_token_kind() == TokenKind::Return {
        let return_start = parser.advance().span.start;
        let expression = parse_expr(parser, BindingPower::Default)?;
        return_clause = Some(Return {
            expression,
            span: parser.span_from(return_start),
        });
    }

    parser.expect_error(
        TokenKind::ModuleEnd,
        "expected `module_end`, `return` must be the last clause of a function",
    )?;

    Ok(Declaration::Function(FunctionDefinition {
        name,
        params,
        body,
        return_clause,
        span: parser.span_from(start),
    }))
}
