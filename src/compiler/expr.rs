use inkwell::{
    values::{BasicMetadataValueEnum, BasicValueEnum, IntValue},
    IntPredicate,
};

use crate::{
    ast::{
        ast::Expr,
        expressions::{BinaryExpr, BinaryOperator, FunctionCall, UnaryExpr, UnaryOperator},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    compiler::{builder_error, type_name, Compiler, INTERNAL_STRING},
    runtime::RuntimeFunction,
};

/// Generates LLVM IR for the given expression.
pub fn gen_expression<'ctx>(
    compiler: &mut Compiler<'ctx>,
    expression: &Expr,
) -> Result<BasicValueEnum<'ctx>, Error> {
    match expression {
        Expr::Number(number) => Ok(compiler
            .context
            .i32_type()
            .const_int(number.value as u64, true)
            .into()),
        Expr::String(string) => Ok(compiler
            .builder
            .build_global_string_ptr(&string.value, INTERNAL_STRING)?
            .as_pointer_value()
            .into()),
        Expr::Boolean(boolean) => Ok(compiler
            .context
            .bool_type()
            .const_int(boolean.value as u64, false)
            .into()),
        Expr::Array(array) => {
            compiler.warn("array literal", &array.span.start);
            Ok(compiler.array_type().const_null().into())
        }
        Expr::Identifier(identifier) => {
            let binding = compiler.lookup(&identifier.name, &identifier.span.start)?;
            Ok(compiler
                .builder
                .build_load(binding.pointer, &identifier.name)?)
        }
        Expr::Call(call) => gen_call(compiler, call)?.ok_or_else(|| {
            Error::new(
                ErrorImpl::VoidValue {
                    context: String::from("expression"),
                },
                call.span.start.clone(),
            )
        }),
        Expr::Binary(binary) => gen_binary(compiler, binary),
        Expr::Unary(unary) => gen_unary(compiler, unary),
    }
}

/// Lowers a call. Void callees produce `None`.
pub fn gen_call<'ctx>(
    compiler: &mut Compiler<'ctx>,
    call: &FunctionCall,
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    let function = compiler.lookup_function(&call.name, &call.span.start)?;

    let expected = function.count_params() as usize;
    let received = call.arguments.len();
    if received > expected {
        return Err(Error::new(
            ErrorImpl::UnexpectedArguments {
                function: call.name.clone(),
                expected,
                received,
            },
            call.span.start.clone(),
        ));
    }
    if received < expected {
        return Err(Error::new(
            ErrorImpl::MissingArguments {
                function: call.name.clone(),
                expected,
                received,
            },
            call.span.start.clone(),
        ));
    }

    let mut arguments: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(received);
    for argument in &call.arguments {
        let value = gen_expression(compiler, argument)?;
        arguments.push(compiler.widen_to_byte(value)?.into());
    }

    // Void call instructions cannot be named
    let name = if function.get_type().get_return_type().is_some() {
        call.name.as_str()
    } else {
        ""
    };

    Ok(compiler
        .builder
        .build_call(function, &arguments, name)?
        .try_as_basic_value()
        .left())
}

fn gen_binary<'ctx>(
    compiler: &mut Compiler<'ctx>,
    binary: &BinaryExpr,
) -> Result<BasicValueEnum<'ctx>, Error> {
    let position = &binary.span.start;
    let left = gen_expression(compiler, &binary.left)?;
    let right = gen_expression(compiler, &binary.right)?;

    match binary.operator {
        BinaryOperator::Concat => gen_concat(compiler, left, right, position),
        BinaryOperator::Equal => {
            Ok(build_equality(compiler, IntPredicate::EQ, left, right, position)?.into())
        }
        BinaryOperator::NotEqual => {
            Ok(build_equality(compiler, IntPredicate::NE, left, right, position)?.into())
        }
        operator => {
            let left = compiler.int_value(left, "byte or bit", position)?;
            let right = compiler.int_value(right, "byte or bit", position)?;
            build_int_operation(compiler, operator, left, right, position)
        }
    }
}

/// Lowers an arithmetic, ordering or logical operator over two integers.
fn build_int_operation<'ctx>(
    compiler: &Compiler<'ctx>,
    operator: BinaryOperator,
    left: IntValue<'ctx>,
    right: IntValue<'ctx>,
    position: &Position,
) -> Result<BasicValueEnum<'ctx>, Error> {
    let builder = &compiler.builder;

    let value: BasicValueEnum<'ctx> = match operator {
        BinaryOperator::Plus => builder.build_int_add(left, right, "add")?.into(),
        BinaryOperator::Minus => builder.build_int_sub(left, right, "sub")?.into(),
        BinaryOperator::Multiply => builder.build_int_mul(left, right, "mul")?.into(),
        BinaryOperator::Divide => builder.build_int_signed_div(left, right, "div")?.into(),
        BinaryOperator::Modulo => builder.build_int_signed_rem(left, right, "rem")?.into(),
        BinaryOperator::Less => builder
            .build_int_compare(IntPredicate::SLT, left, right, "lt")?
            .into(),
        BinaryOperator::LessEqual => builder
            .build_int_compare(IntPredicate::SLE, left, right, "le")?
            .into(),
        BinaryOperator::Greater => builder
            .build_int_compare(IntPredicate::SGT, left, right, "gt")?
            .into(),
        BinaryOperator::GreaterEqual => builder
            .build_int_compare(IntPredicate::SGE, left, right, "ge")?
            .into(),
        BinaryOperator::And => builder.build_and(left, right, "and")?.into(),
        BinaryOperator::Or => builder.build_or(left, right, "or")?.into(),
        BinaryOperator::Concat | BinaryOperator::Equal | BinaryOperator::NotEqual => {
            return Err(Error::new(
                ErrorImpl::BinaryOperandError {
                    operator: operator.to_string(),
                    left: type_name(left.into()),
                    right: type_name(right.into()),
                },
                position.clone(),
            ))
        }
    };

    Ok(value)
}

fn gen_unary<'ctx>(
    compiler: &mut Compiler<'ctx>,
    unary: &UnaryExpr,
) -> Result<BasicValueEnum<'ctx>, Error> {
    let operand = gen_expression(compiler, &unary.operand)?;
    let operand = compiler.int_value(operand, "byte or bit", &unary.span.start)?;

    Ok(match unary.operator {
        UnaryOperator::Negate => compiler.builder.build_int_neg(operand, "neg")?.into(),
        UnaryOperator::Plus => operand.into(),
        UnaryOperator::Not => compiler.builder.build_not(operand, "not")?.into(),
    })
}

/// Compares two values of the same type.
///
/// Integers compare directly, strings through `strcmp` and arrays by
/// address.
pub fn build_equality<'ctx>(
    compiler: &Compiler<'ctx>,
    predicate: IntPredicate,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
    position: &Position,
) -> Result<IntValue<'ctx>, Error> {
    let builder = &compiler.builder;

    match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => {
            if left.get_type() == right.get_type() {
                return Ok(builder.build_int_compare(predicate, left, right, "eq")?);
            }
            let left = compiler.widen_to_byte(left.into())?.into_int_value();
            let right = compiler.widen_to_byte(right.into())?.into_int_value();
            Ok(builder.build_int_compare(predicate, left, right, "eq")?)
        }
        (BasicValueEnum::PointerValue(left), BasicValueEnum::PointerValue(right))
            if compiler.is_string(left.into()) =>
        {
            let strcmp = compiler.runtime_function(RuntimeFunction::StringCompare);
            let ordering = builder
                .build_call(strcmp, &[left.into(), right.into()], "cmp")?
                .try_as_basic_value()
                .left()
                .map(BasicValueEnum::into_int_value)
                .ok_or_else(|| builder_error("strcmp returned no value"))?;
            Ok(builder.build_int_compare(
                predicate,
                ordering,
                compiler.context.i32_type().const_zero(),
                "streq",
            )?)
        }
        (BasicValueEnum::PointerValue(left), BasicValueEnum::PointerValue(right)) => {
            let i64_type = compiler.context.i64_type();
            let left = builder.build_ptr_to_int(left, i64_type, "addr")?;
            let right = builder.build_ptr_to_int(right, i64_type, "addr")?;
            Ok(builder.build_int_compare(predicate, left, right, "eq")?)
        }
        (left, right) => Err(Error::new(
            ErrorImpl::BinaryOperandError {
                operator: String::from(if predicate == IntPredicate::EQ { "==" } else { "!=" }),
                left: type_name(left),
                right: type_name(right),
            },
            position.clone(),
        )),
    }
}

/// Converts a value to `i8*` text through the runtime helpers.
pub fn to_string_value<'ctx>(
    compiler: &Compiler<'ctx>,
    value: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, Error> {
    let helper = match value {
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => {
            RuntimeFunction::BoolToString
        }
        BasicValueEnum::IntValue(_) => RuntimeFunction::IntToString,
        other => return Ok(other),
    };

    let argument = compiler.widen_to_byte(value)?;
    compiler
        .builder
        .build_call(
            compiler.runtime_function(helper),
            &[argument.into()],
            "to_string",
        )?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| builder_error("string conversion returned no value"))
}

fn gen_concat<'ctx>(
    compiler: &Compiler<'ctx>,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
    position: &Position,
) -> Result<BasicValueEnum<'ctx>, Error> {
    let left = to_string_value(compiler, left)?;
    let right = to_string_value(compiler, right)?;

    if !compiler.is_string(left) || !compiler.is_string(right) {
        return Err(Error::new(
            ErrorImpl::BinaryOperandError {
                operator: String::from("++"),
                left: type_name(left),
                right: type_name(right),
            },
            position.clone(),
        ));
    }

    compiler
        .builder
        .build_call(
            compiler.runtime_function(RuntimeFunction::ConcatStrings),
            &[left.into(), right.into()],
            "concat",
        )?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| builder_error("concat_strings returned no value"))
}
