use inkwell::{
    types::BasicMetadataTypeEnum,
    values::{BasicValueEnum, FunctionValue, IntValue},
    IntPredicate,
};

use crate::{
    ast::{
        ast::{Declaration, Expr},
        statements::{
            Assignment, Conditional, ForLoop, FunctionDefinition, Log, Switch, VarDeclaration,
            WhileLoop,
        },
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::{Binding, Compiler, INTERNAL_FORMAT},
    expr::{build_equality, gen_call, gen_expression, to_string_value},
    runtime::RuntimeFunction,
};

pub fn gen_declaration<'ctx>(
    compiler: &mut Compiler<'ctx>,
    declaration: &Declaration,
) -> Result<(), Error> {
    match declaration {
        Declaration::Variable(decl) => gen_var_declaration(compiler, decl),
        Declaration::Assignment(assignment) => gen_assignment(compiler, assignment),
        Declaration::Function(function) => gen_function(compiler, function),
        Declaration::Conditional(conditional) => gen_conditional(compiler, conditional),
        Declaration::ForLoop(for_loop) => gen_for_loop(compiler, for_loop),
        Declaration::WhileLoop(while_loop) => gen_while_loop(compiler, while_loop),
        Declaration::Switch(switch) => gen_switch(compiler, switch),
        Declaration::Call(call) => gen_call(compiler, call).map(|_| ()),
        Declaration::Log(log) => gen_log(compiler, log),
    }
}

pub fn gen_block<'ctx>(
    compiler: &mut Compiler<'ctx>,
    declarations: &[Declaration],
) -> Result<(), Error> {
    for declaration in declarations {
        gen_declaration(compiler, declaration)?;
    }
    Ok(())
}

fn gen_var_declaration<'ctx>(
    compiler: &mut Compiler<'ctx>,
    decl: &VarDeclaration,
) -> Result<(), Error> {
    let data_type = DataType::from_name(&decl.type_ref.name).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnknownType {
                type_: decl.type_ref.name.clone(),
            },
            decl.type_ref.span.start.clone(),
        )
    })?;

    // The initialiser still sees any outer binding of the same name
    let value = gen_expression(compiler, &decl.value)?;
    let binding = compiler.declare_variable(&decl.name, data_type, &decl.span.start)?;
    compiler.store(&binding, value)?;
    compiler.bindings.bind(&decl.name, binding);

    Ok(())
}

fn gen_assignment<'ctx>(
    compiler: &mut Compiler<'ctx>,
    assignment: &Assignment,
) -> Result<(), Error> {
    let binding = compiler.lookup(&assignment.target, &assignment.span.start)?;
    let value = gen_expression(compiler, &assignment.value)?;
    compiler.store(&binding, value)
}

fn gen_log<'ctx>(compiler: &mut Compiler<'ctx>, log: &Log) -> Result<(), Error> {
    let value = gen_expression(compiler, &log.expression)?;

    let (format, argument) = match value {
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => {
            ("%s\n", to_string_value(compiler, value)?)
        }
        BasicValueEnum::IntValue(_) => ("%d\n", value),
        pointer if compiler.is_string(pointer) => ("%s\n", pointer),
        _ => {
            compiler.warn("logging an array", &log.span.start);
            return Ok(());
        }
    };

    let format = compiler
        .builder
        .build_global_string_ptr(format, INTERNAL_FORMAT)?
        .as_pointer_value();
    compiler.builder.build_call(
        compiler.runtime_function(RuntimeFunction::Printf),
        &[format.into(), argument.into()],
        "",
    )?;

    Ok(())
}

fn gen_function<'ctx>(
    compiler: &mut Compiler<'ctx>,
    function: &FunctionDefinition,
) -> Result<(), Error> {
    let i32_type = compiler.context.i32_type();
    let params: Vec<BasicMetadataTypeEnum<'ctx>> = vec![i32_type.into(); function.params.len()];

    let function_type = match function.return_clause {
        Some(_) => i32_type.fn_type(&params, false),
        None => compiler.context.void_type().fn_type(&params, false),
    };

    tracing::debug!(function = %function.name, "lowering function");

    let function_value = compiler
        .module
        .add_function(&function.name, function_type, None);
    // Visible to its own body and to the rest of the enclosing scope
    compiler.functions.bind(&function.name, function_value);
    let previous_position = compiler.builder.get_insert_block();

    let entry = compiler.context.append_basic_block(function_value, "entry");
    compiler.builder.position_at_end(entry);
    compiler.open_functions.push(function_value);

    let result =
        compiler.with_scope(|compiler| gen_function_body(compiler, function_value, function));

    compiler.open_functions.pop();
    if let Some(block) = previous_position {
        compiler.builder.position_at_end(block);
    }

    result
}

fn gen_function_body<'ctx>(
    compiler: &mut Compiler<'ctx>,
    function_value: FunctionValue<'ctx>,
    function: &FunctionDefinition,
) -> Result<(), Error> {
    let i32_type = compiler.context.i32_type();

    for (param, value) in function.params.iter().zip(function_value.get_params()) {
        value.into_int_value().set_name(&param.name);
        let slot = compiler.create_entry_alloca(i32_type.into(), &param.name)?;
        compiler.builder.build_store(slot, value)?;
        compiler.bindings.bind(
            &param.name,
            Binding {
                pointer: slot,
                data_type: DataType::Byte,
                owner: Some(function_value),
            },
        );
    }

    gen_block(compiler, &function.body)?;

    match &function.return_clause {
        Some(return_clause) => {
            let value = gen_expression(compiler, &return_clause.expression)?;
            let value = compiler.widen_to_byte(value)?;

            let return_block = compiler
                .context
                .append_basic_block(function_value, "return");
            compiler.builder.build_unconditional_branch(return_block)?;
            compiler.builder.position_at_end(return_block);
            compiler.builder.build_return(Some(&value))?;
        }
        None => {
            compiler.builder.build_return(None)?;
        }
    }

    Ok(())
}

fn gen_condition<'ctx>(
    compiler: &mut Compiler<'ctx>,
    condition: &Expr,
) -> Result<IntValue<'ctx>, Error> {
    let value = gen_expression(compiler, condition)?;
    compiler.int_value(value, "bit", &condition.get_span().start)
}

fn gen_conditional<'ctx>(
    compiler: &mut Compiler<'ctx>,
    conditional: &Conditional,
) -> Result<(), Error> {
    let merge_block = compiler.append_block("if.end")?;
    let last_branch = conditional.branches.len().saturating_sub(1);

    for (index, branch) in conditional.branches.iter().enumerate() {
        let condition = gen_condition(compiler, &branch.condition)?;

        let then_block = compiler.append_block("if.then")?;
        let else_block = if index < last_branch || conditional.else_block.is_some() {
            compiler.append_block("if.else")?
        } else {
            merge_block
        };

        compiler
            .builder
            .build_conditional_branch(condition, then_block, else_block)?;

        compiler.builder.position_at_end(then_block);
        compiler.with_scope(|compiler| gen_block(compiler, &branch.body))?;
        compiler.branch_if_unterminated(merge_block)?;

        compiler.builder.position_at_end(else_block);
    }

    if let Some(else_block) = &conditional.else_block {
        compiler.with_scope(|compiler| gen_block(compiler, &else_block.body))?;
        compiler.branch_if_unterminated(merge_block)?;
        compiler.builder.position_at_end(merge_block);
    }

    compiler.move_to_end(merge_block)
}

fn gen_while_loop<'ctx>(
    compiler: &mut Compiler<'ctx>,
    while_loop: &WhileLoop,
) -> Result<(), Error> {
    let condition_block = compiler.append_block("while.cond")?;
    let body_block = compiler.append_block("while.body")?;
    let end_block = compiler.append_block("while.end")?;

    compiler.builder.build_unconditional_branch(condition_block)?;
    compiler.builder.position_at_end(condition_block);
    let condition = gen_condition(compiler, &while_loop.condition)?;
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    compiler.with_scope(|compiler| gen_block(compiler, &while_loop.body))?;
    compiler.branch_if_unterminated(condition_block)?;

    compiler.builder.position_at_end(end_block);
    compiler.move_to_end(end_block)
}

/// Lowers the counted form `loop n as i`.
///
/// The body runs while a hidden counter, starting at 0, is below `n`. The
/// counter is copied into the iterator's slot at the top of each iteration.
fn gen_for_loop<'ctx>(compiler: &mut Compiler<'ctx>, for_loop: &ForLoop) -> Result<(), Error> {
    let bound = match gen_expression(compiler, &for_loop.expression)? {
        BasicValueEnum::IntValue(bound) => compiler.widen_to_byte(bound.into())?.into_int_value(),
        _ => {
            compiler.warn("iterating an array", &for_loop.span.start);
            return Ok(());
        }
    };

    let function = compiler.current_function()?;
    let i32_type = compiler.context.i32_type();

    let counter = compiler.create_entry_alloca(i32_type.into(), "loop.counter")?;
    compiler
        .builder
        .build_store(counter, i32_type.const_zero())?;

    let condition_block = compiler.append_block("loop.cond")?;
    let body_block = compiler.append_block("loop.body")?;
    let end_block = compiler.append_block("loop.end")?;

    compiler.builder.build_unconditional_branch(condition_block)?;
    compiler.builder.position_at_end(condition_block);

    compiler.with_scope(|compiler| {
        let iterator = compiler.create_entry_alloca(i32_type.into(), &for_loop.iterator)?;
        compiler.bindings.bind(
            &for_loop.iterator,
            Binding {
                pointer: iterator,
                data_type: DataType::Byte,
                owner: Some(function),
            },
        );

        let count = compiler
            .builder
            .build_load(counter, "count")?
            .into_int_value();
        compiler.builder.build_store(iterator, count)?;
        let keep_going =
            compiler
                .builder
                .build_int_compare(IntPredicate::SLT, count, bound, "loop.test")?;
        compiler
            .builder
            .build_conditional_branch(keep_going, body_block, end_block)?;

        compiler.builder.position_at_end(body_block);
        gen_block(compiler, &for_loop.body)?;

        if let Some(block) = compiler.builder.get_insert_block() {
            if block.get_terminator().is_none() {
                let count = compiler
                    .builder
                    .build_load(counter, "count")?
                    .into_int_value();
                let next = compiler.builder.build_int_add(
                    count,
                    i32_type.const_int(1, false),
                    "next",
                )?;
                compiler.builder.build_store(counter, next)?;
                compiler.builder.build_unconditional_branch(condition_block)?;
            }
        }

        Ok::<(), Error>(())
    })?;

    compiler.builder.position_at_end(end_block);
    compiler.move_to_end(end_block)
}

/// Lowers `select` as a chain of equality tests joined at `select.end`.
fn gen_switch<'ctx>(compiler: &mut Compiler<'ctx>, switch: &Switch) -> Result<(), Error> {
    let subject = gen_expression(compiler, &switch.subject)?;
    let merge_block = compiler.append_block("select.end")?;

    for case in &switch.cases {
        let value = gen_expression(compiler, &case.value)?;
        let matched = build_equality(
            compiler,
            IntPredicate::EQ,
            subject,
            value,
            &case.span.start,
        )?;

        let body_block = compiler.append_block("select.when")?;
        let next_block = compiler.append_block("select.next")?;
        compiler
            .builder
            .build_conditional_branch(matched, body_block, next_block)?;

        compiler.builder.position_at_end(body_block);
        compiler.with_scope(|compiler| gen_block(compiler, &case.body))?;
        compiler.branch_if_unterminated(merge_block)?;

        compiler.builder.position_at_end(next_block);
    }

    if let Some(otherwise) = &switch.otherwise {
        compiler.with_scope(|compiler| gen_block(compiler, &otherwise.body))?;
    }
    compiler.branch_if_unterminated(merge_block)?;

    compiler.builder.position_at_end(merge_block);
    compiler.move_to_end(merge_block)
}
