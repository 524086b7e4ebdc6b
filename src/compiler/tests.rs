use std::rc::Rc;

use inkwell::{context::Context, execution_engine::ExecutionEngine, OptimizationLevel};

use super::{
    compiler::{compile, Compiler},
    runtime::RuntimeFunction,
};
use crate::{
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::{type_check, RESERVED_NAMES},
};

type UnaryFunction = unsafe extern "C" fn(i32) -> i32;

fn lower<'ctx>(context: &'ctx Context, body: &str) -> Result<Compiler<'ctx>, Error> {
    let source = format!("boot test\n{}\nshutdown test", body);
    let tokens = tokenize(source, Some("test.tf".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.tf".to_string()));
    let program = program.unwrap();
    type_check(&program).unwrap();

    compile(&program, context, "test")
}

fn engine<'ctx>(compiler: &Compiler<'ctx>) -> ExecutionEngine<'ctx> {
    compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap()
}

fn call(engine: &ExecutionEngine, name: &str, argument: i32) -> i32 {
    unsafe {
        let function = engine.get_function::<UnaryFunction>(name).unwrap();
        function.call(argument)
    }
}

#[test]
fn test_empty_program_returns_zero() {
    let context = Context::create();
    let compiler = lower(&context, "").unwrap();

    let ir = compiler.print_ir();
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("ret i32 0"));
    assert!(compiler.warnings.is_empty());
}

#[test]
fn test_conditional_has_single_merge_block() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "byte x = 0\nping true process x = 1 pong process x = 2 ping_end",
    )
    .unwrap();

    let ir = compiler.print_ir();
    assert_eq!(ir.matches("\nif.end:").count(), 1);
    assert_eq!(ir.matches("br label %if.end").count(), 2);
}

#[test]
fn test_conditional_takes_exactly_one_branch() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module pick(c) process byte x = 0\nping c > 0 process x = 1 pong process x = 2 ping_end\nreturn x module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "pick", 1), 1);
    assert_eq!(call(&engine, "pick", 0), 2);
}

#[test]
fn test_elif_chain_falls_through_to_merge() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module sign(n) process byte s = 0\nping n > 0 process s = 1 pong ping n < 0 process s = -1 ping_end\nreturn s module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "sign", 9), 1);
    assert_eq!(call(&engine, "sign", -4), -1);
    assert_eq!(call(&engine, "sign", 0), 0);
}

#[test]
fn test_for_loop_runs_max_n_zero_times() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module count(n) process byte total = 0\nloop n as i process total = total + 1 loop_end\nreturn total module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "count", 5), 5);
    assert_eq!(call(&engine, "count", 0), 0);
    assert_eq!(call(&engine, "count", -3), 0);
}

#[test]
fn test_for_loop_iterator_counts_up_from_zero() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module sum(n) process byte total = 0\nloop n as i process total = total + i loop_end\nreturn total module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "sum", 5), 10);
}

#[test]
fn test_array_loop_is_skipped_with_warning() {
    let context = Context::create();
    let compiler = lower(&context, "array a = [1, 2]\nloop a as i process log i loop_end").unwrap();

    assert!(compiler
        .warnings
        .iter()
        .any(|warning| warning.to_string().contains("iterating an array")));
    assert!(compiler.warnings.iter().all(Error::is_warning));

    let ir = compiler.print_ir();
    assert!(!ir.contains("loop.body"));
    assert!(!ir.contains("@printf"));
}

#[test]
fn test_while_loop() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module fact(n) process byte r = 1\nstream n > 1 process r = r * n\nn = n - 1 stream_end\nreturn r module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "fact", 5), 120);
    assert_eq!(call(&engine, "fact", 1), 1);
}

#[test]
fn test_switch_selects_first_match() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module classify(n) process byte r = 0\nselect n process when 1 process r = 10 when 2 process r = 20 otherwise process r = 99 select_end\nreturn r module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "classify", 1), 10);
    assert_eq!(call(&engine, "classify", 2), 20);
    assert_eq!(call(&engine, "classify", 7), 99);
}

#[test]
fn test_recursive_function() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module fib(n) process byte r = n\nping n > 1 process r = fib(n - 1) + fib(n - 2) ping_end\nreturn r module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "fib", 10), 55);
}

#[test]
fn test_function_has_single_return() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module magnitude(n) process byte r = n\nping n < 0 process r = -n ping_end\nreturn r module_end",
    )
    .unwrap();

    let function = compiler.module.get_function("magnitude").unwrap();
    let returns = function
        .get_basic_blocks()
        .iter()
        .filter(|block| {
            block
                .get_terminator()
                .map(|terminator| terminator.get_opcode() == inkwell::values::InstructionOpcode::Return)
                .unwrap_or(false)
        })
        .count();
    assert_eq!(returns, 1);
    assert_eq!(
        function.get_last_basic_block().unwrap().get_name().to_str(),
        Ok("return")
    );
}

#[test]
fn test_void_function_returns_void() {
    let context = Context::create();
    let compiler = lower(&context, "module hello() process module_end\nhello()").unwrap();

    let ir = compiler.print_ir();
    assert!(ir.contains("define void @hello()"));
    assert!(ir.contains("call void @hello()"));
}

#[test]
fn test_program_level_variables_are_globals() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "byte x = 5\nmodule get() process return x module_end\nmodule local() process byte y = 1\nreturn y module_end",
    )
    .unwrap();

    assert!(compiler.module.get_global("x").is_some());
    assert!(compiler.module.get_global("y").is_none());
    assert!(compiler.print_ir().contains("alloca i32"));
}

#[test]
fn test_globals_are_initialised_in_main() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "byte x = 20 + 22\nmodule get(unused) process return x module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    unsafe {
        let main = engine
            .get_function::<unsafe extern "C" fn() -> i32>("main")
            .unwrap();
        assert_eq!(main.call(), 0);
    }
    assert_eq!(call(&engine, "get", 0), 42);
}

#[test]
fn test_runtime_functions_declared_on_demand() {
    let context = Context::create();
    let plain = lower(&context, "log 1").unwrap().print_ir();

    assert!(plain.contains("declare i32 @printf(i8*, ...)"));
    assert!(!plain.contains("@int_to_string"));
    assert!(!plain.contains("@concat_strings"));

    let concat = lower(&context, "log 1 ++ \"x\"").unwrap().print_ir();
    assert!(concat.contains("@int_to_string"));
    assert!(concat.contains("@concat_strings"));
    assert!(!concat.contains("@bool_to_string"));
}

#[test]
fn test_log_formats_by_value_type() {
    let context = Context::create();
    let ir = lower(&context, "log true\nlog \"s\"\nlog 3").unwrap().print_ir();

    assert!(ir.contains("@bool_to_string"));
    assert!(ir.contains("%s\\0A"));
    assert!(ir.contains("%d\\0A"));
}

#[test]
fn test_string_equality_uses_strcmp() {
    let context = Context::create();
    let ir = lower(
        &context,
        "chip s = \"a\"\nping s == \"a\" process log \"yes\" ping_end",
    )
    .unwrap()
    .print_ir();

    assert!(ir.contains("call i32 @strcmp"));
}

#[test]
fn test_bit_argument_is_widened() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module inc(a) process return a + 1 module_end\nmodule positive(n) process byte r = inc(n > 0)\nreturn r module_end",
    )
    .unwrap();

    assert!(compiler.print_ir().contains("zext i1"));

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "positive", 3), 2);
    assert_eq!(call(&engine, "positive", -3), 1);
}

#[test]
fn test_foreign_local_is_rejected() {
    let context = Context::create();
    let error = lower(
        &context,
        "loop 2 as i process module peek() process log i module_end loop_end",
    )
    .err()
    .unwrap();

    assert_eq!(error.get_error_name(), "ForeignLocal");
}

#[test]
fn test_integer_operators() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module ops(n) process
            byte r = (n + 3) * 2 - n / 2 + n % 3
            ping n >= 1 and n <= 9 or n == 100 process r = r + 1000 ping_end
            return r
        module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "ops", 4), 1013);
    assert_eq!(call(&engine, "ops", 100), 1157);
    assert_eq!(call(&engine, "ops", -4), -1);
}

#[test]
fn test_inner_function_shadows_outer_within_its_block() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "module f() process return 1 module_end
        module g(n) process
            byte r = 0
            ping n > 0 process
                module f() process return 2 module_end
                r = f()
            ping_end
            return r * 10 + f()
        module_end",
    )
    .unwrap();

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "g", 1), 21);
    assert_eq!(call(&engine, "g", 0), 1);
}

#[test]
fn test_user_names_do_not_clash_with_internal_globals() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "log \"a\"
        byte fmt = 2
        module str(n) process return n + 1 module_end
        log str(fmt)",
    )
    .unwrap();

    let ir = compiler.print_ir();
    assert!(ir.contains("@.str ="));
    assert!(ir.contains("@.fmt ="));
    assert!(ir.contains("@fmt = internal global i32 0"));
    assert!(ir.contains("define i32 @str(i32 %n)"));

    let engine = engine(&compiler);
    assert_eq!(call(&engine, "str", 4), 5);
}

#[test]
fn test_function_named_like_a_format_global_is_callable() {
    let context = Context::create();
    let compiler = lower(
        &context,
        "log \"a\"\nmodule fmt() process module_end\nfmt()",
    )
    .unwrap();

    let ir = compiler.print_ir();
    assert!(ir.contains("define void @fmt()"));
    assert!(ir.contains("call void @fmt()"));
}

#[test]
fn test_runtime_function_names_are_reserved() {
    let functions = [
        RuntimeFunction::Printf,
        RuntimeFunction::BoolToString,
        RuntimeFunction::IntToString,
        RuntimeFunction::ConcatStrings,
        RuntimeFunction::StringCompare,
    ];

    for function in functions {
        assert!(RESERVED_NAMES.contains(&function.name()), "{}", function.name());
    }
}

#[test]
fn test_write_ir_and_bitcode() {
    let context = Context::create();
    let compiler = lower(&context, "log 1").unwrap();
    let directory = std::env::temp_dir();
    let ir_path = directory.join(format!("techflow-test-{}.ll", std::process::id()));
    let bc_path = directory.join(format!("techflow-test-{}.bc", std::process::id()));

    compiler.write_ir(&ir_path).unwrap();
    compiler.write_bitcode(&bc_path).unwrap();

    let written = std::fs::read_to_string(&ir_path).unwrap();
    assert!(written.contains("@main"));
    assert!(std::fs::metadata(&bc_path).unwrap().len() > 0);

    std::fs::remove_file(ir_path).unwrap();
    std::fs::remove_file(bc_path).unwrap();
}
