//! Integration tests for end-to-end compilation.
//!
//! These tests run complete programs through tokenization, parsing, type
//! checking and then either LLVM IR generation or the interpreter.

use inkwell::{context::Context, OptimizationLevel};
use techflow::{
    compiler::compiler::compile, interpreter::interpreter::interpret, parse_source,
    type_checker::type_checker::type_check,
};

const DEMO: &str = r#"
boot demo
    // running totals
    byte total = 0
    chip label = "sum"

    module square(n) process
        return n * n
    module_end

    loop 4 as i process
        total = total + square(i)
    loop_end

    ping total > 10 process
        log label ++ "=" ++ total
    pong process
        log "small"
    ping_end

    select total % 3 process
        when 0 process log "divisible"
        otherwise process log "remainder"
    select_end
shutdown demo
"#;

fn run_interpreter(source: &str) -> String {
    let program = parse_source(source, "test.tf").unwrap();
    type_check(&program).unwrap();

    let mut out = Vec::new();
    interpret(&program, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_interpret_demo_program() {
    assert_eq!(run_interpreter(DEMO), "sum=14\nremainder\n");
}

#[test]
fn test_compile_demo_program() {
    let program = parse_source(DEMO, "demo.tf").unwrap();
    type_check(&program).unwrap();

    let context = Context::create();
    let compiler = compile(&program, &context, "demo.tf").unwrap();

    let ir = compiler.print_ir();
    assert!(ir.contains("define i32 @square(i32 %n)"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("@concat_strings"));
    assert!(ir.contains("@int_to_string"));
    assert!(compiler.warnings.is_empty());
}

#[test]
fn test_concat_coerces_integer() {
    let source = "boot t log 1 ++ \"x\" shutdown t";
    assert_eq!(run_interpreter(source), "1x\n");

    let program = parse_source(source, "test.tf").unwrap();
    let context = Context::create();
    let ir = compile(&program, &context, "test").unwrap().print_ir();

    let to_string = ir.find("call i8* @int_to_string(i32 1)").unwrap();
    let concat = ir.find("call i8* @concat_strings").unwrap();
    assert!(to_string < concat);
}

#[test]
fn test_jit_matches_interpreter() {
    let source = "boot t
        module collatz(n) process
            byte steps = 0
            stream n != 1 process
                ping n % 2 == 0 process n = n / 2 pong process n = 3 * n + 1 ping_end
                steps = steps + 1
            stream_end
            return steps
        module_end
        log collatz(27)
    shutdown t";

    assert_eq!(run_interpreter(source), "111\n");

    let program = parse_source(source, "test.tf").unwrap();
    type_check(&program).unwrap();
    let context = Context::create();
    let compiler = compile(&program, &context, "test").unwrap();

    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();
    let steps = unsafe {
        engine
            .get_function::<unsafe extern "C" fn(i32) -> i32>("collatz")
            .unwrap()
            .call(27)
    };
    assert_eq!(steps, 111);
}

#[test]
fn test_backends_agree_on_shadowed_names() {
    let source = "boot t
        byte base = 1
        module f() process return base module_end
        module g(n) process
            byte r = 0
            ping n > 0 process
                module f() process return 2 module_end
                r = f()
            ping_end
            return r * 10 + f()
        module_end
        ping true process
            byte base = 5
            log g(1)
            log g(0)
        ping_end
    shutdown t";

    assert_eq!(run_interpreter(source), "21\n1\n");

    let program = parse_source(source, "test.tf").unwrap();
    type_check(&program).unwrap();
    let context = Context::create();
    let compiler = compile(&program, &context, "test").unwrap();

    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();
    unsafe {
        // main stores the program-level initialisers
        let main = engine
            .get_function::<unsafe extern "C" fn() -> i32>("main")
            .unwrap();
        assert_eq!(main.call(), 0);

        let g = engine
            .get_function::<unsafe extern "C" fn(i32) -> i32>("g")
            .unwrap();
        assert_eq!(g.call(1), 21);
        assert_eq!(g.call(0), 1);
    }
}

#[test]
fn test_type_errors_are_all_reported() {
    let program = parse_source(
        "boot t
            byte a = \"text\"
            log missing
            module f(x) process return x module_end
            byte b = f(1, 2)
            ping 1 process ping_end
        shutdown t",
        "test.tf",
    )
    .unwrap();

    let errors = type_check(&program).err().unwrap();
    let names: Vec<&str> = errors.iter().map(|error| error.get_error_name()).collect();
    assert_eq!(
        names,
        vec![
            "TypeMatchError",
            "VariableNotDeclared",
            "UnexpectedArguments",
            "ConditionTypeError"
        ]
    );
}

#[test]
fn test_syntax_error_stops_pipeline() {
    let error = parse_source("boot t byte = 1 shutdown t", "test.tf").unwrap_err();
    assert_eq!(error.get_position().1.as_str(), "test.tf");
}
