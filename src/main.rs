use std::{fs, io, path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use inkwell::context::Context;
use techflow::{
    compiler::compiler::compile, display_error, interpreter::interpreter::interpret,
    parse_source, type_checker::type_checker::type_check,
};
use tracing_subscriber::EnvFilter;

/// Compile a TechFlow program to LLVM IR, or run it directly.
#[derive(Parser, Debug)]
#[command(name = "techflow", version, about)]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// Where to write the generated module
    #[arg(short, long, default_value = "output.ll")]
    output: PathBuf,

    /// Write LLVM bitcode instead of textual IR
    #[arg(long, conflicts_with = "interpret")]
    bitcode: bool,

    /// Execute the program with the interpreter instead of compiling it
    #[arg(long)]
    interpret: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // --help and --version land here too and are not failures
            let code = if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = error.print();
            return code;
        }
    };

    if let Ok(filter) = EnvFilter::try_from_env("TECHFLOW_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    run(&cli)
}

fn run(cli: &Cli) -> ExitCode {
    let start = Instant::now();

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: could not read {}: {}", cli.file.display(), error);
            return ExitCode::FAILURE;
        }
    };
    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());

    let program = match parse_source(&source, &file_name) {
        Ok(program) => program,
        Err(error) => {
            display_error(&error, &source, &cli.file);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(elapsed = ?start.elapsed(), "parsed");

    let type_check_start = Instant::now();
    if let Err(errors) = type_check(&program) {
        for error in &errors {
            display_error(error, &source, &cli.file);
        }
        eprintln!("{} error(s) found", errors.len());
        return ExitCode::FAILURE;
    }

    tracing::info!(elapsed = ?type_check_start.elapsed(), "type checked");

    if cli.interpret {
        return match interpret(&program, io::stdout().lock()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                display_error(&error, &source, &cli.file);
                ExitCode::FAILURE
            }
        };
    }

    let compile_start = Instant::now();
    let context = Context::create();
    let compiler = match compile(&program, &context, &file_name) {
        Ok(compiler) => compiler,
        Err(error) => {
            display_error(&error, &source, &cli.file);
            return ExitCode::FAILURE;
        }
    };

    for warning in &compiler.warnings {
        display_error(warning, &source, &cli.file);
    }

    tracing::info!(elapsed = ?compile_start.elapsed(), "compiled");

    let written = if cli.bitcode {
        compiler.write_bitcode(&cli.output)
    } else {
        compiler.write_ir(&cli.output)
    };

    if let Err(error) = written {
        display_error(&error, &source, &cli.file);
        return ExitCode::FAILURE;
    }

    tracing::info!(output = %cli.output.display(), total = ?start.elapsed(), "module written");

    ExitCode::SUCCESS
}
