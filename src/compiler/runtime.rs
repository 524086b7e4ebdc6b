//! Runtime support functions called by generated code.
//!
//! These are external symbols supplied at link time. Each is declared in
//! the module the first time generated code needs it.

use inkwell::{context::Context, module::Linkage, types::FunctionType, values::FunctionValue, AddressSpace};

use super::compiler::Compiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFunction {
    /// `i32 printf(i8*, ...)`
    Printf,
    /// `i8* bool_to_string(i32)`, returns "true" or "false"
    BoolToString,
    /// `i8* int_to_string(i32)`
    IntToString,
    /// `i8* concat_strings(i8*, i8*)`
    ConcatStrings,
    /// `i32 strcmp(i8*, i8*)`
    StringCompare,
}

impl RuntimeFunction {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeFunction::Printf => "printf",
            RuntimeFunction::BoolToString => "bool_to_string",
            RuntimeFunction::IntToString => "int_to_string",
            RuntimeFunction::ConcatStrings => "concat_strings",
            RuntimeFunction::StringCompare => "strcmp",
        }
    }

    fn signature<'ctx>(&self, context: &'ctx Context) -> FunctionType<'ctx> {
        let i32_type = context.i32_type();
        let string_type = context.i8_type().ptr_type(AddressSpace::default());

        match self {
            RuntimeFunction::Printf => i32_type.fn_type(&[string_type.into()], true),
            RuntimeFunction::BoolToString | RuntimeFunction::IntToString => {
                string_type.fn_type(&[i32_type.into()], false)
            }
            RuntimeFunction::ConcatStrings => {
                string_type.fn_type(&[string_type.into(), string_type.into()], false)
            }
            RuntimeFunction::StringCompare => {
                i32_type.fn_type(&[string_type.into(), string_type.into()], false)
            }
        }
    }
}

impl<'ctx> Compiler<'ctx> {
    /// Returns the declaration of `function`, adding it on first use.
    pub fn runtime_function(&self, function: RuntimeFunction) -> FunctionValue<'ctx> {
        if let Some(declared) = self.module.get_function(function.name()) {
            return declared;
        }

        tracing::debug!(function = function.name(), "declaring runtime function");
        self.module.add_function(
            function.name(),
            function.signature(self.context),
            Some(Linkage::External),
        )
    }
}
