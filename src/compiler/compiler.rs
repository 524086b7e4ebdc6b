//! Main compiler module.
//!
//! This module contains the core Compiler structure and the compilation
//! pipeline from a checked `Program` to an LLVM module. It manages the LLVM
//! context, module and builder, the storage bindings of every visible
//! variable, and target configuration.

use std::path::Path;

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{AnyType, BasicTypeEnum, PointerType},
    values::{BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, OptimizationLevel,
};

use crate::{
    ast::{ast::Program, types::DataType},
    errors::errors::{Error, ErrorImpl},
    symbol_table::symbol_table::ScopeTable,
    type_checker::type_checker::ENTRY_POINT,
    Position,
};

use super::stmt::gen_declaration;

/// Name of the global behind each string literal. No identifier starts with
/// a dot, so user symbols never collide with it.
pub const INTERNAL_STRING: &str = ".str";
/// Name of the global behind each `printf` format string.
pub const INTERNAL_FORMAT: &str = ".fmt";

/// Where a variable lives and what it holds.
///
/// `owner` is the function whose stack frame holds the slot, or `None` for
/// module globals.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'ctx> {
    pub pointer: PointerValue<'ctx>,
    pub data_type: DataType,
    pub owner: Option<FunctionValue<'ctx>>,
}

/// The state of one code generation run.
///
/// # Type Parameters
///
/// * `'ctx` - Lifetime of the LLVM context
pub struct Compiler<'ctx> {
    /// Reference to the LLVM context
    pub context: &'ctx Context,
    /// The LLVM module being built
    pub module: Module<'ctx>,
    /// The LLVM IR builder
    pub builder: Builder<'ctx>,

    /// Storage of every variable visible at the current point of lowering
    pub bindings: ScopeTable<Binding<'ctx>>,
    /// User functions visible at the current point of lowering
    pub functions: ScopeTable<FunctionValue<'ctx>>,
    /// User functions currently being lowered, innermost last
    pub open_functions: Vec<FunctionValue<'ctx>>,
    /// Unsupported constructs that were skipped
    pub warnings: Vec<Error>,
}

impl<'ctx> Compiler<'ctx> {
    /// Creates a new Compiler with an empty module named `module_name`.
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Compiler {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            bindings: ScopeTable::new(),
            functions: ScopeTable::new(),
            open_functions: vec![],
            warnings: vec![],
        }
    }

    /// Sets the module's target triple and data layout to the host's.
    pub fn configure_target(&self) -> Result<(), Error> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|message| target_error(message.to_string()))?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple)
            .map_err(|message| target_error(message.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| target_error(String::from("no target machine for the host")))?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());

        Ok(())
    }

    /// Lowers every declaration of `program` into a synthesized `main`
    /// that returns 0, then verifies the module.
    fn compile_program(&mut self, program: &Program) -> Result<(), Error> {
        let i32_type = self.context.i32_type();
        let main = self
            .module
            .add_function(ENTRY_POINT, i32_type.fn_type(&[], false), None);
        let entry = self.context.append_basic_block(main, "entry");
        self.builder.position_at_end(entry);

        for declaration in &program.declarations {
            gen_declaration(self, declaration)?;
        }

        self.builder.build_return(Some(&i32_type.const_zero()))?;

        self.verify()
    }

    /// Runs the LLVM verifier over the whole module.
    pub fn verify(&self) -> Result<(), Error> {
        self.module.verify().map_err(|message| {
            Error::new(
                ErrorImpl::VerificationFailed {
                    message: message.to_string(),
                },
                Position::null(),
            )
        })
    }

    /// The textual IR of the module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Writes the module as textual IR.
    pub fn write_ir(&self, output_file: &Path) -> Result<(), Error> {
        self.module
            .print_to_file(output_file)
            .map_err(|message| output_error(output_file, message.to_string()))
    }

    /// Writes the module as LLVM bitcode.
    pub fn write_bitcode(&self, output_file: &Path) -> Result<(), Error> {
        if self.module.write_bitcode_to_path(output_file) {
            Ok(())
        } else {
            Err(output_error(
                output_file,
                String::from("bitcode writer failed"),
            ))
        }
    }

    /// Whether a user function is being lowered.
    pub fn has_open_function(&self) -> bool {
        !self.open_functions.is_empty()
    }

    /// The function that owns the builder's insertion block.
    pub fn current_function(&self) -> Result<FunctionValue<'ctx>, Error> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or_else(|| builder_error("builder is not positioned inside a function"))
    }

    /// Appends a basic block to the current function.
    pub fn append_block(&self, name: &str) -> Result<BasicBlock<'ctx>, Error> {
        Ok(self
            .context
            .append_basic_block(self.current_function()?, name))
    }

    /// Moves `block` behind the last block of the current function.
    pub fn move_to_end(&self, block: BasicBlock<'ctx>) -> Result<(), Error> {
        let function = self.current_function()?;
        match function.get_last_basic_block() {
            Some(last) if last != block => block
                .move_after(last)
                .map_err(|_| builder_error("could not reorder basic blocks")),
            _ => Ok(()),
        }
    }

    /// Branches to `target` unless the insertion block already ends in a
    /// terminator.
    pub fn branch_if_unterminated(&self, target: BasicBlock<'ctx>) -> Result<(), Error> {
        if let Some(block) = self.builder.get_insert_block() {
            if block.get_terminator().is_none() {
                self.builder.build_unconditional_branch(target)?;
            }
        }
        Ok(())
    }

    /// Runs `lower` one binding scope deeper. The scope is left on every path.
    pub fn with_scope<R>(&mut self, lower: impl FnOnce(&mut Self) -> R) -> R {
        self.bindings.enter_scope();
        self.functions.enter_scope();
        let result = lower(self);
        self.functions.leave_scope();
        self.bindings.leave_scope();
        result
    }

    /// Builds an alloca in the entry block of the current function.
    pub fn create_entry_alloca(
        &self,
        type_: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>, Error> {
        let function = self.current_function()?;
        let entry = function
            .get_first_basic_block()
            .ok_or_else(|| builder_error("function has no entry block"))?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(type_, name)?)
    }

    /// Allocates storage for a new variable.
    ///
    /// Inside a user function this is a stack slot of that function. With no
    /// user function open it is a zero-initialized module global.
    pub fn declare_variable(
        &self,
        name: &str,
        data_type: DataType,
        position: &Position,
    ) -> Result<Binding<'ctx>, Error> {
        let type_ = self.basic_type(data_type, position)?;

        if self.has_open_function() {
            let pointer = self.create_entry_alloca(type_, name)?;
            return Ok(Binding {
                pointer,
                data_type,
                owner: Some(self.current_function()?),
            });
        }

        let global = self.module.add_global(type_, None, name);
        global.set_linkage(Linkage::Internal);
        global.set_initializer(&self.zero_value(data_type, position)?);

        Ok(Binding {
            pointer: global.as_pointer_value(),
            data_type,
            owner: None,
        })
    }

    /// Resolves a variable, rejecting stack slots of other functions.
    pub fn lookup(&self, name: &str, position: &Position) -> Result<Binding<'ctx>, Error> {
        let binding = *self.bindings.lookup(name).ok_or_else(|| {
            Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: String::from(name),
                },
                position.clone(),
            )
        })?;

        if let Some(owner) = binding.owner {
            if Some(owner) != self.builder.get_insert_block().and_then(|b| b.get_parent()) {
                return Err(Error::new(
                    ErrorImpl::ForeignLocal {
                        variable: String::from(name),
                    },
                    position.clone(),
                ));
            }
        }

        Ok(binding)
    }

    /// Resolves a call target by lexical scope.
    ///
    /// The LLVM symbol may carry a suffix when an outer function of the same
    /// name exists, so calls never go through the module's symbol table.
    pub fn lookup_function(
        &self,
        name: &str,
        position: &Position,
    ) -> Result<FunctionValue<'ctx>, Error> {
        self.functions.lookup(name).copied().ok_or_else(|| {
            Error::new(
                ErrorImpl::FunctionNotDeclared {
                    function: String::from(name),
                },
                position.clone(),
            )
        })
    }

    /// Stores `value` into a binding, widening a bit stored into a byte slot.
    pub fn store(&self, binding: &Binding<'ctx>, value: BasicValueEnum<'ctx>) -> Result<(), Error> {
        let value = if binding.data_type == DataType::Byte {
            self.widen_to_byte(value)?
        } else {
            value
        };
        self.builder.build_store(binding.pointer, value)?;
        Ok(())
    }

    /// Zero-extends an `i1` to `i32`. Other values pass through.
    pub fn widen_to_byte(&self, value: BasicValueEnum<'ctx>) -> Result<BasicValueEnum<'ctx>, Error> {
        match value {
            BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => Ok(self
                .builder
                .build_int_z_extend(int, self.context.i32_type(), "widen")?
                .into()),
            other => Ok(other),
        }
    }

    /// Records a skipped, unimplemented construct.
    pub fn warn(&mut self, feature: &str, position: &Position) {
        tracing::warn!(feature, offset = position.0, "unsupported construct skipped");
        self.warnings.push(Error::new(
            ErrorImpl::Unsupported {
                feature: String::from(feature),
            },
            position.clone(),
        ));
    }

    /// Whether `value` is `i8*` text.
    pub fn is_string(&self, value: BasicValueEnum<'ctx>) -> bool {
        matches!(value, BasicValueEnum::PointerValue(pointer) if pointer.get_type() == self.string_type())
    }

    pub fn string_type(&self) -> PointerType<'ctx> {
        self.context.i8_type().ptr_type(AddressSpace::default())
    }

    pub fn array_type(&self) -> PointerType<'ctx> {
        self.context.i32_type().ptr_type(AddressSpace::default())
    }

    /// Converts a language type to its LLVM storage type.
    ///
    /// `byte` is `i32`, `bit` is `i1`, `chip` is `i8*` and `array` is `i32*`.
    pub fn basic_type(
        &self,
        data_type: DataType,
        position: &Position,
    ) -> Result<BasicTypeEnum<'ctx>, Error> {
        match data_type {
            DataType::Byte => Ok(self.context.i32_type().into()),
            DataType::Bit => Ok(self.context.bool_type().into()),
            DataType::Chip => Ok(self.string_type().into()),
            DataType::Array => Ok(self.array_type().into()),
            DataType::Void => Err(Error::new(
                ErrorImpl::VoidValue {
                    context: String::from("store"),
                },
                position.clone(),
            )),
        }
    }

    fn zero_value(
        &self,
        data_type: DataType,
        position: &Position,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        match data_type {
            DataType::Byte => Ok(self.context.i32_type().const_zero().into()),
            DataType::Bit => Ok(self.context.bool_type().const_zero().into()),
            DataType::Chip => Ok(self.string_type().const_null().into()),
            DataType::Array => Ok(self.array_type().const_null().into()),
            DataType::Void => Err(Error::new(
                ErrorImpl::VoidValue {
                    context: String::from("store"),
                },
                position.clone(),
            )),
        }
    }

    /// Extracts an integer value or reports what was found instead.
    pub fn int_value(
        &self,
        value: BasicValueEnum<'ctx>,
        expected: &str,
        position: &Position,
    ) -> Result<IntValue<'ctx>, Error> {
        match value {
            BasicValueEnum::IntValue(int) => Ok(int),
            other => Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: String::from(expected),
                    received: type_name(other),
                },
                position.clone(),
            )),
        }
    }
}

/// The LLVM spelling of a value's type, for diagnostics.
pub fn type_name(value: BasicValueEnum) -> String {
    value.get_type().print_to_string().to_string()
}

pub(crate) fn builder_error(message: &str) -> Error {
    Error::new(
        ErrorImpl::BuilderError {
            message: String::from(message),
        },
        Position::null(),
    )
}

fn target_error(message: String) -> Error {
    Error::new(ErrorImpl::TargetError { message }, Position::null())
}

fn output_error(output_file: &Path, message: String) -> Error {
    Error::new(
        ErrorImpl::OutputError {
            message: format!("{}: {}", output_file.display(), message),
        },
        Position::null(),
    )
}

/// Lowers a type checked program into a verified LLVM module.
///
/// # Arguments
///
/// * `program` - The program root, already accepted by the type checker
/// * `context` - Reference to the LLVM context
/// * `module_name` - Name of the generated module
///
/// # Returns
///
/// The Compiler holding the module and any warnings, or the first fatal
/// lowering error.
#[tracing::instrument(skip_all, fields(program = %program.name))]
pub fn compile<'ctx>(
    program: &Program,
    context: &'ctx Context,
    module_name: &str,
) -> Result<Compiler<'ctx>, Error> {
    let mut compiler = Compiler::new(context, module_name);

    compiler.configure_target()?;
    compiler.compile_program(program)?;

    tracing::debug!(warnings = compiler.warnings.len(), "code generation finished");

    Ok(compiler)
}
