use crate::{
    ast::{
        ast::{Declaration, Expr, Program},
        expressions::{BinaryExpr, FunctionCall, OperatorClass, UnaryExpr, UnaryOperator},
        statements::{
            Assignment, Conditional, ForLoop, FunctionDefinition, Log, Switch, VarDeclaration,
            WhileLoop,
        },
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    symbol_table::symbol_table::{SymbolKind, SymbolTable},
    Position,
};

/// The name the code generator gives the program entry point.
pub const ENTRY_POINT: &str = "main";

/// Module-level symbols every compiled program may define or link against.
/// Functions and variables cannot take these names.
pub const RESERVED_NAMES: [&str; 6] = [
    ENTRY_POINT,
    "printf",
    "bool_to_string",
    "int_to_string",
    "concat_strings",
    "strcmp",
];

/// First pass: validates a `Program` against the type lattice.
///
/// Sibling declarations are always all visited, so one run collects every
/// diagnostic in `errors`. Inside a single expression the first failure
/// aborts that expression.
pub struct TypeChecker {
    pub symbols: SymbolTable,
    pub errors: Vec<Error>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            symbols: SymbolTable::new(),
            errors: vec![],
        }
    }

    pub fn check_program(&mut self, program: &Program) -> bool {
        self.check_declarations(&program.declarations)
    }

    pub fn check_declarations(&mut self, declarations: &[Declaration]) -> bool {
        let mut result = true;
        for declaration in declarations {
            result &= self.check_declaration(declaration);
        }
        result
    }

    fn check_declaration(&mut self, declaration: &Declaration) -> bool {
        match declaration {
            Declaration::Variable(decl) => {
                let result = self.check_var_declaration(decl);
                self.record(result)
            }
            Declaration::Assignment(assignment) => {
                let result = self.check_assignment(assignment);
                self.record(result)
            }
            Declaration::Function(function) => self.check_function_definition(function),
            Declaration::Conditional(conditional) => self.check_conditional(conditional),
            Declaration::ForLoop(for_loop) => self.check_for_loop(for_loop),
            Declaration::WhileLoop(while_loop) => self.check_while_loop(while_loop),
            Declaration::Switch(switch) => self.check_switch(switch),
            Declaration::Call(call) => {
                let result = self.check_function_call(call).map(|_| ());
                self.record(result)
            }
            Declaration::Log(log) => {
                let result = self.check_log(log);
                self.record(result)
            }
        }
    }

    fn record(&mut self, result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                self.report(error);
                false
            }
        }
    }

    fn report(&mut self, error: Error) {
        tracing::error!(
            error = %error,
            offset = error.get_position().0,
            "type check failed"
        );
        self.errors.push(error);
    }

    /// Runs `check` one scope deeper. The scope is left on every path.
    fn with_scope<R>(&mut self, check: impl FnOnce(&mut Self) -> R) -> R {
        self.symbols.enter_scope();
        let result = check(self);
        self.symbols.leave_scope();
        result
    }

    pub fn check_var_declaration(&mut self, decl: &VarDeclaration) -> Result<(), Error> {
        let declared = DataType::from_name(&decl.type_ref.name).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownType {
                    type_: decl.type_ref.name.clone(),
                },
                decl.type_ref.span.start.clone(),
            )
        })?;

        let value = self.check_expression(&decl.value)?;
        if !declared.accepts(value) {
            return Err(type_mismatch(
                declared,
                value,
                decl.value.get_span().start.clone(),
            ));
        }

        check_reserved(&decl.name, &decl.span.start)?;

        if !self.symbols.insert(&decl.name, SymbolKind::Variable, declared) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: decl.name.clone(),
                },
                decl.span.start.clone(),
            ));
        }

        Ok(())
    }

    pub fn check_assignment(&mut self, assignment: &Assignment) -> Result<(), Error> {
        let (kind, target) = match self.symbols.lookup(&assignment.target) {
            Some(symbol) => (symbol.kind, symbol.data_type),
            None => {
                return Err(Error::new(
                    ErrorImpl::VariableNotDeclared {
                        variable: assignment.target.clone(),
                    },
                    assignment.span.start.clone(),
                ))
            }
        };

        if kind == SymbolKind::Function {
            return Err(Error::new(
                ErrorImpl::NotAValue {
                    name: assignment.target.clone(),
                },
                assignment.span.start.clone(),
            ));
        }

        let value = self.check_expression(&assignment.value)?;
        if !target.accepts(value) {
            return Err(type_mismatch(
                target,
                value,
                assignment.value.get_span().start.clone(),
            ));
        }

        Ok(())
    }

    pub fn check_function_definition(&mut self, function: &FunctionDefinition) -> bool {
        if let Err(error) = check_reserved(&function.name, &function.span.start) {
            self.report(error);
            return false;
        }

        let param_types = vec![DataType::Byte; function.params.len()];
        let return_type = if function.return_clause.is_some() {
            DataType::Byte
        } else {
            DataType::Void
        };

        // Registered before the body so the function can call itself
        if !self
            .symbols
            .insert_function(&function.name, param_types, return_type)
        {
            self.report(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: function.name.clone(),
                },
                function.span.start.clone(),
            ));
            return false;
        }

        tracing::debug!(function = %function.name, arity = function.params.len(), "checking function");

        self.with_scope(|checker| {
            for param in &function.params {
                if !checker
                    .symbols
                    .insert(&param.name, SymbolKind::Parameter, DataType::Byte)
                {
                    checker.report(Error::new(
                        ErrorImpl::ParameterAlreadyDeclared {
                            parameter: param.name.clone(),
                            function: function.name.clone(),
                        },
                        param.span.start.clone(),
                    ));
                    return false;
                }
            }

            let mut result = checker.check_declarations(&function.body);

            if let Some(return_clause) = &function.return_clause {
                let returned = checker
                    .check_expression(&return_clause.expression)
                    .and_then(|received| {
                        if received == return_type {
                            Ok(())
                        } else {
                            Err(Error::new(
                                ErrorImpl::ReturnTypeMatchError {
                                    function: function.name.clone(),
                                    expected: return_type.to_string(),
                                    received: received.to_string(),
                                },
                                return_clause.span.start.clone(),
                            ))
                        }
                    });
                result &= checker.record(returned);
            }

            result
        })
    }

    fn check_condition(&mut self, condition: &Expr, construct: &str) -> Result<(), Error> {
        let received = self.check_expression(condition)?;
        if received != DataType::Bit {
            return Err(Error::new(
                ErrorImpl::ConditionTypeError {
                    construct: String::from(construct),
                    received: received.to_string(),
                },
                condition.get_span().start.clone(),
            ));
        }
        Ok(())
    }

    pub fn check_conditional(&mut self, conditional: &Conditional) -> bool {
        let mut result = true;

        for branch in &conditional.branches {
            let condition = self.check_condition(&branch.condition, "ping");
            result &= self.record(condition);
            result &= self.with_scope(|checker| checker.check_declarations(&branch.body));
        }

        if let Some(else_block) = &conditional.else_block {
            result &= self.with_scope(|checker| checker.check_declarations(&else_block.body));
        }

        result
    }

    pub fn check_for_loop(&mut self, for_loop: &ForLoop) -> bool {
        let iterated = self.check_expression(&for_loop.expression).and_then(|received| {
            match received {
                DataType::Byte | DataType::Array => Ok(()),
                other => Err(Error::new(
                    ErrorImpl::IterationTypeError {
                        received: other.to_string(),
                    },
                    for_loop.expression.get_span().start.clone(),
                )),
            }
        });
        let mut result = self.record(iterated);

        result &= self.with_scope(|checker| {
            // Fresh scope, so this cannot collide
            checker
                .symbols
                .insert(&for_loop.iterator, SymbolKind::Variable, DataType::Byte);
            checker.check_declarations(&for_loop.body)
        });

        result
    }

    pub fn check_while_loop(&mut self, while_loop: &WhileLoop) -> bool {
        let condition = self.check_condition(&while_loop.condition, "stream");
        let mut result = self.record(condition);
        result &= self.with_scope(|checker| checker.check_declarations(&while_loop.body));
        result
    }

    pub fn check_switch(&mut self, switch: &Switch) -> bool {
        let subject = self.check_expression(&switch.subject).and_then(|received| {
            match received {
                DataType::Byte | DataType::Bit | DataType::Chip => Ok(received),
                other => Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: String::from("byte, bit or chip"),
                        received: other.to_string(),
                    },
                    switch.subject.get_span().start.clone(),
                )),
            }
        });

        let (mut result, subject_type) = match subject {
            Ok(subject_type) => (true, Some(subject_type)),
            Err(error) => {
                self.report(error);
                (false, None)
            }
        };

        for case in &switch.cases {
            let value = self.check_expression(&case.value).and_then(|received| {
                match subject_type {
                    Some(expected) if expected != received => Err(type_mismatch(
                        expected,
                        received,
                        case.value.get_span().start.clone(),
                    )),
                    _ => Ok(()),
                }
            });
            result &= self.record(value);
            result &= self.with_scope(|checker| checker.check_declarations(&case.body));
        }

        if let Some(otherwise) = &switch.otherwise {
            result &= self.with_scope(|checker| checker.check_declarations(&otherwise.body));
        }

        result
    }

    pub fn check_log(&mut self, log: &Log) -> Result<(), Error> {
        let value = self.check_expression(&log.expression)?;
        if value == DataType::Void {
            return Err(Error::new(
                ErrorImpl::VoidValue {
                    context: String::from("log"),
                },
                log.expression.get_span().start.clone(),
            ));
        }
        Ok(())
    }

    /// Checks a call and returns the callee's return type.
    pub fn check_function_call(&mut self, call: &FunctionCall) -> Result<DataType, Error> {
        let signature = self
            .symbols
            .lookup(&call.name)
            .filter(|symbol| symbol.kind == SymbolKind::Function)
            .and_then(|symbol| symbol.signature.clone())
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::FunctionNotDeclared {
                        function: call.name.clone(),
                    },
                    call.span.start.clone(),
                )
            })?;

        let mut argument_types = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            argument_types.push(self.check_expression(argument)?);
        }

        let expected = signature.param_types.len();
        let received = argument_types.len();
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

        for ((argument, received), expected) in call
            .arguments
            .iter()
            .zip(argument_types)
            .zip(&signature.param_types)
        {
            if !expected.accepts(received) {
                return Err(Error::new(
                    ErrorImpl::ArgumentTypeMatchError {
                        expected: expected.to_string(),
                        received: received.to_string(),
                    },
                    argument.get_span().start.clone(),
                ));
            }
        }

        Ok(signature.return_type)
    }

    pub fn check_expression(&mut self, expr: &Expr) -> Result<DataType, Error> {
        match expr {
            Expr::Number(_) => Ok(DataType::Byte),
            Expr::String(_) => Ok(DataType::Chip),
            Expr::Boolean(_) => Ok(DataType::Bit),
            Expr::Array(array) => {
                for element in &array.elements {
                    self.check_expression(element)?;
                }
                Ok(DataType::Array)
            }
            Expr::Identifier(identifier) => match self.symbols.lookup(&identifier.name) {
                Some(symbol) if symbol.kind == SymbolKind::Function => Err(Error::new(
                    ErrorImpl::NotAValue {
                        name: identifier.name.clone(),
                    },
                    identifier.span.start.clone(),
                )),
                Some(symbol) => Ok(symbol.data_type),
                None => Err(Error::new(
                    ErrorImpl::VariableNotDeclared {
                        variable: identifier.name.clone(),
                    },
                    identifier.span.start.clone(),
                )),
            },
            Expr::Call(call) => self.check_function_call(call),
            Expr::Binary(binary) => self.check_binary(binary),
            Expr::Unary(unary) => self.check_unary(unary),
        }
    }

    fn check_binary(&mut self, binary: &BinaryExpr) -> Result<DataType, Error> {
        let left = self.check_expression(&binary.left)?;
        let right = self.check_expression(&binary.right)?;

        let result = match binary.operator.class() {
            OperatorClass::Arithmetic => {
                (left == DataType::Byte && right == DataType::Byte).then_some(DataType::Byte)
            }
            OperatorClass::Equality => {
                (left == right && left != DataType::Void).then_some(DataType::Bit)
            }
            OperatorClass::Ordering => {
                (left == DataType::Byte && right == DataType::Byte).then_some(DataType::Bit)
            }
            OperatorClass::Logical => {
                (left == DataType::Bit && right == DataType::Bit).then_some(DataType::Bit)
            }
            OperatorClass::Concat => {
                (is_stringable(left) && is_stringable(right)).then_some(DataType::Chip)
            }
        };

        result.ok_or_else(|| {
            Error::new(
                ErrorImpl::BinaryOperandError {
                    operator: binary.operator.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                },
                binary.span.start.clone(),
            )
        })
    }

    fn check_unary(&mut self, unary: &UnaryExpr) -> Result<DataType, Error> {
        let operand = self.check_expression(&unary.operand)?;

        let expected = match unary.operator {
            UnaryOperator::Negate | UnaryOperator::Plus => DataType::Byte,
            UnaryOperator::Not => DataType::Bit,
        };

        if operand != expected {
            return Err(Error::new(
                ErrorImpl::UnaryOperandError {
                    operator: unary.operator.to_string(),
                    operand: operand.to_string(),
                },
                unary.span.start.clone(),
            ));
        }

        Ok(expected)
    }
}

/// Types that concatenation converts to text.
fn check_reserved(name: &str, position: &Position) -> Result<(), Error> {
    if RESERVED_NAMES.contains(&name) {
        return Err(Error::new(
            ErrorImpl::ReservedName {
                name: String::from(name),
            },
            position.clone(),
        ));
    }
    Ok(())
}

fn is_stringable(data_type: DataType) -> bool {
    matches!(data_type, DataType::Byte | DataType::Bit | DataType::Chip)
}

fn type_mismatch(expected: DataType, received: DataType, position: Position) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        position,
    )
}

/// Type checks a whole program.
///
/// Returns the checker (its symbol table holds the program-level symbols)
/// or every error found.
#[tracing::instrument(skip_all, fields(program = %program.name))]
pub fn type_check(program: &Program) -> Result<TypeChecker, Vec<Error>> {
    let mut checker = TypeChecker::new();

    if checker.check_program(program) {
        tracing::debug!("type check passed");
        Ok(checker)
    } else {
        Err(std::mem::take(&mut checker.errors))
    }
}
