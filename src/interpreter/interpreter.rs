use std::io::Write;

use crate::{
    ast::{
        ast::{Declaration, Expr, Program},
        expressions::{BinaryExpr, BinaryOperator, FunctionCall, UnaryExpr, UnaryOperator},
        statements::{Conditional, ForLoop, FunctionDefinition, Switch, WhileLoop},
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    symbol_table::symbol_table::{Mark, ScopeTable},
    Position,
};

use super::value::Value;

/// The table that was current where a function was defined, as it stood
/// at that moment.
#[derive(Clone, Copy)]
struct Environment {
    /// Index into `frames`, or `None` for the program-level table
    frame: Option<usize>,
    mark: Mark,
}

#[derive(Clone, Copy)]
struct Closure<'a> {
    definition: &'a FunctionDefinition,
    environment: Environment,
}

#[derive(Clone)]
enum Binding<'a> {
    Value(Value),
    Function(Closure<'a>),
}

struct Frame<'a> {
    table: ScopeTable<Binding<'a>>,
    parent: Environment,
}

/// Tree-walking evaluator over a type checked program.
///
/// Program-level bindings live in `globals`. Every call pushes a fresh
/// frame whose free names resolve where the callee was defined, never in
/// the caller.
pub struct Interpreter<'a, W: Write> {
    out: W,
    globals: ScopeTable<Binding<'a>>,
    frames: Vec<Frame<'a>>,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(out: W) -> Self {
        Interpreter {
            out,
            globals: ScopeTable::new(),
            frames: vec![],
        }
    }

    pub fn run(&mut self, program: &'a Program) -> Result<(), Error> {
        self.execute_block(&program.declarations)
    }

    /// Gives back the output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    fn scope(&mut self) -> &mut ScopeTable<Binding<'a>> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.table,
            None => &mut self.globals,
        }
    }

    fn with_scope<R>(&mut self, run: impl FnOnce(&mut Self) -> R) -> R {
        self.scope().enter_scope();
        let result = run(self);
        self.scope().leave_scope();
        result
    }

    fn environment(&self) -> Environment {
        match self.frames.last() {
            Some(frame) => Environment {
                frame: Some(self.frames.len() - 1),
                mark: frame.table.mark(),
            },
            None => Environment {
                frame: None,
                mark: self.globals.mark(),
            },
        }
    }

    fn table(&self, frame: Option<usize>) -> Option<&ScopeTable<Binding<'a>>> {
        match frame {
            Some(index) => self.frames.get(index).map(|frame| &frame.table),
            None => Some(&self.globals),
        }
    }

    /// Finds the table `name` resolves in and the view to search it with.
    ///
    /// The innermost table is searched whole. Past a call frame the search
    /// moves to the callee's defining environment, restricted to what it
    /// held when the callee was defined.
    fn resolve(&self, name: &str) -> Option<(Option<usize>, Option<Mark>)> {
        let mut frame = self.frames.len().checked_sub(1);
        let mut mark = None;

        loop {
            let table = self.table(frame)?;
            let found = match mark {
                Some(mark) => table.lookup_at(name, mark),
                None => table.lookup(name),
            };
            if found.is_some() {
                return Some((frame, mark));
            }

            let parent = self.frames.get(frame?)?.parent;
            frame = parent.frame;
            mark = Some(parent.mark);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding<'a>> {
        let (frame, mark) = self.resolve(name)?;
        let table = self.table(frame)?;
        match mark {
            Some(mark) => table.lookup_at(name, mark),
            None => table.lookup(name),
        }
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding<'a>> {
        let (frame, mark) = self.resolve(name)?;
        let table = match frame {
            Some(index) => &mut self.frames.get_mut(index)?.table,
            None => &mut self.globals,
        };
        match mark {
            Some(mark) => table.lookup_at_mut(name, mark),
            None => table.lookup_mut(name),
        }
    }

    fn lookup_value(&self, name: &str, position: &Position) -> Result<&Value, Error> {
        match self.lookup(name) {
            Some(Binding::Value(value)) => Ok(value),
            Some(Binding::Function(_)) => Err(Error::new(
                ErrorImpl::NotAValue {
                    name: String::from(name),
                },
                position.clone(),
            )),
            None => Err(Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: String::from(name),
                },
                position.clone(),
            )),
        }
    }

    fn lookup_function(&self, name: &str, position: &Position) -> Result<Closure<'a>, Error> {
        match self.lookup(name) {
            Some(Binding::Function(closure)) => Ok(*closure),
            _ => Err(Error::new(
                ErrorImpl::FunctionNotDeclared {
                    function: String::from(name),
                },
                position.clone(),
            )),
        }
    }

    fn execute_block(&mut self, declarations: &'a [Declaration]) -> Result<(), Error> {
        for declaration in declarations {
            self.execute(declaration)?;
        }
        Ok(())
    }

    fn execute(&mut self, declaration: &'a Declaration) -> Result<(), Error> {
        match declaration {
            Declaration::Variable(decl) => {
                let data_type = DataType::from_name(&decl.type_ref.name).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::UnknownType {
                            type_: decl.type_ref.name.clone(),
                        },
                        decl.type_ref.span.start.clone(),
                    )
                })?;
                let value = self.evaluate(&decl.value)?.coerce_to(data_type);
                self.scope().bind(&decl.name, Binding::Value(value));
                Ok(())
            }
            Declaration::Assignment(assignment) => {
                let value = self.evaluate(&assignment.value)?;
                match self.lookup_mut(&assignment.target) {
                    Some(Binding::Value(slot)) => {
                        // Replacing the slot drops the previous payload
                        *slot = value.coerce_to(slot.data_type());
                        Ok(())
                    }
                    _ => Err(Error::new(
                        ErrorImpl::VariableNotDeclared {
                            variable: assignment.target.clone(),
                        },
                        assignment.span.start.clone(),
                    )),
                }
            }
            Declaration::Function(function) => {
                let environment = self.environment();
                self.scope().bind(
                    &function.name,
                    Binding::Function(Closure {
                        definition: function,
                        environment,
                    }),
                );
                Ok(())
            }
            Declaration::Conditional(conditional) => self.execute_conditional(conditional),
            Declaration::ForLoop(for_loop) => self.execute_for_loop(for_loop),
            Declaration::WhileLoop(while_loop) => self.execute_while_loop(while_loop),
            Declaration::Switch(switch) => self.execute_switch(switch),
            Declaration::Call(call) => self.call_function(call).map(|_| ()),
            Declaration::Log(log) => {
                let value = self.evaluate(&log.expression)?;
                writeln!(self.out, "{}", value).map_err(|error| {
                    Error::new(
                        ErrorImpl::OutputError {
                            message: error.to_string(),
                        },
                        log.span.start.clone(),
                    )
                })
            }
        }
    }

    fn execute_conditional(&mut self, conditional: &'a Conditional) -> Result<(), Error> {
        for branch in &conditional.branches {
            if self.evaluate_condition(&branch.condition)? {
                return self.with_scope(|interpreter| interpreter.execute_block(&branch.body));
            }
        }

        match &conditional.else_block {
            Some(else_block) => {
                self.with_scope(|interpreter| interpreter.execute_block(&else_block.body))
            }
            None => Ok(()),
        }
    }

    fn execute_for_loop(&mut self, for_loop: &'a ForLoop) -> Result<(), Error> {
        let items = match self.evaluate(&for_loop.expression)? {
            Value::Byte(count) => (0..count.max(0)).map(Value::Byte).collect::<Vec<_>>(),
            Value::Array(elements) => elements,
            other => {
                return Err(runtime_type_error(
                    format!("cannot iterate over {}", other.data_type()),
                    &for_loop.span.start,
                ))
            }
        };

        for item in items {
            self.with_scope(|interpreter| {
                interpreter
                    .scope()
                    .bind(&for_loop.iterator, Binding::Value(item));
                interpreter.execute_block(&for_loop.body)
            })?;
        }

        Ok(())
    }

    fn execute_while_loop(&mut self, while_loop: &'a WhileLoop) -> Result<(), Error> {
        while self.evaluate_condition(&while_loop.condition)? {
            self.with_scope(|interpreter| interpreter.execute_block(&while_loop.body))?;
        }
        Ok(())
    }

    fn execute_switch(&mut self, switch: &'a Switch) -> Result<(), Error> {
        let subject = self.evaluate(&switch.subject)?;

        for case in &switch.cases {
            if self.evaluate(&case.value)? == subject {
                return self.with_scope(|interpreter| interpreter.execute_block(&case.body));
            }
        }

        match &switch.otherwise {
            Some(otherwise) => {
                self.with_scope(|interpreter| interpreter.execute_block(&otherwise.body))
            }
            None => Ok(()),
        }
    }

    /// Runs a call in a new frame. Void functions produce `None`.
    fn call_function(&mut self, call: &FunctionCall) -> Result<Option<Value>, Error> {
        let closure = self.lookup_function(&call.name, &call.span.start)?;
        let function = closure.definition;

        if call.arguments.len() != function.params.len() {
            let (expected, received) = (function.params.len(), call.arguments.len());
            let error = if received > expected {
                ErrorImpl::UnexpectedArguments {
                    function: call.name.clone(),
                    expected,
                    received,
                }
            } else {
                ErrorImpl::MissingArguments {
                    function: call.name.clone(),
                    expected,
                    received,
                }
            };
            return Err(Error::new(error, call.span.start.clone()));
        }

        let mut table = ScopeTable::new();
        // Bound before the parameters so one of the same name shadows it
        table.bind(&function.name, Binding::Function(closure));
        for (param, argument) in function.params.iter().zip(&call.arguments) {
            let value = self.evaluate(argument)?.coerce_to(DataType::Byte);
            table.bind(&param.name, Binding::Value(value));
        }

        tracing::trace!(function = %call.name, depth = self.frames.len() + 1, "call");

        self.frames.push(Frame {
            table,
            parent: closure.environment,
        });
        let result = self.execute_block(&function.body).and_then(|_| {
            function
                .return_clause
                .as_ref()
                .map(|return_clause| self.evaluate(&return_clause.expression))
                .transpose()
        });
        self.frames.pop();

        result
    }

    fn evaluate_condition(&mut self, condition: &Expr) -> Result<bool, Error> {
        match self.evaluate(condition)? {
            Value::Bit(flag) => Ok(flag),
            other => Err(runtime_type_error(
                format!("condition must be bit, found {}", other.data_type()),
                &condition.get_span().start,
            )),
        }
    }

    pub fn evaluate(&mut self, expression: &Expr) -> Result<Value, Error> {
        match expression {
            Expr::Number(number) => Ok(Value::Byte(number.value)),
            Expr::String(string) => Ok(Value::Chip(string.value.clone())),
            Expr::Boolean(boolean) => Ok(Value::Bit(boolean.value)),
            Expr::Array(array) => array
                .elements
                .iter()
                .map(|element| self.evaluate(element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Identifier(identifier) => self
                .lookup_value(&identifier.name, &identifier.span.start)
                .cloned(),
            Expr::Call(call) => self.call_function(call)?.ok_or_else(|| {
                Error::new(
                    ErrorImpl::VoidValue {
                        context: String::from("expression"),
                    },
                    call.span.start.clone(),
                )
            }),
            Expr::Binary(binary) => self.evaluate_binary(binary),
            Expr::Unary(unary) => self.evaluate_unary(unary),
        }
    }

    fn evaluate_binary(&mut self, binary: &BinaryExpr) -> Result<Value, Error> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        let position = &binary.span.start;

        match (binary.operator, left, right) {
            (BinaryOperator::Concat, left, right) => {
                Ok(Value::Chip(format!("{}{}", left, right)))
            }
            (BinaryOperator::Equal, left, right) => Ok(Value::Bit(left == right)),
            (BinaryOperator::NotEqual, left, right) => Ok(Value::Bit(left != right)),
            (BinaryOperator::And, Value::Bit(left), Value::Bit(right)) => {
                Ok(Value::Bit(left && right))
            }
            (BinaryOperator::Or, Value::Bit(left), Value::Bit(right)) => {
                Ok(Value::Bit(left || right))
            }
            (operator, Value::Byte(left), Value::Byte(right)) => {
                arithmetic(operator, left, right, position)
            }
            (operator, Value::Chip(left), Value::Chip(right)) => {
                let ordering = left.as_bytes().cmp(right.as_bytes());
                match operator {
                    BinaryOperator::Less => Ok(Value::Bit(ordering.is_lt())),
                    BinaryOperator::LessEqual => Ok(Value::Bit(ordering.is_le())),
                    BinaryOperator::Greater => Ok(Value::Bit(ordering.is_gt())),
                    BinaryOperator::GreaterEqual => Ok(Value::Bit(ordering.is_ge())),
                    operator => Err(runtime_type_error(
                        format!("{} cannot be applied to chip", operator),
                        position,
                    )),
                }
            }
            (operator, left, right) => Err(runtime_type_error(
                format!(
                    "{} cannot be applied to {} and {}",
                    operator,
                    left.data_type(),
                    right.data_type()
                ),
                position,
            )),
        }
    }

    fn evaluate_unary(&mut self, unary: &UnaryExpr) -> Result<Value, Error> {
        match (unary.operator, self.evaluate(&unary.operand)?) {
            (UnaryOperator::Negate, Value::Byte(number)) => Ok(Value::Byte(number.wrapping_neg())),
            (UnaryOperator::Plus, Value::Byte(number)) => Ok(Value::Byte(number)),
            (UnaryOperator::Not, Value::Bit(flag)) => Ok(Value::Bit(!flag)),
            (operator, operand) => Err(runtime_type_error(
                format!("{} cannot be applied to {}", operator, operand.data_type()),
                &unary.span.start,
            )),
        }
    }
}

fn arithmetic(
    operator: BinaryOperator,
    left: i32,
    right: i32,
    position: &Position,
) -> Result<Value, Error> {
    let value = match operator {
        BinaryOperator::Plus => Value::Byte(left.wrapping_add(right)),
        BinaryOperator::Minus => Value::Byte(left.wrapping_sub(right)),
        BinaryOperator::Multiply => Value::Byte(left.wrapping_mul(right)),
        BinaryOperator::Divide | BinaryOperator::Modulo if right == 0 => {
            return Err(Error::new(ErrorImpl::DivisionByZero, position.clone()))
        }
        BinaryOperator::Divide => Value::Byte(left.wrapping_div(right)),
        BinaryOperator::Modulo => Value::Byte(left.wrapping_rem(right)),
        BinaryOperator::Less => Value::Bit(left < right),
        BinaryOperator::LessEqual => Value::Bit(left <= right),
        BinaryOperator::Greater => Value::Bit(left > right),
        BinaryOperator::GreaterEqual => Value::Bit(left >= right),
        operator => {
            return Err(runtime_type_error(
                format!("{} cannot be applied to byte", operator),
                position,
            ))
        }
    };
    Ok(value)
}

fn runtime_type_error(message: String, position: &Position) -> Error {
    Error::new(ErrorImpl::RuntimeTypeError { message }, position.clone())
}

/// Executes a type checked program, writing `log` output to `out`.
#[tracing::instrument(skip_all, fields(program = %program.name))]
pub fn interpret<W: Write>(program: &Program, out: W) -> Result<(), Error> {
    let mut interpreter = Interpreter::new(out);
    interpreter.run(program)
}
