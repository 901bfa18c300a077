//! Tree‑walking evaluator.
//!
//! Statements run against the *current* frame (`environment`); blocks and
//! calls swap in a child frame and always put the previous one back, on error
//! paths as well.  A `return` does not unwind through `Err`: statement
//! execution yields a [`Flow`] that every enclosing statement checks and passes
//! upward until the call boundary consumes it.

use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, NativeFn, NativeFunction, Value};

/// Call depth at which interpreted recursion is cut off.  Evaluation grows
/// its stack on demand, so any depth up to the ceiling completes on small
/// thread stacks too; beyond it a call fails with `StackOverflow`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 255;

/// Outcome of executing one statement.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    out: W,
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter<io::Stdout> {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64 / 1000.0))
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter writing `print` output to `out`, with the
    /// native functions (`clock`) already defined.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        };

        if let Err(e) = interpreter.define_native("clock", 0, clock) {
            debug!("Could not define native 'clock': {}", e);
        }

        interpreter
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Bind a host function in the global frame.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) -> Result<()> {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::NativeFunction(native), 0)
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Register the distances computed by the resolver for a freshly parsed
    /// program.  A use site may only ever be registered once.
    pub fn resolve(&mut self, locals: Locals) -> Result<()> {
        debug!("Registering {} resolved reference(s)", locals.len());

        for (id, depth) in locals {
            if self.locals.insert(id, depth).is_some() {
                return Err(LoxError::Internal(format!(
                    "expression {:?} resolved twice",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Interprets a list of statements (a "program").  The first runtime error
    /// aborts the remaining statements; effects already produced stay.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                return Err(LoxError::Internal(
                    "'return' escaped to the top level".to_string(),
                ));
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value, name.line)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Function(Rc::new(function)),
                    decl.name.line,
                )?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` with `frame` as the current environment, restoring
    /// the previous one however the block is left.
    fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, frame);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return(_) = self.execute(stmt)? {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match (operator.token_type, right) {
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::MINUS, _) => Err(LoxError::runtime(
                        operator.line,
                        "Operand of '-' must be a number.",
                    )),
                    (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
                    _ => Err(LoxError::Internal(format!(
                        "invalid unary operator '{}'",
                        operator.lexeme
                    ))),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(&callee, paren, args)
            }
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!("Binary '{}': {} , {}", operator.lexeme, left, right);

        let value = match operator.token_type {
            TokenType::PLUS => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(a);
                    joined.push_str(b);
                    Value::String(joined.into())
                }
                _ => {
                    return Err(LoxError::runtime(
                        operator.line,
                        "Operands of '+' must be two numbers or two strings.",
                    ));
                }
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a - b)
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a * b)
            }

            // IEEE semantics: dividing by zero yields an infinity or NaN.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a / b)
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a > b)
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a >= b)
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a < b)
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a <= b)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),

            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => {
                return Err(LoxError::Internal(format!(
                    "invalid binary operator '{}'",
                    operator.lexeme
                )));
            }
        };

        Ok(value)
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: &Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_function(function, args, paren.line)
            }

            Value::NativeFunction(native) => {
                check_arity(native.arity, args.len(), paren)?;
                debug!("Calling native function '{}'", native.name);
                (native.func)(&args).map_err(|message| LoxError::runtime(paren.line, message))
            }

            other => Err(LoxError::runtime(
                paren.line,
                format!("Can only call functions, not {}.", other.type_name()),
            )),
        }
    }

    /// The new frame encloses the *captured* frame, not the caller's: this is
    /// what makes scoping lexical.
    fn call_function(
        &mut self,
        function: &Rc<LoxFunction>,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        if self.call_depth >= self.max_call_depth {
            debug!("Call depth limit {} reached", self.max_call_depth);
            return Err(LoxError::StackOverflow {
                limit: self.max_call_depth,
                line,
            });
        }

        debug!("Calling user-defined function '{}'", function.name());

        let frame: EnvRef = Environment::with_enclosing(Rc::clone(&function.closure)).into_ref();
        {
            let mut bindings = frame.borrow_mut();
            for (param, arg) in function.declaration.params.iter().zip(args) {
                bindings.define(&param.lexeme, arg, param.line)?;
            }
        }

        self.call_depth += 1;
        let result = self.execute_block(&function.declaration.body, frame);
        self.call_depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            operator.line,
            format!("Operands of '{}' must be numbers.", operator.lexeme),
        )),
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
    if expected == got {
        return Ok(());
    }

    Err(LoxError::runtime(
        paren.line,
        format!("Expected {} arguments but got {}.", expected, got),
    ))
}
