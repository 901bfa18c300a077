//! Drives one unit of source through scan → parse → resolve → interpret.
//!
//! A [`Session`] keeps its interpreter (and therefore its globals) alive
//! across runs, which is what the interactive prompt needs.  Errors belong to
//! the run that produced them: the next [`Session::run`] starts clean.

use std::io::{self, Write};

use log::{debug, info};
use thiserror::Error;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// Lexical, syntax or resolution errors.  Nothing was evaluated.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    /// Evaluation stopped at this error; earlier output stands.
    #[error(transparent)]
    Runtime(LoxError),
}

impl RunError {
    /// Every diagnostic of this run, in report order.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            RunError::Static(errors) => errors.iter().collect(),
            RunError::Runtime(error) => vec![error],
        }
    }
}

pub struct Session<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
}

impl Session<io::Stdout> {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }
}

impl Default for Session<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Session<W> {
    pub fn with_interpreter(interpreter: Interpreter<W>) -> Self {
        Self { interpreter }
    }

    pub fn into_interpreter(self) -> Interpreter<W> {
        self.interpreter
    }

    pub fn run(&mut self, source: &[u8]) -> Result<(), RunError> {
        let (tokens, mut errors) = scan_tokens(source);

        // Parse even after lexical errors so syntax errors surface in the
        // same pass.
        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(RunError::Static(errors));
            }
        };

        if !errors.is_empty() {
            return Err(RunError::Static(errors));
        }

        let locals = Resolver::new()
            .resolve(&statements)
            .map_err(RunError::Static)?;

        debug!("Program resolved, handing {} statement(s) to interpreter", statements.len());

        self.interpreter
            .resolve(locals)
            .map_err(RunError::Runtime)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)?;

        info!("Run completed");
        Ok(())
    }
}
