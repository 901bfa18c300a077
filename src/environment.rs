use crate::error::{LoxError, Result};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.  Frames are shared between the scope that
/// created them and every closure created while that scope was active.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One level of bindings in the runtime scope chain.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root (global) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap in a shareable handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame.  A frame never rebinds a name.
    pub fn define(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            return Err(LoxError::runtime(
                line,
                format!("Variable '{}' already declared in this scope.", name),
            ));
        }

        self.values.insert(name.to_string(), value);

        Ok(())
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Frame exactly `distance` links out from `env`.
    fn ancestor(env: &EnvRef, distance: usize) -> Result<EnvRef> {
        let mut frame: EnvRef = Rc::clone(env);

        for hop in 0..distance {
            let next: EnvRef = frame.borrow().enclosing.clone().ok_or_else(|| {
                LoxError::Internal(format!(
                    "scope chain ended after {} of {} hops",
                    hop, distance
                ))
            })?;
            frame = next;
        }

        Ok(frame)
    }

    /// Read `name` from the frame `distance` hops out, without searching the
    /// frames in between.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Result<Value> {
        debug!("get_at: '{}' at distance {}", name, distance);

        let frame: EnvRef = Self::ancestor(env, distance)?;
        let value = frame.borrow().values.get(name).cloned();

        value.ok_or_else(|| {
            LoxError::Internal(format!(
                "resolved variable '{}' missing at distance {}",
                name, distance
            ))
        })
    }

    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> Result<()> {
        debug!("assign_at: '{}' at distance {}", name, distance);

        let frame: EnvRef = Self::ancestor(env, distance)?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(LoxError::Internal(format!(
                "resolved variable '{}' missing at distance {}",
                name, distance
            ))),
        }
    }
}
