//! Command and environment registry
//!
//! A [`Registry`] maps control-sequence names to the [`Command`]s and
//! [`Environment`]s that generate their output. Each translation run works on
//! its own copy: the built-ins from [`builtins::default_registry`] plus whatever
//! the caller registered for that run.

pub mod args;
pub mod builtins;
pub mod params;

pub use args::{resolve, unresolve, Arg};
pub use params::{ArgMode, Param, ParamSpec, Presence};

use crate::error::{ExecutionFailure, TranslationError};
use crate::execution::BodyExecutor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while registering commands and environments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is not a valid control sequence name")]
    InvalidName(String),
    #[error("`{name}` is already registered as {existing}")]
    Conflict { name: String, existing: &'static str },
    #[error("invalid parameter flag `{flag}` in `{spec}`")]
    InvalidParams { spec: String, flag: char },
}

type CommandFn = dyn Fn(&[Option<String>]) -> Result<String, TranslationError> + Send + Sync;
type EnvironmentFn = dyn Fn(&mut GenerateContext<'_>, &str, &[Option<String>]) -> Result<String, TranslationError>
    + Send
    + Sync;

/// What an environment's generator can reach while it runs.
pub struct GenerateContext<'a> {
    indent_unit: &'a str,
    executor: &'a mut dyn BodyExecutor,
}

impl<'a> GenerateContext<'a> {
    pub fn new(indent_unit: &'a str, executor: &'a mut dyn BodyExecutor) -> Self {
        GenerateContext {
            indent_unit,
            executor,
        }
    }

    /// The indentation unit established so far (empty if none yet).
    pub fn indent_unit(&self) -> &str {
        self.indent_unit
    }

    /// Prefix every non-empty line of `body` after the first with one
    /// indentation unit.
    ///
    /// Generators use this to nest a dedented block body one level inside their
    /// `\begin`/`\end` pair. One-liner bodies come back unchanged.
    pub fn indent_body(&self, body: &str) -> String {
        body.split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == 0 || line.is_empty() {
                    line.to_string()
                } else {
                    format!("{}{}", self.indent_unit, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run `body` through the run's body executor.
    pub fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
        self.executor.execute(body)
    }

    /// Run `body` with a named interpreter, or the default one.
    pub fn execute_in(
        &mut self,
        interpreter: Option<&str>,
        body: &str,
    ) -> Result<String, ExecutionFailure> {
        match interpreter {
            Some(interpreter) => self.executor.execute_in(interpreter, body),
            None => self.executor.execute(body),
        }
    }
}

/// A control sequence that produces inline output from its arguments.
#[derive(Clone)]
pub struct Command {
    name: String,
    params: ParamSpec,
    generate: Arc<CommandFn>,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, params: ParamSpec, generate: F) -> Self
    where
        F: Fn(&[Option<String>]) -> Result<String, TranslationError> + Send + Sync + 'static,
    {
        Command {
            name: name.into(),
            params,
            generate: Arc::new(generate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    /// Generate output from arguments already matched to the parameter slots.
    pub fn generate(&self, args: &[Option<String>]) -> Result<String, TranslationError> {
        (self.generate)(args)
    }

    /// Resolve syntactic arguments against the parameter spec, then generate.
    pub fn call(&self, args: &[Arg]) -> Result<String, TranslationError> {
        let resolved = resolve(&self.name, &self.params, args)?;
        self.generate(&resolved)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params.to_string())
            .finish()
    }
}

/// A control sequence followed by a colon and a body.
#[derive(Clone)]
pub struct Environment {
    name: String,
    params: ParamSpec,
    raw: bool,
    generate: Arc<EnvironmentFn>,
}

impl Environment {
    pub fn new<F>(name: impl Into<String>, params: ParamSpec, generate: F) -> Self
    where
        F: Fn(&mut GenerateContext<'_>, &str, &[Option<String>]) -> Result<String, TranslationError>
            + Send
            + Sync
            + 'static,
    {
        Environment {
            name: name.into(),
            params,
            raw: false,
            generate: Arc::new(generate),
        }
    }

    /// Scan this environment's body literally instead of interpreting it.
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn generate(
        &self,
        ctx: &mut GenerateContext<'_>,
        body: &str,
        args: &[Option<String>],
    ) -> Result<String, TranslationError> {
        (self.generate)(ctx, body, args)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("params", &self.params.to_string())
            .field("raw", &self.raw)
            .finish()
    }
}

/// How a control-sequence name is handled, decided once per occurrence.
#[derive(Debug, Clone)]
pub enum ControlKind {
    Command(Command),
    Environment(Environment),
    /// Not registered: passed through as target-notation syntax
    Native,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: HashMap<String, Command>,
    environments: HashMap<String, Environment>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in commands and environments
    pub fn with_defaults() -> Self {
        builtins::default_registry()
    }

    /// Register a command, replacing any command with the same name.
    pub fn register_command(&mut self, command: Command) -> Result<(), RegistryError> {
        if !is_control_name(command.name()) {
            return Err(RegistryError::InvalidName(command.name().to_string()));
        }
        if self.environments.contains_key(command.name()) {
            return Err(RegistryError::Conflict {
                name: command.name().to_string(),
                existing: "an environment",
            });
        }
        self.commands.insert(command.name().to_string(), command);
        Ok(())
    }

    /// Register an environment, replacing any environment with the same name.
    ///
    /// Environment names must be alphabetic: symbol control sequences never
    /// open environments.
    pub fn register_environment(&mut self, environment: Environment) -> Result<(), RegistryError> {
        let name = environment.name();
        if name.is_empty() || !name.chars().all(char::is_alphabetic) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.commands.contains_key(name) {
            return Err(RegistryError::Conflict {
                name: name.to_string(),
                existing: "a command",
            });
        }
        self.environments.insert(name.to_string(), environment);
        Ok(())
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.get(name)
    }

    pub fn classify(&self, name: &str) -> ControlKind {
        if let Some(command) = self.commands.get(name) {
            ControlKind::Command(command.clone())
        } else if let Some(environment) = self.environments.get(name) {
            ControlKind::Environment(environment.clone())
        } else {
            ControlKind::Native
        }
    }

    /// All registered names (sorted)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .commands
            .keys()
            .chain(self.environments.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// A name reachable as a control sequence: a run of letters, or one symbol.
fn is_control_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), None) => !c.is_whitespace(),
        _ => name.chars().all(char::is_alphabetic),
    }
}
