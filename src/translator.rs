//! Translation entry points
//!
//! A [`Translator`] holds everything that outlives a single run: the registry
//! every run starts from, the auxiliary file environment and the factory for
//! body executors. Each call to [`Translator::translate`] builds a fresh
//! [`TranslationState`] from those, so runs never share state.

pub mod block;
pub mod control;
pub mod cursor;
pub mod document;
pub mod indentation;
pub mod state;

pub use state::TranslationState;

use crate::error::TranslationError;
use crate::execution::{ExecutorFactory, FileEnv, NoExecution};
use crate::registry::{Command, Environment, Registry, RegistryError};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Translator {
    registry: Registry,
    files: FileEnv,
    executor: Arc<dyn ExecutorFactory>,
}

impl Translator {
    /// A translator with the built-in registry and code execution disabled.
    pub fn new() -> Self {
        Self::with_registry(Registry::with_defaults())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Translator {
            registry,
            files: FileEnv::new(),
            executor: Arc::new(NoExecution),
        }
    }

    pub fn with_command(mut self, command: Command) -> Result<Self, RegistryError> {
        self.registry.register_command(command)?;
        Ok(self)
    }

    pub fn with_environment(mut self, environment: Environment) -> Result<Self, RegistryError> {
        self.registry.register_environment(environment)?;
        Ok(self)
    }

    /// Files made visible to executed environment bodies.
    pub fn with_file_env(mut self, files: FileEnv) -> Self {
        self.files = files;
        self
    }

    pub fn with_executor_factory<F>(mut self, factory: F) -> Self
    where
        F: ExecutorFactory + 'static,
    {
        self.executor = Arc::new(factory);
        self
    }

    pub fn with_shared_executor_factory(mut self, factory: Arc<dyn ExecutorFactory>) -> Self {
        self.executor = factory;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn files(&self) -> &FileEnv {
        &self.files
    }

    fn state<'a>(&self, source: &'a str) -> TranslationState<'a> {
        TranslationState::new(source)
            .with_registry(self.registry.clone())
            .with_executor(self.executor.create(&self.files))
    }

    /// Translate a complete source file (preamble, delimiter and document).
    pub fn translate(&self, source: &str) -> Result<String, TranslationError> {
        log::debug!("translating {} bytes", source.len());
        self.state(source).parse_root()
    }

    /// Translate a source without a preamble/document split.
    ///
    /// The indentation of the first non-blank line is the root level; lines
    /// indented less than it start a new root block.
    pub fn translate_fragment(&self, source: &str) -> Result<String, TranslationError> {
        let mut state = self.state(source);
        let mut out = state.parse_block()?;
        while !state.cursor.is_finished() {
            state.cursor.advance_one();
            out.push('\n');
            out.push_str(&state.parse_block()?);
        }
        Ok(out)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("registry", &self.registry.names())
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Translate a complete source file with the built-in registry.
pub fn translate(source: &str) -> Result<String, TranslationError> {
    Translator::new().translate(source)
}

/// Translate a fragment with the built-in registry.
pub fn translate_fragment(source: &str) -> Result<String, TranslationError> {
    Translator::new().translate_fragment(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ExecutionFailure};
    use crate::execution::BodyExecutor;
    use crate::registry::ParamSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_translate() {
        assert_eq!(
            translate("\\documentclass{article}\n===\nHey!").unwrap(),
            "\\documentclass{article}\n\\begin{document}\nHey!\n\\end{document}"
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(translate_fragment("\\eq: f(x)").unwrap(), "\\begin{eq}f(x)\\end{eq}");
    }

    #[test]
    fn test_fragment_dedent_starts_new_block() {
        assert_eq!(
            translate_fragment("    a\n    b\nc\n\n").unwrap(),
            "    a\n    b\nc\n\n"
        );
    }

    #[test]
    fn test_registrations_are_per_translator() {
        let translator = Translator::new()
            .with_command(Command::new("hi", ParamSpec::new(), |_| Ok("hello".into())))
            .unwrap();
        assert_eq!(translator.translate_fragment("\\hi").unwrap(), "hello");
        assert_eq!(translate_fragment("\\hi").unwrap(), "\\hi");
    }

    #[test]
    fn test_registration_error() {
        let err = Translator::new()
            .with_command(Command::new("verbatim", ParamSpec::new(), |_| Ok(String::new())))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
    }

    #[test]
    fn test_fresh_executor_per_run() {
        struct Counter(usize);
        impl BodyExecutor for Counter {
            fn execute(&mut self, _body: &str) -> Result<String, ExecutionFailure> {
                self.0 += 1;
                Ok(self.0.to_string())
            }
        }
        let created = Arc::new(AtomicUsize::new(0));
        let seen = created.clone();
        let translator = Translator::new().with_executor_factory(move |_: &FileEnv| {
            seen.fetch_add(1, Ordering::SeqCst);
            Box::new(Counter(0)) as Box<dyn BodyExecutor>
        });

        let source = "\\pysplice: a\n\\pysplice: b";
        assert_eq!(translator.translate_fragment(source).unwrap(), "1\n2");
        assert_eq!(translator.translate_fragment(source).unwrap(), "1\n2");
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_file_env_reaches_factory() {
        struct Files(Vec<String>);
        impl BodyExecutor for Files {
            fn execute(&mut self, _body: &str) -> Result<String, ExecutionFailure> {
                Ok(self.0.join(","))
            }
        }
        let mut files = FileEnv::new();
        files.insert("a.txt".into(), "A".into());
        files.insert("b.txt".into(), "B".into());
        let translator = Translator::new()
            .with_file_env(files)
            .with_executor_factory(|files: &FileEnv| {
                Box::new(Files(files.keys().cloned().collect())) as Box<dyn BodyExecutor>
            });
        assert_eq!(
            translator.translate_fragment("\\pysplice: x").unwrap(),
            "a.txt,b.txt"
        );
    }

    #[test]
    fn test_execution_disabled_by_default() {
        let err = translate_fragment("\\pysplice: print(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DependencyError);
    }
}
