//! # hltex
//!
//! A translator from hltex, an indentation-sensitive way of writing LaTeX, to
//! plain LaTeX.
//!
//! Environments are opened with a colon instead of `\begin`/`\end` pairs, and
//! their body is either the rest of the line or the following indented block:
//!
//! ```text
//! \docclass{article}
//! ===
//! \equation:
//!     \split:
//!         f(x) &= x^2 \\
//!              &= x \cdot x
//! \eq: g(x)   % a one-liner
//! ```
//!
//! The preamble (everything above the `===` line) is copied through with its
//! control sequences dispatched; the document body is wrapped in
//! `\begin{document}`/`\end{document}`.
//!
//! ## Layout
//!
//! - [`translator`]: the parsing engine and the [`Translator`] entry point
//! - [`registry`]: commands and environments that generate their own output
//! - [`execution`]: running code-bearing environment bodies (`\pysplice`)
//! - [`error`]: the error taxonomy and user-facing reports
//! - [`config`]: configuration for the command line

pub mod config;
pub mod error;
pub mod execution;
pub mod registry;
pub mod translator;

pub use error::{ErrorKind, ExecutionFailure, Location, TranslationError};
pub use execution::{BodyExecutor, ExecutorFactory, FileEnv};
pub use registry::{Command, Environment, ParamSpec, Registry, RegistryError};
pub use translator::{translate, translate_fragment, Translator};
