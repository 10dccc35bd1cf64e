//! Syntactic arguments and their resolution against a [`ParamSpec`]

use super::params::{ParamSpec, Presence};
use crate::error::{ErrorKind, TranslationError};

/// A parsed but unresolved argument, tagged by the bracket that delimited it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub contents: String,
    pub optional: bool,
}

impl Arg {
    /// An argument written in braces.
    pub fn required(contents: impl Into<String>) -> Self {
        Arg {
            contents: contents.into(),
            optional: false,
        }
    }

    /// An argument written in brackets.
    pub fn optional(contents: impl Into<String>) -> Self {
        Arg {
            contents: contents.into(),
            optional: true,
        }
    }
}

/// Match a flat list of parsed arguments against `spec`, left to right.
///
/// Required slots consume the next argument only if it was written in braces;
/// optional slots consume the next argument only if it was written in brackets
/// and resolve to `None` otherwise.
pub fn resolve(
    name: &str,
    spec: &ParamSpec,
    args: &[Arg],
) -> Result<Vec<Option<String>>, TranslationError> {
    let too_many = || {
        TranslationError::new(
            ErrorKind::InvalidSyntax,
            format!("Too many arguments while resolving arguments for `{}`", name),
        )
    };
    if args.len() > spec.len() {
        return Err(too_many());
    }

    let mut resolved = Vec::with_capacity(spec.len());
    let mut next = args.iter().peekable();
    for param in spec.iter() {
        match (param.presence, next.peek()) {
            (Presence::Required, Some(arg)) if !arg.optional => {
                resolved.push(Some(arg.contents.clone()));
                next.next();
            }
            (Presence::Required, Some(_)) => {
                return Err(TranslationError::new(
                    ErrorKind::InvalidSyntax,
                    format!("Superfluous optional argument provided to `{}`", name),
                ));
            }
            (Presence::Required, None) => {
                return Err(TranslationError::new(
                    ErrorKind::MissingArgument,
                    format!("Missing required argument for `{}`", name),
                ));
            }
            (Presence::Optional, Some(arg)) if arg.optional => {
                resolved.push(Some(arg.contents.clone()));
                next.next();
            }
            (Presence::Optional, _) => resolved.push(None),
        }
    }
    if next.next().is_some() {
        return Err(too_many());
    }
    Ok(resolved)
}

/// Re-serialise arguments as `[...]`/`{...}` text, skipping absent ones.
pub fn unresolve(args: &[Option<Arg>]) -> String {
    args.iter()
        .flatten()
        .map(|arg| {
            if arg.optional {
                format!("[{}]", arg.contents)
            } else {
                format!("{{{}}}", arg.contents)
            }
        })
        .collect()
}
