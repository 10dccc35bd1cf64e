//! Built-in commands and environments

use super::{Arg, Command, Environment, GenerateContext, ParamSpec, Registry};
use crate::error::TranslationError;

/// Render `\name` followed by its re-serialised arguments.
pub fn latex_cmd(name: &str, args: &[Option<Arg>]) -> String {
    format!("\\{}{}", name, super::unresolve(args))
}

/// Render `\begin{name}<argstr><body>\end{name}`.
pub fn latex_env(name: &str, argstr: &str, body: &str) -> String {
    format!("\\begin{{{name}}}{argstr}{body}\\end{{{name}}}")
}

fn docclass(args: &[Option<String>]) -> Result<String, TranslationError> {
    let opts = args.first().cloned().flatten().map(Arg::optional);
    let class = args.get(1).cloned().flatten().map(Arg::required);
    Ok(latex_cmd("documentclass", &[opts, class]))
}

fn verb(args: &[Option<String>]) -> Result<String, TranslationError> {
    let body = args.first().cloned().flatten().map(Arg::required);
    Ok(latex_cmd("verb", &[body]))
}

fn verbatim(
    _ctx: &mut GenerateContext<'_>,
    body: &str,
    _args: &[Option<String>],
) -> Result<String, TranslationError> {
    Ok(latex_env("verbatim", "", body))
}

/// Execute the body and splice back what it printed.
///
/// The optional argument names the interpreter to run it with. A single
/// trailing newline is dropped so the splice composes with the surrounding
/// lines like any other environment output.
fn pysplice(
    ctx: &mut GenerateContext<'_>,
    body: &str,
    args: &[Option<String>],
) -> Result<String, TranslationError> {
    let interpreter = args.first().and_then(|arg| arg.as_deref()).map(str::trim);
    let mut output = ctx.execute_in(interpreter, body)?;
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Build the registry every translation run starts from.
pub fn default_registry() -> Registry {
    let commands = [
        Command::new(
            "docclass",
            ParamSpec::new().optional().required(),
            docclass,
        ),
        Command::new("verb", ParamSpec::new().raw_required(), verb),
        Command::new("colon", ParamSpec::new(), |_| Ok(":".to_string())),
    ];
    let environments = [
        Environment::new("verbatim", ParamSpec::new(), verbatim).raw(),
        Environment::new("pysplice", ParamSpec::new().raw_optional(), pysplice).raw(),
    ];

    let mut registry = Registry::new();
    for command in commands {
        registry.commands.insert(command.name().to_string(), command);
    }
    for environment in environments {
        registry
            .environments
            .insert(environment.name().to_string(), environment);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ExecutionFailure};
    use crate::execution::{BodyExecutor, UnavailableExecutor};

    #[test]
    fn test_default_names() {
        assert_eq!(
            default_registry().names(),
            vec!["colon", "docclass", "pysplice", "verb", "verbatim"]
        );
    }

    #[test]
    fn test_eq_is_not_builtin() {
        assert!(default_registry().environment("eq").is_none());
    }

    #[test]
    fn test_docclass() {
        let registry = default_registry();
        let docclass = registry.command("docclass").unwrap();
        assert_eq!(
            docclass
                .generate(&[Some("a4paper".into()), Some("article".into())])
                .unwrap(),
            "\\documentclass[a4paper]{article}"
        );
        assert_eq!(
            docclass.generate(&[None, Some("article".into())]).unwrap(),
            "\\documentclass{article}"
        );
    }

    #[test]
    fn test_latex_env() {
        assert_eq!(
            latex_env("equation", "\\label{eq:x}", "f(x)"),
            "\\begin{equation}\\label{eq:x}f(x)\\end{equation}"
        );
    }

    #[test]
    fn test_pysplice_uses_executor() {
        struct Fixed;
        impl BodyExecutor for Fixed {
            fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
                Ok(format!("ran {}\n", body))
            }
        }
        let registry = default_registry();
        let env = registry.environment("pysplice").unwrap();
        assert!(env.is_raw());
        let mut executor = Fixed;
        let mut ctx = GenerateContext::new("", &mut executor);
        assert_eq!(env.generate(&mut ctx, "x = 1", &[None]).unwrap(), "ran x = 1");
    }

    #[test]
    fn test_pysplice_selects_interpreter() {
        struct Named;
        impl BodyExecutor for Named {
            fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
                Ok(format!("default: {}\n", body))
            }
            fn execute_in(
                &mut self,
                interpreter: &str,
                body: &str,
            ) -> Result<String, ExecutionFailure> {
                Ok(format!("{}: {}\n", interpreter, body))
            }
        }
        let registry = default_registry();
        let env = registry.environment("pysplice").unwrap();
        assert_eq!(env.params().to_string(), "o");
        let mut executor = Named;
        let mut ctx = GenerateContext::new("", &mut executor);
        assert_eq!(
            env.generate(&mut ctx, "x", &[Some("pypy3".into())]).unwrap(),
            "pypy3: x"
        );
        assert_eq!(env.generate(&mut ctx, "x", &[None]).unwrap(), "default: x");
    }

    #[test]
    fn test_pysplice_without_executor() {
        let registry = default_registry();
        let env = registry.environment("pysplice").unwrap();
        let mut executor = UnavailableExecutor;
        let mut ctx = GenerateContext::new("", &mut executor);
        let err = env.generate(&mut ctx, "x = 1", &[None]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DependencyError);
    }
}
