//! Execution of code-bearing environment bodies
//!
//! The translator only knows the narrow [`BodyExecutor`] contract: hand over a
//! body, get its output text back or a failure. A fresh executor is created for
//! every translation run through an [`ExecutorFactory`], so interpreter state
//! lives exactly as long as one run.
//!
//! [`ProcessExecutor`] is the stock implementation. It starts an interpreter
//! subprocess on first use and talks to a small driver program over stdio, one
//! JSON line per request and per response. A body may ask for a specific
//! interpreter; each interpreter gets its own process.

use crate::error::ExecutionFailure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

/// Auxiliary files exposed to executed code, by file name.
pub type FileEnv = BTreeMap<String, String>;

/// Runs environment bodies on behalf of the translator.
pub trait BodyExecutor {
    fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure>;

    /// Run `body` with the interpreter named `interpreter`.
    ///
    /// Executors bound to a single interpreter refuse by default.
    fn execute_in(&mut self, interpreter: &str, body: &str) -> Result<String, ExecutionFailure> {
        let _ = body;
        Err(ExecutionFailure::Unsupported(interpreter.to_string()))
    }
}

/// Creates one executor per translation run.
pub trait ExecutorFactory: Send + Sync {
    fn create(&self, files: &FileEnv) -> Box<dyn BodyExecutor>;
}

impl<F> ExecutorFactory for F
where
    F: Fn(&FileEnv) -> Box<dyn BodyExecutor> + Send + Sync,
{
    fn create(&self, files: &FileEnv) -> Box<dyn BodyExecutor> {
        self(files)
    }
}

/// Executor used when code execution is disabled: every body fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExecutor;

impl BodyExecutor for UnavailableExecutor {
    fn execute(&mut self, _body: &str) -> Result<String, ExecutionFailure> {
        Err(ExecutionFailure::Unavailable)
    }

    fn execute_in(&mut self, _interpreter: &str, _body: &str) -> Result<String, ExecutionFailure> {
        Err(ExecutionFailure::Unavailable)
    }
}

/// Factory for [`UnavailableExecutor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecution;

impl ExecutorFactory for NoExecution {
    fn create(&self, _files: &FileEnv) -> Box<dyn BodyExecutor> {
        Box::new(UnavailableExecutor)
    }
}

/// Driver run inside the interpreter. Globals persist across requests.
const PYTHON_DRIVER: &str = r#"
import io, json, sys
from contextlib import redirect_stdout

_globals = {"__name__": "__pysplice__"}
for _line in sys.stdin:
    _request = json.loads(_line)
    _buffer = io.StringIO()
    try:
        with redirect_stdout(_buffer):
            exec(_request["code"], _globals)
        _result = {"output": _buffer.getvalue(), "error": None}
    except Exception as e:
        _result = {"output": _buffer.getvalue(), "error": type(e).__name__ + ": " + str(e)}
    sys.stdout.write(json.dumps(_result) + "\n")
    sys.stdout.flush()
"#;

#[derive(Debug, Serialize)]
struct Request<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct Response {
    output: String,
    error: Option<String>,
}

/// Factory for [`ProcessExecutor`].
#[derive(Debug, Clone)]
pub struct ProcessExecutorFactory {
    program: String,
    args: Vec<String>,
}

impl ProcessExecutorFactory {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ProcessExecutorFactory {
            program: program.into(),
            args,
        }
    }
}

impl Default for ProcessExecutorFactory {
    fn default() -> Self {
        Self::new("python3", vec!["-u".to_string()])
    }
}

impl ExecutorFactory for ProcessExecutorFactory {
    fn create(&self, files: &FileEnv) -> Box<dyn BodyExecutor> {
        Box::new(ProcessExecutor::new(
            self.program.clone(),
            self.args.clone(),
            files.clone(),
        ))
    }
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // Kept alive so the interpreter's working directory outlives it.
    _workdir: TempDir,
}

/// Executes bodies in long-lived interpreter subprocesses.
///
/// Processes are started lazily, one per interpreter program, and killed when
/// the executor is dropped.
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
    files: FileEnv,
    sessions: BTreeMap<String, Session>,
}

impl ProcessExecutor {
    pub fn new(program: String, args: Vec<String>, files: FileEnv) -> Self {
        ProcessExecutor {
            program,
            args,
            files,
            sessions: BTreeMap::new(),
        }
    }

    fn start(&self, program: &str) -> Result<Session, ExecutionFailure> {
        let workdir = tempfile::tempdir().map_err(|e| ExecutionFailure::Spawn(e.to_string()))?;
        for (name, content) in &self.files {
            let file_name = Path::new(name)
                .file_name()
                .filter(|file_name| *file_name == name.as_str())
                .ok_or_else(|| {
                    ExecutionFailure::Spawn(format!("Invalid auxiliary file name `{}`", name))
                })?;
            fs::write(workdir.path().join(file_name), content)
                .map_err(|e| ExecutionFailure::Spawn(e.to_string()))?;
        }

        log::debug!(
            "starting executor `{}` in {}",
            program,
            workdir.path().display()
        );
        let mut child = Command::new(program)
            .args(&self.args)
            .arg("-c")
            .arg(PYTHON_DRIVER)
            .current_dir(workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ExecutionFailure::Spawn(format!("`{}`: {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExecutionFailure::Spawn("stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutionFailure::Spawn("stdout unavailable".into()))?;
        Ok(Session {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            _workdir: workdir,
        })
    }
}

impl ProcessExecutor {
    fn run(&mut self, program: &str, body: &str) -> Result<String, ExecutionFailure> {
        if !self.sessions.contains_key(program) {
            let session = self.start(program)?;
            self.sessions.insert(program.to_string(), session);
        }
        let Some(session) = self.sessions.get_mut(program) else {
            return Err(ExecutionFailure::Crashed("executor not running".into()));
        };

        let mut request = serde_json::to_string(&Request { code: body })
            .map_err(|e| ExecutionFailure::Crashed(e.to_string()))?;
        request.push('\n');
        log::debug!("executing {} byte body", body.len());
        session
            .stdin
            .write_all(request.as_bytes())
            .and_then(|_| session.stdin.flush())
            .map_err(|e| ExecutionFailure::Crashed(e.to_string()))?;

        let mut line = String::new();
        let read = session
            .stdout
            .read_line(&mut line)
            .map_err(|e| ExecutionFailure::Crashed(e.to_string()))?;
        if read == 0 {
            self.sessions.remove(program);
            return Err(ExecutionFailure::Crashed("the interpreter exited".into()));
        }
        let response: Response =
            serde_json::from_str(&line).map_err(|e| ExecutionFailure::Crashed(e.to_string()))?;
        match response.error {
            Some(error) => Err(ExecutionFailure::Raised(error)),
            None => Ok(response.output),
        }
    }
}

impl BodyExecutor for ProcessExecutor {
    fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
        let program = self.program.clone();
        self.run(&program, body)
    }

    fn execute_in(&mut self, interpreter: &str, body: &str) -> Result<String, ExecutionFailure> {
        self.run(interpreter, body)
    }
}

impl Drop for ProcessExecutor {
    fn drop(&mut self) {
        for session in self.sessions.values_mut() {
            let _ = session.child.kill();
            let _ = session.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_executor_fails() {
        let mut executor = NoExecution.create(&FileEnv::new());
        assert_eq!(
            executor.execute("print(1)"),
            Err(ExecutionFailure::Unavailable)
        );
    }

    #[test]
    fn test_closure_factory() {
        struct Echo;
        impl BodyExecutor for Echo {
            fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
                Ok(body.to_uppercase())
            }
        }
        let factory = |_: &FileEnv| -> Box<dyn BodyExecutor> { Box::new(Echo) };
        let mut executor = factory.create(&FileEnv::new());
        assert_eq!(executor.execute("hi").unwrap(), "HI");
    }

    #[test]
    fn test_single_interpreter_executor_refuses_selection() {
        struct Echo;
        impl BodyExecutor for Echo {
            fn execute(&mut self, body: &str) -> Result<String, ExecutionFailure> {
                Ok(body.to_string())
            }
        }
        assert_eq!(
            Echo.execute_in("python2", "print 1"),
            Err(ExecutionFailure::Unsupported("python2".into()))
        );
        assert_eq!(
            UnavailableExecutor.execute_in("python2", "print 1"),
            Err(ExecutionFailure::Unavailable)
        );
    }

    #[test]
    fn test_selected_program_is_spawned() {
        let mut executor = ProcessExecutor::new("python3".into(), vec![], FileEnv::new());
        let failure = executor
            .execute_in("hltex-definitely-not-a-real-interpreter", "print(1)")
            .unwrap_err();
        match failure {
            ExecutionFailure::Spawn(message) => {
                assert!(message.contains("hltex-definitely-not-a-real-interpreter"))
            }
            other => panic!("unexpected failure {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let mut executor = ProcessExecutor::new(
            "hltex-definitely-not-a-real-interpreter".into(),
            vec![],
            FileEnv::new(),
        );
        assert!(matches!(
            executor.execute("print(1)"),
            Err(ExecutionFailure::Spawn(_))
        ));
    }

    #[test]
    fn test_rejects_nested_file_names() {
        let mut files = FileEnv::new();
        files.insert("../escape.txt".into(), "nope".into());
        let mut executor = ProcessExecutor::new("python3".into(), vec![], files);
        assert!(matches!(
            executor.execute("print(1)"),
            Err(ExecutionFailure::Spawn(_))
        ));
    }

    #[test]
    #[ignore = "requires python3"]
    fn test_python_state_persists_within_run() {
        let mut executor = ProcessExecutorFactory::default().create(&FileEnv::new());
        assert_eq!(executor.execute("x = 20").unwrap(), "");
        assert_eq!(executor.execute("print(x + 1)").unwrap(), "21\n");
    }

    #[test]
    #[ignore = "requires python3"]
    fn test_interpreters_keep_separate_state() {
        let mut executor = ProcessExecutorFactory::default().create(&FileEnv::new());
        assert_eq!(executor.execute("x = 1").unwrap(), "");
        assert_eq!(executor.execute_in("python3", "print(x)").unwrap(), "1\n");
        assert!(matches!(
            executor.execute_in("python", "print(x)"),
            Err(ExecutionFailure::Raised(_)) | Err(ExecutionFailure::Spawn(_))
        ));
    }

    #[test]
    #[ignore = "requires python3"]
    fn test_python_exception_is_raised_failure() {
        let mut executor = ProcessExecutorFactory::default().create(&FileEnv::new());
        let failure = executor.execute("raise ValueError('bad')").unwrap_err();
        assert_eq!(failure, ExecutionFailure::Raised("ValueError: bad".into()));
    }

    #[test]
    #[ignore = "requires python3"]
    fn test_python_sees_auxiliary_files() {
        let mut files = FileEnv::new();
        files.insert("data.txt".into(), "42".into());
        let mut executor = ProcessExecutorFactory::default().create(&files);
        assert_eq!(
            executor.execute("print(open('data.txt').read())").unwrap(),
            "42\n"
        );
    }
}
