//! Command-line interface for hltex
//! Translates an hltex source file into LaTeX.
//!
//! Usage:
//!   hltex `<path>`                     - Write `<stem>.tex` in the working directory
//!   hltex `<path>` --stdout            - Print the translation instead
//!   hltex `<path>` --file data.csv=in/data.csv
//!                                    - Expose a file to `\pysplice` bodies

use clap::Parser;
use hltex::config::Loader;
use hltex::{FileEnv, Translator};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Configuration file picked up from the working directory when present
const LOCAL_CONFIG: &str = "hltex.toml";

#[derive(Parser)]
#[command(name = "hltex")]
#[command(version, about = "Translate hltex files into LaTeX")]
struct Args {
    /// Path to the hltex file to translate
    file: PathBuf,

    /// Where to write the output (default: `<file stem>.tex` in the working directory)
    #[arg(short, long, value_name = "PATH", conflicts_with = "stdout")]
    out: Option<PathBuf>,

    /// Print the translation to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Configuration file layered over the defaults
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Make a file available to executed bodies, as NAME=PATH
    #[arg(long = "file", value_name = "NAME=PATH", value_parser = parse_file_entry)]
    files: Vec<(String, PathBuf)>,

    /// Never execute `\pysplice` bodies
    #[arg(long)]
    no_exec: bool,

    /// Log what the translator is doing
    #[arg(short, long)]
    verbose: bool,
}

fn parse_file_entry(entry: &str) -> Result<(String, PathBuf), String> {
    match entry.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got `{}`", entry)),
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let source = fs::read_to_string(&args.file).unwrap_or_else(|e| {
        eprintln!("Error reading `{}`: {}", args.file.display(), e);
        process::exit(1);
    });

    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    if args.no_exec {
        loader = loader
            .set_override("pysplice.enabled", false)
            .unwrap_or_else(|e| exit_with(format!("Configuration error: {}", e)));
    }
    let config = loader
        .build()
        .unwrap_or_else(|e| exit_with(format!("Configuration error: {}", e)));

    let mut files = FileEnv::new();
    for (name, path) in &args.files {
        let content = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with(format!("Error reading `{}`: {}", path.display(), e))
        });
        files.insert(name.clone(), content);
    }

    let translator = Translator::new()
        .with_file_env(files)
        .with_shared_executor_factory(config.pysplice.executor_factory());
    let output = translator.translate(&source).unwrap_or_else(|e| {
        eprintln!("{}", e.report(&source));
        process::exit(1);
    });

    if args.stdout {
        print!("{}", output);
        return;
    }

    let out_path = args
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(&args.file, &config.output.extension));
    if let Err(e) = fs::write(&out_path, output) {
        exit_with(format!("Error writing `{}`: {}", out_path.display(), e));
    }
    println!("Wrote output to `{}`", out_path.display());
}

/// `<file stem>.<extension>` in the working directory.
fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "out".into());
    PathBuf::from(stem).with_extension(extension)
}

fn exit_with(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
