//! Minimal CLI: schema → (defaults | coerce | validate)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::json;

use crate::config::Settings;
use crate::form_data::FormData;
use crate::format::format_issues;
use crate::schema::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive defaults for, coerce and validate form submissions against a JSON schema definition
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the value a fresh form starts with
    Defaults(DefaultsOut),
    /// coerce urlencoded bodies into typed values
    Coerce(CoerceOut),
    /// run the full request cycle: read, coerce or parse, validate, format issues
    Validate(ValidateOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema definition (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more input files or glob patterns (e.g. samples/*.txt).
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DefaultsOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CoerceOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// content type the bodies are sent with
    #[arg(long, default_value = "application/x-www-form-urlencoded")]
    content_type: String,

    /// settings file (.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> anyhow::Result<Schema> {
        let bytes = std::fs::read(&self.schema)
            .with_context(|| format!("failed to read schema file ({})", self.schema.display()))?;
        Schema::from_json_slice(&bytes)
            .with_context(|| format!("invalid schema definition ({})", self.schema.display()))
    }
}

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, Vec<u8>) -> anyhow::Result<()>) -> anyhow::Result<()> {
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source = std::fs::read(&source_path)
                .with_context(|| format!("failed to read source file ({})", source_path.display()))?;
            tracing::info!(path = %source_path.display(), bytes = source.len(), "processing input");
            apply(&source_path, source)?;
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Defaults(target) => {
                let schema = target.schema_settings.load()?;
                let defaults = crate::defaults::derive_default(&schema);
                let defaults_src = serde_json::to_string_pretty(&defaults)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &defaults_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{defaults_src}");
                }
            }
            Command::Coerce(target) => {
                let schema = target.schema_settings.load()?;
                target.input_settings.load_process(|path, source| {
                    let form = FormData::from_urlencoded(&source);
                    let value = crate::coerce::coerce_form_data(&schema, &form)
                        .with_context(|| format!("failed to coerce {}", path.display()))?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                })?;
            }
            Command::Validate(target) => {
                let schema = target.schema_settings.load()?;
                let settings = match target.config.as_ref() {
                    Some(path) => Settings::load(path)
                        .with_context(|| format!("invalid settings file ({})", path.display()))?,
                    None => Settings::default(),
                };
                let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
                let mut failures = 0usize;
                target.input_settings.load_process(|path, source| {
                    let request = axum::http::Request::builder()
                        .method("POST")
                        .header(CONTENT_TYPE, &target.content_type)
                        .body(Body::from(source))?;
                    let validated = runtime
                        .block_on(crate::request::validate_request(&schema, request, &settings))
                        .with_context(|| format!("failed to validate {}", path.display()))?;
                    let issues = format_issues(validated.result.issues(), |issue| issue.message.clone());
                    if validated.result.is_success() {
                        eprintln!("{} {}", "✅ valid".green(), path.display());
                    } else {
                        failures += 1;
                        eprintln!("{} {}", "❌ invalid".red(), path.display());
                    }
                    let report = json!({
                        "file": path.display().to_string(),
                        "data": validated.data,
                        "result": validated.result,
                        "issues": issues,
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                })?;
                if failures > 0 {
                    bail!("{failures} submission(s) failed validation");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-forms", "validate", "--schema", "s.json", "--content-type", "application/json", "-i", "a.json", "b.json",
        ])
        .unwrap();
        match cli.cmd {
            Command::Validate(v) => {
                assert_eq!(v.input_settings.input, vec!["a.json", "b.json"]);
                assert_eq!(v.content_type, "application/json");
                assert!(v.config.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(CommandLineInterface::try_parse_from(["schema-forms", "coerce", "--schema", "s.json"]).is_err());
    }

    #[test]
    fn literal_paths_pass_through_and_empty_globs_fail() {
        let paths = resolve_file_path_patterns(["does/not/exist.txt"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("does/not/exist.txt")]);
        assert!(resolve_file_path_patterns(["no-such-dir-*/x.txt"]).is_err());
    }
}
