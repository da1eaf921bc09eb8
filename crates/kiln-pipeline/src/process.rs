//! External program invocation shared by the `command` loader and optimizer.
//!
//! The program reads the source on stdin and writes the result to stdout.
//! Recognized options:
//!
//! | option       | meaning                                                     |
//! |--------------|-------------------------------------------------------------|
//! | `binaryPath` | program to run, relative to the project root or on `PATH`   |
//! | `command`    | alias for `binaryPath`                                      |
//! | `args`       | argument list; `[path]` is replaced by the source file path |
//! | `debug`      | when true, `debugFlag` is appended to the arguments         |
//! | `debugFlag`  | flag used for `debug` (default `--debug`)                   |
//! | `cwd`        | working directory relative to the project root              |

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, anyhow, bail};
use serde_json::{Map, Value};

const PATH_PLACEHOLDER: &str = "[path]";
const DEFAULT_DEBUG_FLAG: &str = "--debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Build a command from an options bag. `root` anchors relative paths.
    pub fn from_options(options: &Map<String, Value>, root: &Path) -> anyhow::Result<Self> {
        let program = options
            .get("binaryPath")
            .or_else(|| options.get("command"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("missing 'binaryPath' (or 'command') option"))?;

        // Bare names go through PATH, anything with a separator is project-relative.
        let program = if program.contains('/') || program.contains('\\') {
            root.join(program)
        } else {
            PathBuf::from(program)
        };

        let mut args = match options.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            Some(other) => bail!("'args' must be a list of strings, got {other}"),
        };

        if options.get("debug").and_then(Value::as_bool).unwrap_or(false) {
            let flag = options
                .get("debugFlag")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_DEBUG_FLAG);
            args.push(flag.to_string());
        }

        let cwd = match options.get("cwd").and_then(Value::as_str) {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };

        Ok(Self { program, args, cwd })
    }

    /// Run the program with `input` on stdin and return its stdout.
    ///
    /// `source_path` fills the `[path]` placeholder in arguments.
    pub fn run(&self, input: &[u8], source_path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
        let args: Vec<String> = match source_path {
            Some(path) => {
                let path = path.to_string_lossy();
                self.args
                    .iter()
                    .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
                    .collect()
            }
            None => self.args.clone(),
        };

        tracing::debug!(program = %self.program.display(), ?args, "running external command");

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start '{}'", self.program.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin of '{}' unavailable", self.program.display()))?;

        // Feed stdin from a separate thread so a program that writes before it
        // finishes reading cannot deadlock on a full pipe.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let result = stdin.write_all(input);
                drop(stdin);
                result
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .map_err(|_| anyhow!("stdin writer thread panicked"))?;
            // A program may exit without reading all input; only its exit status counts.
            if let Err(err) = written {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(anyhow::Error::new(err).context("failed to write to stdin"));
                }
            }
            output.context("failed to wait for external command")
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            );
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn debug_appends_flag() {
        let spec = CommandSpec::from_options(
            &options(json!({
                "binaryPath": "node_modules/.bin/elm",
                "args": ["make", "[path]"],
                "debug": true
            })),
            Path::new("/project"),
        )
        .unwrap();

        assert_eq!(spec.program, PathBuf::from("/project/node_modules/.bin/elm"));
        assert_eq!(spec.args, vec!["make", "[path]", "--debug"]);
        assert_eq!(spec.cwd, PathBuf::from("/project"));
    }

    #[test]
    fn bare_command_uses_path_lookup() {
        let spec = CommandSpec::from_options(
            &options(json!({ "command": "terser", "debug": false, "cwd": "js" })),
            Path::new("/project"),
        )
        .unwrap();

        assert_eq!(spec.program, PathBuf::from("terser"));
        assert!(spec.args.is_empty());
        assert_eq!(spec.cwd, PathBuf::from("/project/js"));
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = CommandSpec::from_options(&Map::new(), Path::new("/project")).unwrap_err();
        assert!(err.to_string().contains("binaryPath"));
    }

    #[cfg(unix)]
    #[test]
    fn pipes_stdin_to_stdout() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = CommandSpec::from_options(
            &options(json!({ "command": "tr", "args": ["a-z", "A-Z"] })),
            dir.path(),
        )
        .unwrap();

        let out = spec.run(b"hello", None).unwrap();
        assert_eq!(out, b"HELLO");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = CommandSpec::from_options(
            &options(json!({ "command": "sh", "args": ["-c", "echo broken >&2; exit 3"] })),
            dir.path(),
        )
        .unwrap();

        let err = spec.run(b"", None).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
