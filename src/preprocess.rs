//! External preprocessing of `fpp_extensions` sources.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Default command line: the C preprocessor in traditional mode.
pub const DEFAULT_COMMAND: &str = "cpp -traditional-cpp -E -D__GFORTRAN__";

pub trait Preprocessor: Sync {
    /// Return the preprocessed text of `source`, read from `path`.
    fn preprocess(&self, source: &str, path: &Path) -> Result<String>;
}

/// Runs a command line, feeding the source on stdin and reading stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPreprocessor {
    program: String,
    args: Vec<String>,
}

impl CommandPreprocessor {
    /// Build from a whitespace-separated command line, adding `-D` for each
    /// macro and `-I` for each include directory. `None` for an empty command.
    #[must_use]
    pub fn new(command: &str, macros: &[String], include: &[PathBuf]) -> Option<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()?;
        let mut args: Vec<String> = words.collect();
        args.extend(macros.iter().map(|m| format!("-D{m}")));
        args.extend(include.iter().map(|dir| format!("-I{}", dir.display())));
        Some(Self { program, args })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn failure(&self, path: &Path, message: impl Into<String>) -> Error {
        Error::Preprocess {
            path: path.to_path_buf(),
            message: format!("`{}`: {}", self.program, message.into()),
        }
    }
}

impl Preprocessor for CommandPreprocessor {
    fn preprocess(&self, source: &str, path: &Path) -> Result<String> {
        debug!(file:? = path, program = self.program.as_str(); "preprocessing");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(path, e.to_string()))?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(self.failure(path, "stdin unavailable"));
        };
        // Write from another thread so a full stdout pipe cannot block us.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("writer thread panicked")));
            output.and_then(|o| written.map(|()| o))
        })
        .map_err(|e| self.failure(path, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(
                path,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_assembly() {
        let pp = CommandPreprocessor::new(
            DEFAULT_COMMAND,
            &["DEBUG".to_string(), "N=4".to_string()],
            &[PathBuf::from("inc")],
        )
        .unwrap();
        assert_eq!(pp.program(), "cpp");
        assert_eq!(
            pp.args(),
            &["-traditional-cpp", "-E", "-D__GFORTRAN__", "-DDEBUG", "-DN=4", "-Iinc"]
        );
    }

    #[test]
    fn test_empty_command() {
        assert!(CommandPreprocessor::new("   ", &[], &[]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_passthrough_command() {
        let pp = CommandPreprocessor::new("cat", &[], &[]).unwrap();
        let out = pp.preprocess("module m\nend module m\n", Path::new("m.F90")).unwrap();
        assert_eq!(out, "module m\nend module m\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command() {
        let pp = CommandPreprocessor::new("false", &[], &[]).unwrap();
        let err = pp.preprocess("x", Path::new("m.F90")).unwrap_err();
        assert!(matches!(err, Error::Preprocess { .. }));
    }

    #[test]
    fn test_missing_program() {
        let pp = CommandPreprocessor::new("fordoc-no-such-preprocessor", &[], &[]).unwrap();
        let err = pp.preprocess("x", Path::new("m.F90")).unwrap_err();
        assert!(err.to_string().contains("fordoc-no-such-preprocessor"));
    }
}
