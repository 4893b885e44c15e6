//! Thin wrapper around spawning external commands.

use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Run `program` with `args`, returning combined stdout and stderr as text.
///
/// Blocks the calling task for the duration of the process. A non-zero exit
/// becomes [`Error::Exec`] carrying the exit code and the captured output;
/// interpretation of benign failures is left to the caller. No retries here.
pub async fn run(program: &Path, args: &[String]) -> Result<String> {
    let command = format!("{} {}", program.display(), args.join(" "));
    debug!("exec: {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| Error::Spawn {
            command: command.clone(),
            source,
        })?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(Error::Exec {
            command,
            code: output.status.code().unwrap_or(-1),
            output: text,
        });
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = run(&sh(), &args("echo hello")).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let out = run(&sh(), &args("echo out; echo err 1>&2")).await.unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_exec_error() {
        let err = run(&sh(), &args("echo boom 1>&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            Error::Exec { code, output, .. } => {
                assert_eq!(code, 3);
                assert!(output.contains("boom"));
            }
            other => panic!("expected Exec error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let err = run(Path::new("/nonexistent/acme.sh"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
