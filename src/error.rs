//! Failures reported at the process boundary.
//!
//! Everything else travels as a plain `anyhow::Error` with context attached.
//! Any fatal error exits with status 1; a failed command's own status only
//! appears in the diagnostic.

use thiserror::Error;

/// Errors whose kind matters in the final diagnostic
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The access token environment variable is missing or empty
    #[error("please export {0} to a valid GitHub API token")]
    MissingCredential(String),

    /// An external command exited unsuccessfully
    #[error("`{command}` failed with {}{}", describe_status(.status), describe_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// A command touching a credential-bearing URL failed; neither its
    /// arguments nor its output are echoed
    #[error("{operation} failed with {} (details omitted for security)", describe_status(.status))]
    Redacted {
        operation: String,
        status: Option<i32>,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}
