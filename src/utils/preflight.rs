//! Preflight validation checks for early failure detection
//!
//! These run before any history query so that a missing tool fails fast
//! with a clear message.

use anyhow::{bail, Context, Result};

/// Validate the git executable can be run
///
/// Returns the version line reported by `<program> --version`.
pub fn check_git_binary(program: &str) -> Result<String> {
    let output = std::process::Command::new(program)
        .arg("--version")
        .output()
        .with_context(|| {
            format!(
                "Failed to run '{program}'. Make sure git is installed and in PATH, \
                 or set GIT_INTRODUCED_GIT."
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("'{program} --version' failed: {}", stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
