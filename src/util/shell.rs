use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;

// Longest stderr excerpt carried into an error message.
const STDERR_TAIL: usize = 512;

/// Replace `{key}` placeholders in a command template.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        out = out.replace(&format!("{{{k}}}"), v);
    }
    out
}

/// Run `sh -c <command>` and return its stdout. Non-zero exit is an error
/// carrying the tail of stderr.
pub async fn run_shell(command: &str) -> Result<Vec<u8>> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to spawn shell for `{command}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let start = stderr.len().saturating_sub(STDERR_TAIL);
        let start = (start..stderr.len()).find(|i| stderr.is_char_boundary(*i)).unwrap_or(stderr.len());
        bail!("`{}` exited with {}: {}", command, output.status, &stderr[start..]);
    }
    Ok(output.stdout)
}
