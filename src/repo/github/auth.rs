use std::process::Command;

use anyhow::{Result, anyhow};

const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

fn token_from_env() -> Result<Option<String>> {
    for name in TOKEN_ENV_VARS {
        match std::env::var(name) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(anyhow!("token env {name} is set but empty; please re-export"));
                }
                return Ok(Some(trimmed.to_string()));
            }
            Err(std::env::VarError::NotPresent) => continue,
            Err(e) => return Err(anyhow!("failed to read env {name}: {e}")),
        }
    }
    Ok(None)
}

fn token_from_gh_cli() -> Result<String> {
    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);

    if let Ok(host) = std::env::var("GH_HOST") {
        let host = host.trim();
        if !host.is_empty() {
            cmd.args(["--hostname", host]);
        }
    }

    let output = cmd
        .output()
        .map_err(|e| anyhow!("failed to execute `gh auth token`: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "`gh auth token` failed (exit {}): {}",
            output.status,
            stderr.trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let token = stdout.trim();
    if token.is_empty() {
        return Err(anyhow!("`gh auth token` returned empty stdout"));
    }
    Ok(token.to_string())
}

/// Resolve the GitHub token: `GITHUB_TOKEN`/`GH_TOKEN` env first, then
/// `gh auth token` (honoring `GH_HOST`).
pub fn resolve_github_token() -> Result<String> {
    if let Some(token) = token_from_env()? {
        return Ok(token);
    }
    token_from_gh_cli()
}
