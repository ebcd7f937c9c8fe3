//! Locating the `claude` executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::{ClaudeCodeError, Result};

/// Environment variable consulted when the CLI is not found by the search.
pub const CLI_PATH_ENV_VAR: &str = "CLAUDE_CLI_PATH";

/// Names looked up on `$PATH`, in order.
const PATH_NAMES: [&str; 2] = ["claude", "claude-cli"];

/// Well-known install locations checked after the `$PATH` lookup.
const WELL_KNOWN_PATHS: [&str; 3] = [
    "/usr/local/bin/claude",
    "/usr/bin/claude",
    "/opt/homebrew/bin/claude",
];

/// Locate the Claude CLI executable.
///
/// Resolution order:
/// 1. `explicit` if provided and the file exists.
/// 2. `claude`, then `claude-cli`, resolved via `$PATH`.
/// 3. The well-known install locations.
/// 4. The path in `CLAUDE_CLI_PATH`, if it exists.
///
/// Fails with [`ClaudeCodeError::CliNotFound`] when nothing resolves.
pub fn find_cli(explicit: Option<&Path>) -> Result<PathBuf> {
    let env_override = std::env::var_os(CLI_PATH_ENV_VAR);
    let path = resolve(explicit, &PATH_NAMES, &WELL_KNOWN_PATHS, env_override)?;
    tracing::debug!(path = %path.display(), "resolved claude CLI");
    Ok(path)
}

fn resolve(
    explicit: Option<&Path>,
    path_names: &[&str],
    well_known: &[&str],
    env_override: Option<OsString>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::debug!(path = %path.display(), "explicit CLI path does not exist");
    }

    for name in path_names {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    if let Some(path) = well_known.iter().map(Path::new).find(|p| p.exists()) {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env_override.map(PathBuf::from) {
        if path.exists() {
            return Ok(path);
        }
    }

    Err(ClaudeCodeError::CliNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MISSING_NAME: &str = "claude-code-sdk-test-binary-that-does-not-exist";

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn explicit_path_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let exe = touch(&dir, "claude");
        let got = resolve(Some(&exe), &[MISSING_NAME], &[], None).unwrap();
        assert_eq!(got, exe);
    }

    #[test]
    fn missing_explicit_path_falls_through_to_well_known() {
        let dir = TempDir::new().unwrap();
        let known = touch(&dir, "known-claude");
        let known_str = known.to_str().unwrap();
        let got = resolve(
            Some(Path::new("/definitely/not/here")),
            &[MISSING_NAME],
            &["/also/not/here", known_str],
            None,
        )
        .unwrap();
        assert_eq!(got, known);
    }

    #[test]
    fn well_known_path_beats_env_override() {
        let dir = TempDir::new().unwrap();
        let known = touch(&dir, "known");
        let env = touch(&dir, "from-env");
        let got = resolve(
            None,
            &[MISSING_NAME],
            &[known.to_str().unwrap()],
            Some(env.into_os_string()),
        )
        .unwrap();
        assert_eq!(got, known);
    }

    #[test]
    fn env_override_used_last() {
        let dir = TempDir::new().unwrap();
        let env = touch(&dir, "from-env");
        let got = resolve(None, &[MISSING_NAME], &[], Some(env.clone().into_os_string())).unwrap();
        assert_eq!(got, env);
    }

    #[test]
    fn nothing_resolves_is_cli_not_found() {
        let err = resolve(
            None,
            &[MISSING_NAME],
            &["/not/here"],
            Some(OsString::from("/nor/here")),
        )
        .unwrap_err();
        assert!(matches!(err, ClaudeCodeError::CliNotFound));
    }

    #[test]
    fn path_lookup_finds_shell() {
        // `sh` is on PATH on every platform these tests run on.
        let got = resolve(None, &["sh"], &[], None).unwrap();
        assert!(got.ends_with("sh"));
    }
}
