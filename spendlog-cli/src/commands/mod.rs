//! CLI command implementations

pub mod auth;
pub mod categories;
pub mod expense;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use spendlog_core::domain::result::INTERNAL_ERROR_MESSAGE;
use spendlog_core::{OperationResult, SpendlogContext, User};

/// File under the data directory holding the token saved by `sl login`
const SESSION_FILE: &str = "session";

/// Options shared by every command
pub struct Globals {
    pub data_dir: PathBuf,
    token: Option<String>,
}

impl Globals {
    /// `--data-dir` / SPENDLOG_DIR, otherwise ~/.spendlog
    pub fn resolve(data_dir: Option<PathBuf>, token: Option<String>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not find home directory")?
                .join(".spendlog"),
        };
        Ok(Self {
            data_dir,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    /// `--token` / SPENDLOG_TOKEN, otherwise the saved session
    fn token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.trim().to_string());
        }
        match std::fs::read_to_string(self.session_path()) {
            Ok(saved) if !saved.trim().is_empty() => Ok(saved.trim().to_string()),
            Ok(_) => bail!("Not logged in. Run `sl login` first"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!("Not logged in. Run `sl login` first")
            }
            Err(e) => Err(e).context("Failed to read session file"),
        }
    }
}

/// Open the data directory and wire the core services
pub fn get_context(globals: &Globals) -> Result<SpendlogContext> {
    tracing::debug!(data_dir = %globals.data_dir.display(), "opening data directory");
    SpendlogContext::new(&globals.data_dir).context("Failed to initialize spendlog context")
}

/// Resolve the caller before any protected operation
pub async fn gate(ctx: &SpendlogContext, globals: &Globals) -> Result<User> {
    let token = globals.token()?;
    surface(ctx.auth_service.authenticate(&token).await)
}

/// Hand a core result to the user.
///
/// Internal failures are logged in full and shown as a generic message;
/// caller errors are shown verbatim.
pub fn surface<T>(result: spendlog_core::domain::result::Result<T>) -> Result<T> {
    let envelope = OperationResult::from(result);
    match envelope.data {
        Some(data) if envelope.success => Ok(data),
        _ => Err(anyhow!(envelope
            .error
            .unwrap_or_else(|| INTERNAL_ERROR_MESSAGE.to_string()))),
    }
}

/// Save a session token readable only by the current user
pub fn write_session(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, token).context("Failed to save session")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("Failed to restrict session file permissions")?;
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_hides_internal_detail() {
        let err = surface::<()>(Err(spendlog_core::Error::database("disk I/O error at page 7")))
            .unwrap_err();
        assert_eq!(err.to_string(), INTERNAL_ERROR_MESSAGE);

        let err = surface::<()>(Err(spendlog_core::Error::InvalidToken)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_token_flag_wins_over_session() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_path_buf();
        write_session(&data_dir.join(SESSION_FILE), "saved-token\n").unwrap();

        let globals = Globals::resolve(Some(data_dir.clone()), Some("flag-token".into())).unwrap();
        assert_eq!(globals.token().unwrap(), "flag-token");

        let globals = Globals::resolve(Some(data_dir.clone()), None).unwrap();
        assert_eq!(globals.token().unwrap(), "saved-token");

        std::fs::remove_file(globals.session_path()).unwrap();
        assert!(globals.token().is_err());
    }
}
