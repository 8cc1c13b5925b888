use crate::error::ApiResult;
use crate::models::Session;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";

/// Persists the logged-in session between runs
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    /// Store the session as `session.json` inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved session, if any. An unreadable file is treated as logged out.
    pub async fn load(&self) -> ApiResult<Option<Session>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Session>(&raw) {
            Ok(session) if !session.token.is_empty() => {
                debug!("Restored session for {}", session.user.email);
                Ok(Some(session))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> ApiResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> ApiResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn session() -> Session {
        Session {
            token: "mock-jwt-token".to_string(),
            user: User {
                name: "김부동산".to_string(),
                email: "test@test.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn save_then_load_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load().await.unwrap(), None);
        storage.save(&session()).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(session()));

        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::new(dir.path());
        tokio::fs::write(storage.path(), b"{not json").await.unwrap();

        assert_eq!(storage.load().await.unwrap(), None);
    }
}
