use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{config, types::Session};

pub struct SessionManager {
    session: Session,
}

impl SessionManager {
    pub fn new(token: String) -> Self {
        SessionManager {
            session: Session {
                token,
                obtained_at: Utc::now().timestamp(),
            },
        }
    }

    pub async fn load() -> Result<Self, String> {
        Self::load_from(&Self::session_path()).await
    }

    pub async fn load_from(path: &Path) -> Result<Self, String> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        let session: Session = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        if session.token.is_empty() {
            return Err("stored session is empty".to_string());
        }
        Ok(Self { session })
    }

    pub async fn persist(&self) -> Result<(), String> {
        self.persist_to(&Self::session_path()).await
    }

    pub async fn persist_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.session).map_err(|e| e.to_string())?;
        async_fs::write(path, json)
            .await
            .map_err(|e| e.to_string())
    }

    pub fn token(&self) -> &str {
        &self.session.token
    }

    pub fn current_session(&self) -> &Session {
        &self.session
    }

    fn session_path() -> PathBuf {
        let mut path = config::data_dir();
        path.push("cache/session.json");
        path
    }
}
