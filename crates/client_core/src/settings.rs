use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const CONFIG_FILE_NAME: &str = "rsvp.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub session_file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    session_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_file: default_session_file(),
        }
    }
}

impl ClientSettings {
    /// Defaults, then `config_file` if it exists, then explicit overrides.
    pub fn load(
        config_file: &Path,
        api_base_url: Option<String>,
        session_file: Option<PathBuf>,
    ) -> Self {
        let mut settings = Self::default();
        match fs::read_to_string(config_file) {
            Ok(raw) => settings.apply_file(&raw),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %config_file.display(), %error, "settings: unreadable config file ignored")
            }
        }
        if let Some(url) = api_base_url.filter(|u| !u.trim().is_empty()) {
            settings.api_base_url = url;
        }
        if let Some(path) = session_file {
            settings.session_file = path;
        }
        settings
    }

    fn apply_file(&mut self, raw: &str) {
        let file = match toml::from_str::<FileSettings>(raw) {
            Ok(file) => file,
            Err(error) => {
                warn!(%error, "settings: malformed config file ignored");
                return;
            }
        };
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(path) = file.session_file {
            self.session_file = path;
        }
    }
}

pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("easywed")
        .join("session.json")
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
