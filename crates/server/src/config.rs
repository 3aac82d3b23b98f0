use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub admin_password: Option<String>,
    pub token_ttl_seconds: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: "sqlite://./data/easywed.db".into(),
            jwt_secret: None,
            admin_password: None,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }
}

impl Settings {
    fn apply_file(&mut self, raw: &str) {
        let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
            tracing::warn!("ignoring server.toml: expected a flat table of strings");
            return;
        };
        if let Some(v) = file_cfg.get("bind_addr") {
            self.server_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("database_url") {
            self.database_url = v.clone();
        }
        if let Some(v) = file_cfg.get("jwt_secret") {
            self.jwt_secret = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("admin_password") {
            self.admin_password = Some(v.clone());
        }
        if let Some(parsed) = file_cfg
            .get("token_ttl_seconds")
            .and_then(|v| v.parse::<i64>().ok())
        {
            self.token_ttl_seconds = parsed;
        }
    }

    /// Later names in each list win over earlier ones.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let last = |names: &[&str]| names.iter().filter_map(|&name| lookup(name)).last();

        if let Some(v) = last(&["SERVER_BIND", "APP__BIND_ADDR"]) {
            self.server_bind = v;
        }
        if let Some(v) = last(&["DATABASE_URL", "APP__DATABASE_URL"]) {
            self.database_url = v;
        }
        if let Some(v) = last(&["EASYWED_SECRET", "APP__JWT_SECRET"]) {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = last(&["EASYWED_PWD", "APP__ADMIN_PASSWORD"]) {
            self.admin_password = Some(v);
        }
        if let Some(parsed) = lookup("APP__TOKEN_TTL_SECONDS").and_then(|v| v.parse::<i64>().ok()) {
            self.token_ttl_seconds = parsed;
        }
    }

    /// The signing secret, rejecting a missing or blank value.
    pub fn require_jwt_secret(&self) -> anyhow::Result<String> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
            .map(str::to_string)
            .context("no JWT secret set; configure APP__JWT_SECRET or EASYWED_SECRET")
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        settings.apply_file(&raw);
    }
    settings.apply_env(|name| std::env::var(name).ok());

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    let path = if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        path
    } else if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        path
    } else if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    } else {
        raw_database_url
    };

    let path = path.replace('\\', "/");
    if has_drive_prefix(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
