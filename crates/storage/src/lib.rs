use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{AuthCode, GuestId},
    protocol::{Guest, GuestRecord},
};

const GUEST_COLUMNS: &str = "id, user_name, password_hash, invitees, country, language, \
     modification, food_requirements, needs_accomodation, needs_passage, confirmed, auth_code";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredGuest {
    pub id: GuestId,
    pub user_name: String,
    pub password_hash: String,
    pub country: String,
    pub language: String,
    pub record: GuestRecord,
    pub auth_code: AuthCode,
}

impl StoredGuest {
    /// Public view of the guest, without the password hash.
    pub fn into_public(self) -> Guest {
        Guest {
            id: self.id,
            user_name: self.user_name,
            country: self.country,
            language: self.language,
            record: self.record,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewGuestRow<'a> {
    pub user_name: &'a str,
    pub password_hash: &'a str,
    pub country: &'a str,
    pub language: &'a str,
    pub record: &'a GuestRecord,
    pub auth_code: AuthCode,
}

#[derive(Debug, Clone)]
pub struct StoredToken {
    pub token: String,
    pub user_name: String,
    pub auth_code: AuthCode,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a guest and returns its generated id, or `None` when the user name is taken.
    pub async fn create_guest(&self, guest: &NewGuestRow<'_>) -> Result<Option<GuestId>> {
        let id = GuestId::generate();
        let row = sqlx::query(
            "INSERT INTO guests (id, user_name, password_hash, invitees, country, language,
                 modification, food_requirements, needs_accomodation, needs_passage, confirmed,
                 auth_code, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_name) DO NOTHING
             RETURNING id",
        )
        .bind(id.as_str())
        .bind(guest.user_name)
        .bind(guest.password_hash)
        .bind(i64::from(guest.record.invitees))
        .bind(guest.country)
        .bind(guest.language)
        .bind(&guest.record.modification)
        .bind(&guest.record.food_requirements)
        .bind(guest.record.needs_accomodation)
        .bind(guest.record.needs_passage)
        .bind(guest.record.confirmed)
        .bind(i64::from(guest.auth_code.0))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to insert guest '{}'", guest.user_name))?;
        Ok(row.map(|r| GuestId(r.get::<String, _>(0))))
    }

    pub async fn guest_by_user_name(&self, user_name: &str) -> Result<Option<StoredGuest>> {
        let row = sqlx::query(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE user_name = ?"
        ))
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(guest_from_row).transpose()
    }

    pub async fn guest_by_id(&self, id: &GuestId) -> Result<Option<StoredGuest>> {
        let row = sqlx::query(&format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(guest_from_row).transpose()
    }

    pub async fn list_guests(&self) -> Result<Vec<StoredGuest>> {
        let rows = sqlx::query(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests ORDER BY user_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(guest_from_row).collect()
    }

    /// Updates the fields a guest may edit. Invitee count, identity and
    /// credentials are left untouched. Returns `false` when no such guest exists.
    pub async fn update_guest_details(&self, id: &GuestId, record: &GuestRecord) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE guests
             SET modification = ?, food_requirements = ?, needs_accomodation = ?,
                 needs_passage = ?, confirmed = ?
             WHERE id = ?",
        )
        .bind(&record.modification)
        .bind(&record.food_requirements)
        .bind(record.needs_accomodation)
        .bind(record.needs_passage)
        .bind(record.confirmed)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update guest {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_token(&self, token: &str, user_name: &str, auth_code: AuthCode) -> Result<()> {
        anyhow::ensure!(!token.is_empty(), "no token provided");
        anyhow::ensure!(!user_name.is_empty(), "no user provided");
        anyhow::ensure!(auth_code.is_valid(), "auth code {} is not valid", auth_code.0);

        sqlx::query(
            "INSERT INTO tokens (token, user_name, auth_code, valid, created_at)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(token)
        .bind(user_name)
        .bind(i64::from(auth_code.0))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to record issued token")?;
        Ok(())
    }

    pub async fn token(&self, token: &str) -> Result<Option<StoredToken>> {
        let row = sqlx::query(
            "SELECT token, user_name, auth_code, valid, created_at FROM tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            Ok(StoredToken {
                token: r.try_get("token")?,
                user_name: r.try_get("user_name")?,
                auth_code: auth_code_from(r.try_get("auth_code")?)?,
                valid: r.try_get("valid")?,
                created_at: r.try_get("created_at")?,
            })
        })
        .transpose()
    }

    pub async fn set_token_validity(&self, token: &str, valid: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE tokens SET valid = ? WHERE token = ?")
            .bind(valid)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Invalidates every token issued to `user_name`, returning how many were revoked.
    pub async fn revoke_tokens_for_user(&self, user_name: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE tokens SET valid = 0 WHERE user_name = ? AND valid = 1")
            .bind(user_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn guest_from_row(row: &SqliteRow) -> Result<StoredGuest> {
    let invitees: i64 = row.try_get("invitees")?;
    Ok(StoredGuest {
        id: GuestId(row.try_get("id")?),
        user_name: row.try_get("user_name")?,
        password_hash: row.try_get("password_hash")?,
        country: row.try_get("country")?,
        language: row.try_get("language")?,
        record: GuestRecord {
            invitees: u32::try_from(invitees)
                .with_context(|| format!("invitee count {invitees} out of range"))?,
            modification: row.try_get("modification")?,
            food_requirements: row.try_get("food_requirements")?,
            needs_accomodation: row.try_get("needs_accomodation")?,
            needs_passage: row.try_get("needs_passage")?,
            confirmed: row.try_get("confirmed")?,
        },
        auth_code: auth_code_from(row.try_get("auth_code")?)?,
    })
}

fn auth_code_from(raw: i64) -> Result<AuthCode> {
    u32::try_from(raw)
        .map(AuthCode)
        .with_context(|| format!("auth code {raw} out of range"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
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
#[path = "tests/lib_tests.rs"]
mod tests;
