use shared::{
    domain::{ApiCode, AuthCode, GuestId, ADMIN_USER_NAME},
    error::{ApiError, ErrorCode},
    protocol::{AuthRequest, AuthResponse, Guest, GuestUpdate, NewGuest},
};
use storage::{NewGuestRow, Storage};
use tracing::{info, warn};

pub mod password;
pub mod token;

pub use password::CredentialHasher;
pub use token::{Claims, TokenConfig};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub tokens: TokenConfig,
    pub hasher: CredentialHasher,
}

impl ApiContext {
    pub fn new(storage: Storage, tokens: TokenConfig) -> Self {
        Self {
            storage,
            tokens,
            hasher: CredentialHasher::new(),
        }
    }
}

/// Exchanges a user name and password for a bearer token.
pub async fn authenticate_guest(
    ctx: &ApiContext,
    req: &AuthRequest,
) -> Result<AuthResponse, ApiError> {
    let candidate = ctx
        .storage
        .guest_by_user_name(&req.user_name)
        .await
        .map_err(internal)?;
    let Some(guest) = candidate else {
        ctx.hasher.verify_dummy_password(&req.password);
        warn!(user_name = %req.user_name, "auth: unknown user");
        return Err(ApiError::unauthorized("not authorized"));
    };
    if !ctx.hasher.verify_password(&req.password, &guest.password_hash) {
        warn!(user_name = %req.user_name, "auth: password mismatch");
        return Err(ApiError::unauthorized("not authorized"));
    }

    let jwt_token = token::mint_token(&ctx.tokens, &guest.user_name, &guest.id)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("token mint failed: {e}")))?;
    ctx.storage
        .insert_token(&jwt_token, &guest.user_name, guest.auth_code)
        .await
        .map_err(internal)?;

    info!(user_name = %guest.user_name, guest_id = %guest.id, "auth: token issued");
    Ok(AuthResponse {
        user_name: guest.user_name,
        id: guest.id,
        jwt_token,
    })
}

/// Validates the `Authorization` header value for `api` and returns the token claims.
pub async fn authorize(
    ctx: &ApiContext,
    authorization: Option<&str>,
    api: ApiCode,
) -> Result<Claims, ApiError> {
    let raw = bearer_token(authorization)
        .ok_or_else(|| ApiError::unauthorized("missing auth token"))?;
    let claims = token::verify_token(&ctx.tokens, raw)
        .map_err(|e| ApiError::unauthorized(format!("not valid token: {e}")))?;

    let issued = ctx
        .storage
        .token(raw)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::unauthorized("unknown token"))?;
    if !issued.valid {
        return Err(ApiError::unauthorized("token has been revoked"));
    }
    if issued.user_name != claims.user {
        return Err(ApiError::unauthorized("token user mismatch"));
    }
    if !issued.auth_code.permits(api) {
        warn!(
            user_name = %claims.user,
            api_code = api.value(),
            auth_code = issued.auth_code.0,
            "auth: permission denied"
        );
        return Err(ApiError::forbidden("user is not authorized"));
    }
    Ok(claims)
}

pub async fn get_guest_by_user_name(
    ctx: &ApiContext,
    authorization: Option<&str>,
    user_name: &str,
) -> Result<Guest, ApiError> {
    let claims = authorize(ctx, authorization, ApiCode::ReadGuest).await?;
    if claims.user != user_name {
        return Err(ApiError::forbidden("user is not authorized"));
    }
    let guest = ctx
        .storage
        .guest_by_user_name(user_name)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "guest not found"))?;
    Ok(guest.into_public())
}

pub async fn list_guests(
    ctx: &ApiContext,
    authorization: Option<&str>,
) -> Result<Vec<Guest>, ApiError> {
    authorize(ctx, authorization, ApiCode::ReadAll).await?;
    let guests = ctx.storage.list_guests().await.map_err(internal)?;
    Ok(guests.into_iter().map(|g| g.into_public()).collect())
}

pub async fn create_guest(
    ctx: &ApiContext,
    authorization: Option<&str>,
    new_guest: NewGuest,
) -> Result<Guest, ApiError> {
    let claims = authorize(ctx, authorization, ApiCode::CreateGuest).await?;
    let guest = register_guest(ctx, new_guest, AuthCode::GUEST).await?;
    info!(created_by = %claims.user, user_name = %guest.user_name, "guest created");
    Ok(guest)
}

/// Updates the editable part of the caller's own record.
pub async fn update_guest(
    ctx: &ApiContext,
    authorization: Option<&str>,
    path_id: &GuestId,
    update: GuestUpdate,
) -> Result<Guest, ApiError> {
    let claims = authorize(ctx, authorization, ApiCode::UpdateGuest).await?;
    if update.id != *path_id {
        return Err(ApiError::forbidden("guest id does not match request path"));
    }
    if claims.id != path_id.as_str() {
        return Err(ApiError::forbidden("user is not authorized"));
    }

    let updated = ctx
        .storage
        .update_guest_details(path_id, &update.record)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "guest not found"));
    }

    let guest = ctx
        .storage
        .guest_by_id(path_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "guest not found"))?;
    info!(
        user_name = %guest.user_name,
        confirmed = guest.record.confirmed,
        "guest rsvp updated"
    );
    Ok(guest.into_public())
}

/// Hashes the password and stores a new guest with the given grants.
pub async fn register_guest(
    ctx: &ApiContext,
    new_guest: NewGuest,
    auth_code: AuthCode,
) -> Result<Guest, ApiError> {
    let user_name = new_guest.user_name.trim();
    if user_name.is_empty() {
        return Err(ApiError::validation("no user name provided"));
    }
    if !auth_code.is_valid() {
        return Err(ApiError::validation("auth code not valid"));
    }
    let password_hash = ctx.hasher.hash_password(&new_guest.password)?;

    let id = ctx
        .storage
        .create_guest(&NewGuestRow {
            user_name,
            password_hash: &password_hash,
            country: &new_guest.country,
            language: &new_guest.language,
            record: &new_guest.record,
            auth_code,
        })
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::Conflict,
                format!("user name '{user_name}' is already taken"),
            )
        })?;

    Ok(Guest {
        id,
        user_name: user_name.to_string(),
        country: new_guest.country,
        language: new_guest.language,
        record: new_guest.record,
    })
}

/// Creates the admin account with every grant unless it already exists.
/// Returns whether a new account was created.
pub async fn ensure_admin(ctx: &ApiContext, password: &str) -> Result<bool, ApiError> {
    let existing = ctx
        .storage
        .guest_by_user_name(ADMIN_USER_NAME)
        .await
        .map_err(internal)?;
    if existing.is_some() {
        return Ok(false);
    }
    register_guest(
        ctx,
        NewGuest {
            user_name: ADMIN_USER_NAME.to_string(),
            password: password.to_string(),
            country: String::new(),
            language: String::new(),
            record: Default::default(),
        },
        AuthCode::ADMIN,
    )
    .await?;
    info!("admin account created");
    Ok(true)
}

pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    let value = authorization?.trim_start();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
