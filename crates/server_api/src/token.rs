use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::GuestId;

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: String,
    pub id: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub fn mint_token(
    cfg: &TokenConfig,
    user_name: &str,
    guest_id: &GuestId,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = Claims {
        user: user_name.to_string(),
        id: guest_id.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

/// Checks signature, algorithm and expiry.
pub fn verify_token(cfg: &TokenConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            secret: "s3cret".into(),
            ttl_seconds: 3600,
        }
    }

    #[test]
    fn minted_token_carries_user_and_id_claims() {
        let cfg = config();
        let token = mint_token(&cfg, "telemachus", &GuestId::from("g-1")).expect("mint");
        let claims = verify_token(&cfg, &token).expect("verify");
        assert_eq!(claims.user, "telemachus");
        assert_eq!(claims.id, "g-1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let cfg = config();
        let id = GuestId::from("g-1");
        let first = mint_token(&cfg, "telemachus", &id).expect("mint");
        let second = mint_token(&cfg, "telemachus", &id).expect("mint");
        assert_ne!(first, second);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = mint_token(&config(), "telemachus", &GuestId::from("g-1")).expect("mint");
        let other = TokenConfig {
            secret: "different".into(),
            ttl_seconds: 3600,
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = TokenConfig {
            secret: "s3cret".into(),
            ttl_seconds: -3600,
        };
        let token = mint_token(&cfg, "telemachus", &GuestId::from("g-1")).expect("mint");
        assert!(verify_token(&cfg, &token).is_err());
    }
}
