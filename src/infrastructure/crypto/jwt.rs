//! JWT Token handling
//!
//! Access and refresh tokens share one claim shape and differ only in
//! `token_type` and lifetime. Every token carries a `jti` so refresh tokens
//! can be revoked on logout.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token lifetime in hours
    pub expiration_hours: i64,
    /// Refresh token lifetime in days
    pub refresh_expiration_days: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_hours: 24,
            refresh_expiration_days: 7,
            issuer: "storemap".to_string(),
        }
    }
}

/// Access or refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: String,
    pub token_type: TokenType,
    /// Unique token id
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl TokenClaims {
    pub fn new(
        user_id: &str,
        username: &str,
        role: &str,
        token_type: TokenType,
        config: &JwtConfig,
    ) -> Self {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => Duration::hours(config.expiration_hours),
            TokenType::Refresh => Duration::days(config.refresh_expiration_days),
        };

        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Sign a token of the given type for a user
pub fn create_token(
    user_id: &str,
    username: &str,
    role: &str,
    token_type: TokenType,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, username, role, token_type, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer and expiry, then decode the claims
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let cfg = config();
        let token = create_token("u-1", "lan", "guest", TokenType::Access, &cfg).unwrap();
        let claims = verify_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, "guest");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let cfg = config();
        let access = TokenClaims::new("u", "n", "guest", TokenType::Access, &cfg);
        let refresh = TokenClaims::new("u", "n", "guest", TokenType::Refresh, &cfg);
        assert!(refresh.exp > access.exp);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("u", "n", "guest", TokenType::Access, &config()).unwrap();
        let other = JwtConfig {
            secret: "other".into(),
            ..Default::default()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = JwtConfig {
            expiration_hours: -1,
            ..config()
        };
        let token = create_token("u", "n", "guest", TokenType::Access, &cfg).unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }
}
