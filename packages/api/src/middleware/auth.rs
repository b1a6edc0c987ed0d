use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies a bearer token and returns the participant id it carries.
/// Issuing tokens is the identity provider's job; this server only
/// consumes them.
pub fn verify_token(token: &str, secret: &str) -> Result<String, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    let token_data = decode::<TokenClaims>(token, &decoding_key, &Validation::default())
        .map_err(|_| ApiError::Unauthorized)?;
    Ok(token_data.claims.sub)
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(ApiError::Unauthorized)?
            .to_str()
            .map_err(|_| ApiError::Unauthorized)?;

        if !auth_header.starts_with("Bearer ") {
            return Err(ApiError::Unauthorized);
        }
        let token = &auth_header[7..];

        let user_id = verify_token(token, &state.jwt_secret)?;
        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
    }

    fn token_for(sub: &str, secret: &str, exp_offset_secs: i64) -> String {
        let exp = (unix_now() + exp_offset_secs) as usize;
        encode(
            &Header::default(),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    fn unix_now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn valid_token_yields_the_subject() {
        let token = token_for("p1", "secret", 3600);
        assert_eq!(verify_token(&token, "secret").unwrap(), "p1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_for("p1", "secret", 3600);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_for("p1", "secret", -3600);
        assert!(verify_token(&token, "secret").is_err());
    }
}
