use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::AuthorizationError(
                "administrator role required".to_string(),
            ))
        }
    }
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(e.to_string()))
}

pub fn issue_token(
    user_id: Uuid,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: (Utc::now().timestamp() as usize) + expiration_seconds as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip_preserves_identity() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "ADMIN", "test-secret", 3600).unwrap();

        let claims = decode_claims(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.is_admin());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), "CUSTOMER", "secret-a", 3600).unwrap();
        assert!(decode_claims(&token, "secret-b").is_err());
    }
}
