use crate::error::AppError;
use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(e.to_string()))
}

/// Tokens are issued by the identity service; tests mint their own.
#[cfg(test)]
pub fn generate_token(
    token_type: crate::models::TokenType,
    user_id: i64,
    username: &str,
    role: u8,
    employee_id: Option<i64>,
    secret: &str,
    ttl: usize,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        user_id,
        sub: username.to_string(),
        role,
        exp: now + ttl,
        jti: uuid::Uuid::new_v4().to_string(),
        token_type,
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
