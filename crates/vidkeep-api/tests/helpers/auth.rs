use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;
use vidkeep_api::auth::JwtClaims;

/// Must match the JWT secret in the test config.
pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret";

/// A bearer token for `user_id`, valid for ten minutes.
pub fn mint_token(user_id: Uuid) -> String {
    mint_token_with(user_id, chrono::Utc::now().timestamp() + 600, TEST_JWT_SECRET)
}

pub fn mint_token_with(user_id: Uuid, exp: i64, secret: &str) -> String {
    let claims = JwtClaims {
        sub: user_id,
        exp,
        iat: Some(chrono::Utc::now().timestamp()),
        nbf: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
