use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use pulse_db::Database;
use pulse_db::models::UserRow;
use pulse_types::api::{Claims, LoginRequest, LoginResponse};
use pulse_types::models::{Role, User};

use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = match (req.email, req.password) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            return Err(ApiError::Validation(
                "Please provide email and password".to_string(),
            ));
        }
    };

    // Unknown email and wrong password are indistinguishable to the caller
    let user = state
        .db
        .get_user_by_email(&email)?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token = create_token(&state.jwt_secret, &user.id, Role::parse(&user.role))?;

    Ok(Json(LoginResponse {
        user: public_user(user),
        token,
    }))
}

/// The auth middleware already resolved the token to a user.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

/// Verifies signature and expiry, then re-reads the user so a deleted account
/// invalidates its outstanding tokens.
pub fn resolve_token(state: &AppState, token: &str) -> Result<User, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Not authorized, token failed".to_string()))?;

    let user = state
        .db
        .get_user_by_id(&token_data.claims.sub)?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, user not found".to_string()))?;

    Ok(public_user(user))
}

pub fn create_token(secret: &str, user_id: &str, role: Role) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("failed to sign token: {}", e))?;

    Ok(token)
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn public_user(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        name: row.name,
        role: Role::parse(&row.role),
    }
}
