use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::CredentialsRequest,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    db::RepoError,
    error::AppError,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Width of the `users.email` column.
pub const MAX_EMAIL_LEN: usize = 191;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        warn!(len = email.len(), "email too long");
        return Err(AppError::Validation(format!(
            "email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("invalid email".into()));
    }
    Ok(())
}

/// Creates a user. Email is trimmed but otherwise stored as given.
pub async fn register(state: &AppState, mut req: CredentialsRequest) -> Result<User, AppError> {
    req.email = req.email.trim().to_string();
    validate_email(&req.email)?;

    let min = state.config.password.min_length;
    if req.password.chars().count() < min {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "password must be at least {min} characters"
        )));
    }

    let hash = hash_password(&state.argon2, &req.password).await?;

    let user = match state.users.create(&req.email, &hash).await {
        Ok(user) => user,
        Err(RepoError::Conflict) => {
            warn!(email = %req.email, "email already registered");
            return Err(AppError::Conflict("email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password produce the same error.
pub async fn authenticate(state: &AppState, mut req: CredentialsRequest) -> Result<User, AppError> {
    req.email = req.email.trim().to_string();
    validate_email(&req.email)?;
    if req.password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    let Some(user) = state.users.find_by_email(&req.email).await? else {
        // same Argon2 cost as a wrong password
        verify_password(&state.argon2, &req.password, &state.dummy_hash).await?;
        warn!("login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&state.argon2, &req.password, &user.password_hash).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}
