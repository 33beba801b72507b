use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use anyhow::Context;
use rand::rngs::OsRng;
use tracing::error;

/// Plaintext hashed into [`dummy_hash`]; never a real credential.
const DUMMY_PASSWORD: &str = "taskvault-login-timing-dummy";

fn hash_blocking(argon2: &Argon2<'_>, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_blocking(argon2: &Argon2<'_>, plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(argon2.verify_password(plain.as_bytes(), &parsed).is_ok())
}

/// Hashes with a fresh random salt; the returned PHC string carries salt and cost.
/// Runs on the blocking pool.
pub async fn hash_password(argon2: &Argon2<'static>, plain: &str) -> anyhow::Result<String> {
    let argon2 = argon2.clone();
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&argon2, &plain))
        .await
        .context("hash task join")?
}

/// Constant-time check of `plain` against a stored hash. A mismatch is
/// `Ok(false)`; only an unparseable stored hash is an error.
pub async fn verify_password(
    argon2: &Argon2<'static>,
    plain: &str,
    hash: &str,
) -> anyhow::Result<bool> {
    let argon2 = argon2.clone();
    let plain = plain.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_blocking(&argon2, &plain, &hash))
        .await
        .context("verify task join")?
}

/// A hash with the configured cost, checked against when a login names an
/// unknown email so that path costs the same as a wrong password.
pub fn dummy_hash(argon2: &Argon2<'_>) -> anyhow::Result<String> {
    hash_blocking(argon2, DUMMY_PASSWORD)
}

#[cfg(test)]
pub(crate) fn test_argon2() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};
    let params = Params::new(8, 1, 1, None).expect("valid test params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}
