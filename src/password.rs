use anyhow::Context;
use argon2::{password_hash::{rand_core::OsRng, SaltString}, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use secrecy::{ExposeSecret, SecretString};

use crate::telemetry::spawn_blocking_with_tracing;

// Argon2 PHC string for a plain password, run on a blocking thread by callers
pub fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error>{
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
                            .hash_password(password.expose_secret().as_bytes(), &salt)
                            .map_err(|_| anyhow::anyhow!("Failed to compute password hash"))?
                            .to_string();

    Ok(SecretString::from(password_hash))
}

#[tracing::instrument(
    "Verifying password against stored hash",
    skip_all
)]
pub async fn verify_password(password: SecretString, hashed_password: String) -> Result<bool, anyhow::Error>{
    spawn_blocking_with_tracing(move || {
        let expected = PasswordHash::new(&hashed_password)
            .map_err(|_| anyhow::anyhow!("Failed to parse PasswordHash from stored hashed password"))?;

        Ok(Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &expected)
            .is_ok())
    })
    .await
    .context("Failed due to threadpool error")?
}
