use std::{error::Error, fmt::Debug};

use actix_web::{cookie::{Cookie, SameSite}, http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{auth::{extractors::AUTH_COOKIE, jwt::Tokenizer}, db_interaction::get_user_from_email, domain::{status::AccountStatus, user_email::UserEmail}, password::verify_password, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Deserialize, Debug)]
pub struct LoginForm{
    pub email: String,
    pub password: SecretString
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse{
    pub token: String
}

#[derive(Error)]
pub enum LoginError{
    #[error("Email or password is incorrect")]
    InvalidCredentials,
    #[error("Account has not been confirmed yet")]
    NotConfirmed,
    #[error("Failed to login")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::NotConfirmed => StatusCode::FORBIDDEN,
            LoginError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Logging in user",
    skip(pool, tokenizer, form),
    fields(email = %form.email)
)]
pub async fn login(
    pool: web::Data<DbPool>,
    tokenizer: web::Data<Tokenizer>,
    form: web::Form<LoginForm>
) -> Result<HttpResponse, LoginError>{
    let form = form.into_inner();
    let email = UserEmail::parse(form.email)
        .map_err(|_| LoginError::InvalidCredentials)?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let Some(user) = get_user_from_email(conn, email.inner()).await? else {
        tracing::info!("No user registered with this email");
        return Err(LoginError::InvalidCredentials)
    };

    if !verify_password(form.password, user.password.clone()).await? {
        tracing::info!("Passwords did not match");
        return Err(LoginError::InvalidCredentials)
    }

    if user.status.as_deref() != Some(AccountStatus::Confirmed.as_str()) {
        return Err(LoginError::NotConfirmed)
    }

    let token = tokenizer.generate_key(&user)
        .context("Failed to generate access token")?;

    let cookie = Cookie::build(AUTH_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(LoginResponse{ token }))
}
