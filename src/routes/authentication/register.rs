use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::{db_interaction::{insert_user_into_database, UserInsertError}, domain::{status::AccountRole, user_email::UserEmail}, email_client::{EmailClient, EmailMessage}, startup::BaseUrl, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Deserialize, Debug)]
pub struct RegistrationForm{
    email: String,
    name: String,
    password: SecretString,
    confirm_password: SecretString,
    #[serde(default)]
    as_seller: bool
}

#[derive(Error)]
pub enum RegisterError{
    #[error("the password and confirm passwords don't match")]
    PasswordNotMatching,
    #[error("{0}")]
    InvalidInput(String),
    #[error("user already exists")]
    UserAlreadyExists(#[source] UserInsertError),
    #[error("unexpected error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for RegisterError{
    fn status_code(&self) -> StatusCode {
        match self {
            RegisterError::PasswordNotMatching | RegisterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RegisterError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            RegisterError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "User registration started",
    skip(pool, email_client, base_url, form),
    fields(email = %form.email)
)]
pub async fn register(
    form: web::Form<RegistrationForm>,
    pool: web::Data<DbPool>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<BaseUrl>
) -> Result<HttpResponse, RegisterError> {
    let form = form.into_inner();

    if form.password.expose_secret() != form.confirm_password.expose_secret(){
        return Err(RegisterError::PasswordNotMatching)
    }

    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(RegisterError::InvalidInput("name must not be empty".to_string()))
    }

    let email = UserEmail::parse(form.email)
        .map_err(RegisterError::InvalidInput)?;

    let role = if form.as_seller { AccountRole::Seller } else { AccountRole::Customer };

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let confirmation_id = insert_user_into_database(conn, name.clone(), email.inner(), form.password, role)
        .await
        .map_err(|e| match e {
            UserInsertError::EmailNotUnique(_) => RegisterError::UserAlreadyExists(e),
            e => RegisterError::UnexpectedError(anyhow::Error::new(e))
        })?;

    let conf_link = format!("{}confirm?id={}", base_url.0, confirmation_id);

    email_client.send(&email, &EmailMessage::account_confirmation(&name, &conf_link))
        .await
        .context("Failed to send confirmation email")?;

    Ok(HttpResponse::Ok().finish())
}
