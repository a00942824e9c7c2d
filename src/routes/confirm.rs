use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{db_interaction::confirm_account, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

// Query parameter of the link sent in the confirmation email
#[derive(Deserialize, Debug)]
pub struct Confirmation{
    id: Uuid
}

#[derive(Error)]
pub enum ConfirmError{
    #[error("Unknown confirmation id")]
    UnknownConfirmation,
    #[error("Failed to confirm account")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for ConfirmError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmError::UnknownConfirmation => StatusCode::UNAUTHORIZED,
            ConfirmError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Confirming account from email link",
    skip(pool)
)]
pub async fn confirm(
    pool: web::Data<DbPool>,
    query: web::Query<Confirmation>
) -> Result<HttpResponse, ConfirmError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let user_id = confirm_account(conn, query.id)
        .await?
        .ok_or(ConfirmError::UnknownConfirmation)?;
    tracing::info!(%user_id, "Account confirmed");

    Ok(HttpResponse::Ok().body("Account confirmed"))
}
