use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;

use crate::{auth::extractors::IsUser, db_interaction::{list_addresses, AddressError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::address_error_status;

#[derive(Error)]
pub enum GetAddressError{
    #[error("{0}")]
    AddressError(#[from] AddressError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetAddressError {
    fn status_code(&self) -> StatusCode {
        match self {
            GetAddressError::AddressError(e) => address_error_status(e),
            GetAddressError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting addresses of user",
    skip(pool, uid)
)]
pub async fn get_addresses(
    pool: web::Data<DbPool>,
    uid: IsUser
) -> Result<HttpResponse, GetAddressError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_addresses(conn, uid.0).await?))
}
