use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::extractors::IsUser, db_interaction::{delete_address, AddressError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::address_error_status;

#[derive(Error)]
pub enum DeleteAddressError{
    #[error("{0}")]
    AddressError(#[from] AddressError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for DeleteAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for DeleteAddressError {
    fn status_code(&self) -> StatusCode {
        match self {
            DeleteAddressError::AddressError(e) => address_error_status(e),
            DeleteAddressError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Deleting address",
    skip(pool, uid)
)]
pub async fn delete_user_address(
    pool: web::Data<DbPool>,
    address_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, DeleteAddressError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    delete_address(conn, uid.0, address_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
