use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;

use crate::{auth::extractors::IsUser, db_interaction::{get_cart, CartError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::cart_error_status;

#[derive(Error)]
pub enum GetCartError{
    #[error("{0}")]
    CartError(#[from] CartError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetCartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetCartError {
    fn status_code(&self) -> StatusCode {
        match self {
            GetCartError::CartError(e) => cart_error_status(e),
            GetCartError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting cart",
    skip(pool, uid)
)]
pub async fn get_user_cart(
    pool: web::Data<DbPool>,
    uid: IsUser
) -> Result<HttpResponse, GetCartError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(get_cart(conn, uid.0).await?))
}
