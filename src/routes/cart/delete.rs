use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::extractors::IsUser, db_interaction::{remove_from_cart, CartError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::cart_error_status;

#[derive(Error)]
pub enum DeleteCartError{
    #[error("{0}")]
    CartError(#[from] CartError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for DeleteCartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for DeleteCartError {
    fn status_code(&self) -> StatusCode {
        match self {
            DeleteCartError::CartError(e) => cart_error_status(e),
            DeleteCartError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Removing item from cart",
    skip(pool, uid)
)]
pub async fn delete_cart_item(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, DeleteCartError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    remove_from_cart(conn, uid.0, product_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
