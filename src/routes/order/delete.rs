use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::extractors::IsUser, db_interaction::{cancel_order, OrderError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::order_error_status;

#[derive(Error)]
pub enum DeleteOrderError{
    #[error("{0}")]
    OrderError(#[from] OrderError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for DeleteOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for DeleteOrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            DeleteOrderError::OrderError(e) => order_error_status(e),
            DeleteOrderError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

// Cancels a pending order of the caller, stock and coupon use are given back
#[tracing::instrument(
    "Cancelling order",
    skip(pool, uid)
)]
pub async fn delete_order(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, DeleteOrderError> {
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let order = cancel_order(conn, order_id.into_inner(), uid.0).await?;

    Ok(HttpResponse::Ok().json(order))
}
