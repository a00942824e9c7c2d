use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::extractors::IsAdmin, db_interaction::{deactivate_coupon, CouponError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::coupon_error_status;

#[derive(Error)]
pub enum UpdateCouponError{
    #[error("{0}")]
    CouponError(#[from] CouponError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for UpdateCouponError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for UpdateCouponError {
    fn status_code(&self) -> StatusCode {
        match self {
            UpdateCouponError::CouponError(e) => coupon_error_status(e),
            UpdateCouponError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Deactivating coupon",
    skip(pool, _admin)
)]
pub async fn put_coupon_deactivate(
    pool: web::Data<DbPool>,
    coupon_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, UpdateCouponError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(deactivate_coupon(conn, coupon_id.into_inner()).await?))
}
