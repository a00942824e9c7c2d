use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsAdmin, db_interaction::{assign_tracking_code, update_order_status, OrderError}, domain::status::OrderStatus, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::order_error_status;

#[derive(Deserialize, Debug)]
pub struct UpdateOrderStatusForm{
    pub status: OrderStatus
}

#[derive(Deserialize, Debug, Validate)]
pub struct ShipmentForm{
    #[validate(length(min = 1, max = 64))]
    pub tracking_code: String
}

#[derive(Error)]
pub enum UpdateOrderError{
    #[error("Invalid shipment: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    OrderError(#[from] OrderError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for UpdateOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for UpdateOrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            UpdateOrderError::ValidationError(_) => StatusCode::BAD_REQUEST,
            UpdateOrderError::OrderError(e) => order_error_status(e),
            UpdateOrderError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Updating order status",
    skip(pool, _admin)
)]
pub async fn put_order_status(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    form: web::Json<UpdateOrderStatusForm>,
    _admin: IsAdmin
) -> Result<HttpResponse, UpdateOrderError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let order = update_order_status(conn, order_id.into_inner(), form.status).await?;

    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(
    "Recording shipment of order",
    skip(pool, _admin)
)]
pub async fn post_order_shipment(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    form: web::Json<ShipmentForm>,
    _admin: IsAdmin
) -> Result<HttpResponse, UpdateOrderError>{
    form.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let tracking_code = form.into_inner().tracking_code.trim().to_string();
    let order = assign_tracking_code(conn, order_id.into_inner(), tracking_code).await?;

    Ok(HttpResponse::Ok().json(order))
}
