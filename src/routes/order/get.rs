use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::{IsSeller, IsUser}, db_interaction::{get_order, list_orders, list_seller_order_lines, OrderError}, utils::{error_fmt_chain, get_pooled_connection, DbPool, PageQuery}};

use super::order_error_status;

#[derive(Error)]
pub enum GetOrderError{
    #[error("Invalid paging: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    OrderError(#[from] OrderError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetOrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            GetOrderError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GetOrderError::OrderError(e) => order_error_status(e),
            GetOrderError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

// Customers see their own orders, admins see every order
#[tracing::instrument(
    "Getting list of orders",
    skip(pool, uid)
)]
pub async fn get_orders(
    pool: web::Data<DbPool>,
    query: web::Query<PageQuery>,
    uid: IsUser
) -> Result<HttpResponse, GetOrderError> {
    query.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let orders = list_orders(conn, uid.0, uid.1, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(orders))
}

#[tracing::instrument(
    "Getting order detail",
    skip(pool, uid)
)]
pub async fn get_order_detail(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, GetOrderError> {
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let order = get_order(conn, order_id.into_inner(), uid.0, uid.1).await?;

    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(
    "Getting order lines of seller",
    skip(pool, seller)
)]
pub async fn get_seller_orders(
    pool: web::Data<DbPool>,
    query: web::Query<PageQuery>,
    seller: IsSeller
) -> Result<HttpResponse, GetOrderError> {
    query.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let lines = list_seller_order_lines(conn, seller.0, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(lines))
}
