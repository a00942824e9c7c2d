use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsUser, db_interaction::{set_cart_quantity, CartError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::cart_error_status;

#[derive(Deserialize, Debug, Validate)]
pub struct CartQuantityForm{
    #[validate(range(min = 1))]
    pub quantity: i32
}

#[derive(Error)]
pub enum UpdateCartError{
    #[error("Invalid quantity: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    CartError(#[from] CartError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for UpdateCartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for UpdateCartError {
    fn status_code(&self) -> StatusCode {
        match self {
            UpdateCartError::ValidationError(_) => StatusCode::BAD_REQUEST,
            UpdateCartError::CartError(e) => cart_error_status(e),
            UpdateCartError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Setting cart item quantity",
    skip(pool, uid)
)]
pub async fn put_cart_item(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    form: web::Json<CartQuantityForm>,
    uid: IsUser
) -> Result<HttpResponse, UpdateCartError>{
    form.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let item = set_cart_quantity(conn, uid.0, product_id.into_inner(), form.quantity).await?;

    Ok(HttpResponse::Ok().json(item))
}
