use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsUser, db_interaction::{add_to_cart, CartError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::cart_error_status;

#[derive(Deserialize, Debug, Validate)]
pub struct CartItemForm{
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32
}

#[derive(Error)]
pub enum PostCartError{
    #[error("Invalid cart item: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    CartError(#[from] CartError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostCartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostCartError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostCartError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PostCartError::CartError(e) => cart_error_status(e),
            PostCartError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Adding item to cart",
    skip(pool, uid)
)]
pub async fn post_cart_item(
    pool: web::Data<DbPool>,
    form: web::Json<CartItemForm>,
    uid: IsUser
) -> Result<HttpResponse, PostCartError>{
    form.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let item = add_to_cart(conn, uid.0, form.product_id, form.quantity).await?;

    Ok(HttpResponse::Ok().json(item))
}
