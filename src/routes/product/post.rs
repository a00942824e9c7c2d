use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsSeller, db_interaction::{insert_product, CatalogError, NewProduct}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::valid_product_name;

#[derive(Deserialize, Debug, Validate)]
pub struct ProductForm{
    pub subcategory_id: Uuid,
    #[validate(custom(function = "valid_product_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(range(min = 1))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(url)]
    pub photo_url: Option<String>
}

#[derive(Error)]
pub enum PostProductError{
    #[error("Invalid product: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostProductError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PostProductError::CatalogError(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Posting product",
    skip(pool, seller)
)]
pub async fn post_product(
    pool: web::Data<DbPool>,
    form: web::Json<ProductForm>,
    seller: IsSeller
) -> Result<HttpResponse, PostProductError>{
    form.validate()?;
    let form = form.into_inner();

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let product = insert_product(conn, seller.0, NewProduct{
        subcategory_id: form.subcategory_id,
        name: form.name.trim().to_string(),
        description: form.description,
        price: form.price,
        stock: form.stock,
        photo_url: form.photo_url
    })
    .await?;

    Ok(HttpResponse::Created().json(product))
}
