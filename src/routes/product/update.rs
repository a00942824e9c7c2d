use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsSeller, db_interaction::{update_product, CatalogError}, models::ProductChangeset, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::valid_product_name;

#[derive(serde::Deserialize, Debug, Validate)]
pub struct ProductUpdateForm{
    pub subcategory_id: Option<Uuid>,
    #[validate(custom(function = "valid_product_name"))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(url)]
    pub photo_url: Option<String>
}

impl From<ProductUpdateForm> for ProductChangeset {
    fn from(form: ProductUpdateForm) -> Self {
        ProductChangeset{
            subcategory_id: form.subcategory_id,
            name: form.name.map(|name| name.trim().to_string()),
            description: form.description,
            price: form.price,
            stock: form.stock,
            photo_url: form.photo_url
        }
    }
}

#[derive(Error)]
pub enum UpdateProductError{
    #[error("Invalid product: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("Nothing to update")]
    EmptyUpdate,
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for UpdateProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for UpdateProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            UpdateProductError::ValidationError(_) | UpdateProductError::EmptyUpdate => StatusCode::BAD_REQUEST,
            UpdateProductError::CatalogError(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            UpdateProductError::CatalogError(CatalogError::NotOwner) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Updating product",
    skip(pool, seller)
)]
pub async fn put_product(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    form: web::Json<ProductUpdateForm>,
    seller: IsSeller
) -> Result<HttpResponse, UpdateProductError>{
    form.validate()?;

    let changes = ProductChangeset::from(form.into_inner());
    if changes.is_empty() {
        return Err(UpdateProductError::EmptyUpdate)
    }

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let product = update_product(conn, product_id.into_inner(), seller.0, seller.1, changes).await?;

    Ok(HttpResponse::Ok().json(product))
}
