use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::extractors::IsSeller, db_interaction::{deactivate_product, CatalogError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Error)]
pub enum DeleteProductError{
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for DeleteProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for DeleteProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            DeleteProductError::CatalogError(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            DeleteProductError::CatalogError(CatalogError::NotOwner) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

// Soft delete, order history keeps pointing at the product
#[tracing::instrument(
    "Deactivating product",
    skip(pool, seller)
)]
pub async fn delete_product(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    seller: IsSeller
) -> Result<HttpResponse, DeleteProductError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    deactivate_product(conn, product_id.into_inner(), seller.0, seller.1).await?;

    Ok(HttpResponse::NoContent().finish())
}
