use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{db_interaction::{get_popular_products, get_product_detail, list_products, CatalogError, ProductFilter}, utils::{error_fmt_chain, get_pooled_connection, DbPool, PageQuery}};

// Paging and filters arrive in one flat query string
#[derive(Deserialize, Debug)]
pub struct ProductQuery{
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub search: Option<String>
}

fn default_page() -> i64 { 1 }
fn default_limit() -> i64 { 20 }

impl ProductQuery {
    fn split(self) -> (PageQuery, ProductFilter) {
        (
            PageQuery{ page: self.page, limit: self.limit },
            ProductFilter{
                category_id: self.category_id,
                subcategory_id: self.subcategory_id,
                seller_id: self.seller_id,
                search: self.search
            }
        )
    }
}

#[derive(Error)]
pub enum GetProductError{
    #[error("Invalid paging: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            GetProductError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GetProductError::CatalogError(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting list of products",
    skip(pool)
)]
pub async fn get_products(
    pool: web::Data<DbPool>,
    query: web::Query<ProductQuery>
) -> Result<HttpResponse, GetProductError>{
    let (page, filter) = query.into_inner().split();
    page.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_products(conn, filter, page).await?))
}

#[tracing::instrument(
    "Getting product detail",
    skip(pool)
)]
pub async fn get_product(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>
) -> Result<HttpResponse, GetProductError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(get_product_detail(conn, product_id.into_inner()).await?))
}

#[tracing::instrument(
    "Getting popular products",
    skip(pool)
)]
pub async fn get_popular(
    pool: web::Data<DbPool>
) -> Result<HttpResponse, GetProductError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(get_popular_products(conn).await?))
}
