use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsAdmin, db_interaction::{insert_category, insert_subcategory, CatalogError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Deserialize, Debug, Validate)]
pub struct CategoryForm{
    #[validate(length(min = 1, max = 100))]
    name: String
}

#[derive(Deserialize, Debug, Validate)]
pub struct SubcategoryForm{
    category_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    name: String
}

#[derive(Error)]
pub enum PostCategoryError{
    #[error("Invalid category: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostCategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostCategoryError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostCategoryError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PostCategoryError::CatalogError(CatalogError::Duplicate(_)) => StatusCode::CONFLICT,
            PostCategoryError::CatalogError(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Creating category",
    skip(pool, _admin)
)]
pub async fn post_category(
    pool: web::Data<DbPool>,
    form: web::Json<CategoryForm>,
    _admin: IsAdmin
) -> Result<HttpResponse, PostCategoryError>{
    form.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let category = insert_category(conn, form.into_inner().name.trim().to_string()).await?;

    Ok(HttpResponse::Created().json(category))
}

#[tracing::instrument(
    "Creating subcategory",
    skip(pool, _admin)
)]
pub async fn post_subcategory(
    pool: web::Data<DbPool>,
    form: web::Json<SubcategoryForm>,
    _admin: IsAdmin
) -> Result<HttpResponse, PostCategoryError>{
    form.validate()?;
    let form = form.into_inner();

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let subcategory = insert_subcategory(conn, form.category_id, form.name.trim().to_string()).await?;

    Ok(HttpResponse::Created().json(subcategory))
}
