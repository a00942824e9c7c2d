use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{db_interaction::{list_reviews, ReviewError}, utils::{error_fmt_chain, get_pooled_connection, DbPool, PageQuery}};

#[derive(Error)]
pub enum GetReviewsError{
    #[error("Invalid paging: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    ReviewError(#[from] ReviewError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetReviewsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetReviewsError {
    fn status_code(&self) -> StatusCode {
        match self {
            GetReviewsError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting reviews of product",
    skip(pool)
)]
pub async fn get_product_reviews(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    query: web::Query<PageQuery>
) -> Result<HttpResponse, GetReviewsError>{
    query.validate()?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let reviews = list_reviews(conn, product_id.into_inner(), query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(reviews))
}
