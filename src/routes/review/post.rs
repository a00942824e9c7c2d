use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsUser, db_interaction::{insert_review, ReviewError}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Deserialize, Debug, Validate)]
pub struct ReviewForm{
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String
}

#[derive(Error)]
pub enum PostReviewError{
    #[error("Invalid review: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    ReviewError(#[from] ReviewError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostReviewError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostReviewError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PostReviewError::ReviewError(ReviewError::ProductNotFound) => StatusCode::NOT_FOUND,
            PostReviewError::ReviewError(ReviewError::NotPurchased) => StatusCode::FORBIDDEN,
            PostReviewError::ReviewError(ReviewError::AlreadyReviewed) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Posting product review",
    skip(pool, uid, form)
)]
pub async fn post_product_review(
    pool: web::Data<DbPool>,
    product_id: web::Path<Uuid>,
    form: web::Json<ReviewForm>,
    uid: IsUser
) -> Result<HttpResponse, PostReviewError>{
    form.validate()?;
    let form = form.into_inner();

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let review = insert_review(conn, uid.0, product_id.into_inner(), form.rating, form.comment.trim().to_string()).await?;

    Ok(HttpResponse::Created().json(review))
}
