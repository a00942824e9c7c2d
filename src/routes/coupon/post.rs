use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::{IsAdmin, IsUser}, db_interaction::{check_coupon_for_cart, insert_coupon, CouponError, NewCoupon}, domain::status::DiscountKind, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::coupon_error_status;

#[derive(Deserialize, Debug, Validate)]
pub struct CouponForm{
    #[validate(length(min = 3, max = 32))]
    pub code: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    pub discount_kind: DiscountKind,
    #[validate(range(min = 1))]
    pub discount_value: i64,
    #[validate(range(min = 1))]
    pub max_discount: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub min_order_value: i64,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub usage_limit: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>
}

impl CouponForm {
    // Rules that span more than one field
    fn check_consistency(&self) -> Result<(), String> {
        if self.discount_kind == DiscountKind::Percent && self.discount_value > 100 {
            return Err("percent discount must be between 1 and 100".to_string())
        }
        if self.starts_at >= self.ends_at {
            return Err("starts_at must be before ends_at".to_string())
        }
        Ok(())
    }
}

#[derive(Error)]
pub enum PostCouponError{
    #[error("Invalid coupon: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("Invalid coupon: {0}")]
    InconsistentCoupon(String),
    #[error("{0}")]
    CouponError(#[from] CouponError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostCouponError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostCouponError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostCouponError::ValidationError(_) | PostCouponError::InconsistentCoupon(_) => StatusCode::BAD_REQUEST,
            PostCouponError::CouponError(e) => coupon_error_status(e),
            PostCouponError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Creating coupon",
    skip(pool, _admin)
)]
pub async fn post_coupon(
    pool: web::Data<DbPool>,
    form: web::Json<CouponForm>,
    _admin: IsAdmin
) -> Result<HttpResponse, PostCouponError>{
    form.validate()?;
    form.check_consistency().map_err(PostCouponError::InconsistentCoupon)?;
    let form = form.into_inner();

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let coupon = insert_coupon(conn, NewCoupon{
        code: form.code,
        description: form.description,
        discount_kind: form.discount_kind,
        discount_value: form.discount_value,
        max_discount: form.max_discount,
        min_order_value: form.min_order_value,
        category_id: form.category_id,
        usage_limit: form.usage_limit,
        starts_at: form.starts_at,
        ends_at: form.ends_at
    })
    .await?;

    Ok(HttpResponse::Created().json(coupon))
}

#[derive(Deserialize, Debug)]
pub struct CouponCheckForm{
    pub code: String
}

#[tracing::instrument(
    "Checking coupon against cart",
    skip(pool, uid)
)]
pub async fn post_coupon_check(
    pool: web::Data<DbPool>,
    form: web::Json<CouponCheckForm>,
    uid: IsUser
) -> Result<HttpResponse, PostCouponError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let discount = check_coupon_for_cart(conn, uid.0, form.into_inner().code).await?;

    Ok(HttpResponse::Ok().json(discount))
}
