use std::{error::Error, fmt::Debug};

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{
    result::DatabaseErrorKind, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl,
    RunQueryDsl, SelectableHelper
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{db_interaction::{load_cart_lines, CartLine}, domain::{pricing::{evaluate_coupon, CouponDiscount, CouponRejection, PricedLine}, status::DiscountKind}, models::Coupon, schema::coupons, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

#[derive(Error)]
pub enum CouponError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("coupon {0} already exists")]
    DuplicateCode(String),
    #[error("coupon not found")]
    NotFound,
    #[error("cart is empty")]
    EmptyCart,
    #[error(transparent)]
    Rejected(#[from] CouponRejection)
}

impl Debug for CouponError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewCoupon{
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    #[serde(default)]
    pub min_order_value: i64,
    pub category_id: Option<Uuid>,
    pub usage_limit: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>
}

#[tracing::instrument(
    "Inserting coupon",
    skip(conn)
)]
pub async fn insert_coupon(
    mut conn: DbConnection,
    new_coupon: NewCoupon
) -> Result<Coupon, CouponError> {
    let coupon = Coupon{
        coupon_id: Uuid::new_v4(),
        code: normalize_code(&new_coupon.code),
        description: new_coupon.description,
        discount_kind: new_coupon.discount_kind.as_str().to_string(),
        discount_value: new_coupon.discount_value,
        max_discount: new_coupon.max_discount,
        min_order_value: new_coupon.min_order_value,
        category_id: new_coupon.category_id,
        usage_limit: new_coupon.usage_limit,
        used_count: 0,
        starts_at: new_coupon.starts_at,
        ends_at: new_coupon.ends_at,
        is_active: true
    };

    spawn_blocking_with_tracing(move || {
        diesel::insert_into(coupons::table)
            .values(&coupon)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    CouponError::DuplicateCode(coupon.code.clone())
                },
                diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    CouponError::NotFound
                },
                e => e.into()
            })?;

        Ok(coupon)
    })
    .await?
}

#[tracing::instrument(
    "Listing coupons",
    skip_all
)]
pub async fn list_coupons(
    mut conn: DbConnection
) -> Result<Vec<Coupon>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        coupons::table
            .select(Coupon::as_select())
            .order(coupons::ends_at.desc())
            .load::<Coupon>(&mut conn)
            .context("Failed to load coupons")
    })
    .await
    .context("Failed due to threadpool error")?
}

#[tracing::instrument(
    "Deactivating coupon",
    skip(conn)
)]
pub async fn deactivate_coupon(
    mut conn: DbConnection,
    coupon_id: Uuid
) -> Result<Coupon, CouponError> {
    spawn_blocking_with_tracing(move || {
        diesel::update(coupons::table.filter(coupons::coupon_id.eq(coupon_id)))
            .set(coupons::is_active.eq(false))
            .returning(Coupon::as_returning())
            .get_result::<Coupon>(&mut conn)
            .optional()?
            .ok_or(CouponError::NotFound)
    })
    .await?
}

pub fn find_coupon_by_code(conn: &mut PgConnection, code: &str) -> diesel::QueryResult<Option<Coupon>> {
    coupons::table
        .select(Coupon::as_select())
        .filter(coupons::code.eq(normalize_code(code)))
        .first::<Coupon>(conn)
        .optional()
}

// Takes one use of the coupon, false when the cap was reached concurrently
pub fn claim_coupon_use(conn: &mut PgConnection, coupon_id: Uuid) -> diesel::QueryResult<bool> {
    let updated = diesel::update(
        coupons::table
            .filter(coupons::coupon_id.eq(coupon_id))
            .filter(coupons::used_count.lt(coupons::usage_limit))
    )
    .set(coupons::used_count.eq(coupons::used_count + 1))
    .execute(conn)?;

    Ok(updated == 1)
}

pub fn release_coupon_use(conn: &mut PgConnection, coupon_id: Uuid) -> diesel::QueryResult<()> {
    diesel::update(
        coupons::table
            .filter(coupons::coupon_id.eq(coupon_id))
            .filter(coupons::used_count.gt(0))
    )
    .set(coupons::used_count.eq(coupons::used_count - 1))
    .execute(conn)?;

    Ok(())
}

#[tracing::instrument(
    "Checking coupon against cart",
    skip(conn)
)]
pub async fn check_coupon_for_cart(
    mut conn: DbConnection,
    user_id: Uuid,
    code: String
) -> Result<CouponDiscount, CouponError> {
    spawn_blocking_with_tracing(move || {
        let coupon = find_coupon_by_code(&mut conn, &code)?
            .ok_or(CouponError::NotFound)?;

        let lines = load_cart_lines(&mut conn, user_id)?;
        if lines.is_empty() {
            return Err(CouponError::EmptyCart)
        }

        let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
        Ok(evaluate_coupon(&coupon, &priced, Utc::now())?)
    })
    .await?
}
