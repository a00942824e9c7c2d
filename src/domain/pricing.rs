//! Checkout arithmetic: cart subtotals, coupon eligibility and discounts,
//! and the final order totals. All amounts are whole VND.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{domain::status::DiscountKind, models::Coupon};

// One cart / order line with the data pricing needs
#[derive(Debug, Clone)]
pub struct PricedLine{
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub unit_price: i64,
    pub quantity: i32
}

impl PricedLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CouponRejection{
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit has been reached")]
    UsageExhausted,
    #[error("no item in the cart is eligible for this coupon")]
    NoEligibleItems,
    #[error("order value {actual} is below the coupon minimum of {required}")]
    BelowMinimum{ required: i64, actual: i64 },
    #[error("coupon has an unknown discount kind: {0}")]
    UnknownKind(String)
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct CouponDiscount{
    pub eligible_subtotal: i64,
    pub discount: i64
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct OrderTotals{
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_fee: i64,
    pub total: i64
}

pub fn subtotal(lines: &[PricedLine]) -> i64 {
    lines.iter().map(PricedLine::line_total).sum()
}

// Lines in the coupon's category count, or every line for an unscoped coupon
pub fn eligible_subtotal(lines: &[PricedLine], category_id: Option<Uuid>) -> i64 {
    lines.iter()
        .filter(|line| category_id.map_or(true, |c| c == line.category_id))
        .map(PricedLine::line_total)
        .sum()
}

pub fn compute_discount(
    kind: DiscountKind,
    value: i64,
    max_discount: Option<i64>,
    eligible: i64
) -> i64 {
    let raw = match kind {
        DiscountKind::Percent => {
            let percent = value.clamp(0, 100);
            (i128::from(eligible) * i128::from(percent) / 100) as i64
        },
        DiscountKind::Fixed => value.max(0)
    };

    let capped = match max_discount {
        Some(max) => raw.min(max.max(0)),
        None => raw
    };

    capped.min(eligible).max(0)
}

#[tracing::instrument(
    "Evaluating coupon against order lines",
    skip(coupon, lines),
    fields(code = %coupon.code)
)]
pub fn evaluate_coupon(
    coupon: &Coupon,
    lines: &[PricedLine],
    now: DateTime<Utc>
) -> Result<CouponDiscount, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive)
    }
    if now < coupon.starts_at {
        return Err(CouponRejection::NotStarted)
    }
    if now > coupon.ends_at {
        return Err(CouponRejection::Expired)
    }
    if coupon.used_count >= coupon.usage_limit {
        return Err(CouponRejection::UsageExhausted)
    }

    let kind = DiscountKind::parse(&coupon.discount_kind)
        .ok_or_else(|| CouponRejection::UnknownKind(coupon.discount_kind.clone()))?;

    let eligible = eligible_subtotal(lines, coupon.category_id);
    if eligible == 0 {
        return Err(CouponRejection::NoEligibleItems)
    }
    if eligible < coupon.min_order_value {
        return Err(CouponRejection::BelowMinimum{
            required: coupon.min_order_value,
            actual: eligible
        })
    }

    Ok(CouponDiscount{
        eligible_subtotal: eligible,
        discount: compute_discount(kind, coupon.discount_value, coupon.max_discount, eligible)
    })
}

pub fn order_totals(lines: &[PricedLine], discount: i64, shipping_fee: i64) -> OrderTotals {
    let subtotal = subtotal(lines);
    let discount = discount.clamp(0, subtotal);

    OrderTotals{
        subtotal,
        discount,
        shipping_fee,
        total: subtotal - discount + shipping_fee
    }
}
