use std::{error::Error, fmt::Debug};

use chrono::{DateTime, Utc};
use diesel::{result::DatabaseErrorKind, ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{domain::status::OrderStatus, models::ProductReview, schema::{order_products, product_reviews, products, sales_orders, users}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection, PageQuery}};

#[derive(Error)]
pub enum ReviewError{
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] diesel::result::Error),
    #[error("product not found")]
    ProductNotFound,
    #[error("only buyers with a delivered order can review this product")]
    NotPurchased,
    #[error("product already reviewed")]
    AlreadyReviewed
}

impl Debug for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

#[tracing::instrument(
    "Inserting product review",
    skip(conn, comment)
)]
pub async fn insert_review(
    mut conn: DbConnection,
    user_id: Uuid,
    product_id: Uuid,
    rating: i32,
    comment: String
) -> Result<ProductReview, ReviewError> {
    spawn_blocking_with_tracing(move || {
        let product_exists: bool = diesel::select(diesel::dsl::exists(
            products::table.filter(products::product_id.eq(product_id))
        ))
        .get_result(&mut conn)?;

        if !product_exists {
            return Err(ReviewError::ProductNotFound)
        }

        let purchased: bool = diesel::select(diesel::dsl::exists(
            order_products::table
                .inner_join(sales_orders::table)
                .filter(order_products::product_id.eq(product_id))
                .filter(sales_orders::user_id.eq(user_id))
                .filter(sales_orders::status.eq(OrderStatus::Delivered.as_str()))
        ))
        .get_result(&mut conn)?;

        if !purchased {
            return Err(ReviewError::NotPurchased)
        }

        let review = ProductReview{
            review_id: Uuid::new_v4(),
            product_id,
            user_id,
            rating,
            comment,
            created_at: Utc::now()
        };

        diesel::insert_into(product_reviews::table)
            .values(&review)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ReviewError::AlreadyReviewed
                },
                e => e.into()
            })?;

        Ok(review)
    })
    .await?
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReviewView{
    pub review_id: Uuid,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>
}

#[tracing::instrument(
    "Listing reviews of product",
    skip(conn)
)]
pub async fn list_reviews(
    mut conn: DbConnection,
    product_id: Uuid,
    page: PageQuery
) -> Result<Vec<ReviewView>, ReviewError> {
    let rows = spawn_blocking_with_tracing(move || {
        product_reviews::table
            .inner_join(users::table)
            .filter(product_reviews::product_id.eq(product_id))
            .select((ProductReview::as_select(), users::name))
            .order(product_reviews::created_at.desc())
            .limit(page.limit)
            .offset(page.offset())
            .load::<(ProductReview, String)>(&mut conn)
    })
    .await??;

    Ok(rows.into_iter()
        .map(|(review, reviewer_name)| ReviewView{
            review_id: review.review_id,
            reviewer_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at
        })
        .collect())
}
