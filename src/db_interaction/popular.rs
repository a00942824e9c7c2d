use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use diesel::{dsl::sum, Connection, ExpressionMethods, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::{domain::status::OrderStatus, models::PopularProduct, schema::{order_products, popular_products, sales_orders}, telemetry::spawn_blocking_with_tracing, utils::DbConnection};

pub const POPULAR_WINDOW_DAYS: i64 = 30;

// Highest sold quantity first, ties broken by product id for a stable order
fn rank_top(mut sold: Vec<(Uuid, i64)>, limit: usize) -> Vec<(Uuid, i64)> {
    sold.retain(|(_, quantity)| *quantity > 0);
    sold.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    sold.truncate(limit);
    sold
}

// Rebuilds the popular products cache, returns how many rows it now holds
#[tracing::instrument(
    "Refreshing popular products",
    skip(conn)
)]
pub async fn refresh_popular_products(
    mut conn: DbConnection,
    limit: i64,
    now: DateTime<Utc>
) -> Result<usize, anyhow::Error> {
    let since = now - Duration::days(POPULAR_WINDOW_DAYS);
    let limit = usize::try_from(limit.max(0)).unwrap_or_default();

    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let sold = order_products::table
                .inner_join(sales_orders::table)
                .filter(sales_orders::order_date.ge(since))
                .filter(sales_orders::status.ne(OrderStatus::Cancelled.as_str()))
                .group_by(order_products::product_id)
                .select((order_products::product_id, sum(order_products::quantity)))
                .load::<(Uuid, Option<i64>)>(conn)?;

            let top = rank_top(
                sold.into_iter().map(|(id, quantity)| (id, quantity.unwrap_or(0))).collect(),
                limit
            );

            let rows: Vec<PopularProduct> = top.into_iter()
                .map(|(product_id, sold_quantity)| PopularProduct{
                    product_id,
                    sold_quantity,
                    refreshed_at: now
                })
                .collect();

            diesel::delete(popular_products::table).execute(conn)?;
            diesel::insert_into(popular_products::table)
                .values(&rows)
                .execute(conn)?;

            Ok(rows.len())
        })
    })
    .await
    .context("Failed due to threadpool error")?
    .context("Failed to rebuild popular products")
}
