use anyhow::Context;
use chrono::Utc;

use crate::{db_interaction::refresh_popular_products, utils::{get_pooled_connection, DbPool}};

#[tracing::instrument(
    "Popular products refresh tick",
    skip(pool)
)]
pub async fn refresh_popular_products_tick(
    pool: &DbPool,
    limit: i64
) -> Result<usize, anyhow::Error> {
    let conn = get_pooled_connection(pool)
        .await
        .context("Failed to get connection from pool")?;

    let cached = refresh_popular_products(conn, limit, Utc::now()).await?;
    tracing::info!(cached, "Popular products cache refreshed");

    Ok(cached)
}
