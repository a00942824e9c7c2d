use anyhow::Context;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};

use crate::{models::{District, Province, Ward}, schema::{districts, provinces, wards}, telemetry::spawn_blocking_with_tracing, utils::DbConnection};

#[tracing::instrument(
    "Listing provinces",
    skip_all
)]
pub async fn list_provinces(
    mut conn: DbConnection
) -> Result<Vec<Province>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        provinces::table
            .select(Province::as_select())
            .order(provinces::name.asc())
            .load::<Province>(&mut conn)
            .context("Failed to load provinces")
    })
    .await
    .context("Failed due to threadpool error")?
}

#[tracing::instrument(
    "Listing districts of province",
    skip(conn)
)]
pub async fn list_districts(
    mut conn: DbConnection,
    province_id: i32
) -> Result<Vec<District>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        districts::table
            .select(District::as_select())
            .filter(districts::province_id.eq(province_id))
            .order(districts::name.asc())
            .load::<District>(&mut conn)
            .context("Failed to load districts")
    })
    .await
    .context("Failed due to threadpool error")?
}

#[tracing::instrument(
    "Listing wards of district",
    skip(conn)
)]
pub async fn list_wards(
    mut conn: DbConnection,
    district_id: i32
) -> Result<Vec<Ward>, anyhow::Error> {
    spawn_blocking_with_tracing(move || {
        wards::table
            .select(Ward::as_select())
            .filter(wards::district_id.eq(district_id))
            .order(wards::name.asc())
            .load::<Ward>(&mut conn)
            .context("Failed to load wards")
    })
    .await
    .context("Failed due to threadpool error")?
}
