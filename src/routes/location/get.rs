use std::{error::Error, fmt::Debug};

use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;

use crate::{db_interaction::{list_districts, list_provinces, list_wards}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Error)]
pub enum GetLocationError{
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetLocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetLocationError {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::InternalServerError().body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting provinces",
    skip(pool)
)]
pub async fn get_provinces(
    pool: web::Data<DbPool>
) -> Result<HttpResponse, GetLocationError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_provinces(conn).await?))
}

#[tracing::instrument(
    "Getting districts",
    skip(pool)
)]
pub async fn get_districts(
    pool: web::Data<DbPool>,
    province_id: web::Path<i32>
) -> Result<HttpResponse, GetLocationError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_districts(conn, province_id.into_inner()).await?))
}

#[tracing::instrument(
    "Getting wards",
    skip(pool)
)]
pub async fn get_wards(
    pool: web::Data<DbPool>,
    district_id: web::Path<i32>
) -> Result<HttpResponse, GetLocationError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_wards(conn, district_id.into_inner()).await?))
}
