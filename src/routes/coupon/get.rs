use std::{error::Error, fmt::Debug};

use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;

use crate::{auth::extractors::IsAdmin, db_interaction::list_coupons, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Error)]
pub enum GetCouponsError{
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetCouponsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetCouponsError {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::InternalServerError().body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting list of coupons",
    skip_all
)]
pub async fn get_coupons(
    pool: web::Data<DbPool>,
    _: IsAdmin
) -> Result<HttpResponse, GetCouponsError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_coupons(conn).await?))
}
