use std::{error::Error, fmt::Debug};

use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use thiserror::Error;

use crate::{db_interaction::list_categories, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Error)]
pub enum GetCategoriesError{
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for GetCategoriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for GetCategoriesError {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::InternalServerError().body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Getting category tree",
    skip(pool)
)]
pub async fn get_categories(
    pool: web::Data<DbPool>
) -> Result<HttpResponse, GetCategoriesError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    Ok(HttpResponse::Ok().json(list_categories(conn).await?))
}
