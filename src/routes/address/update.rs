use actix_web::{web, HttpResponse};
use anyhow::Context;
use uuid::Uuid;
use validator::Validate;

use crate::{auth::extractors::IsUser, db_interaction::{set_default_address, update_address}, utils::{get_pooled_connection, DbPool}};

use super::{AddressForm, PostAddressError};

#[tracing::instrument(
    "Updating address",
    skip(pool, uid)
)]
pub async fn put_address(
    pool: web::Data<DbPool>,
    address_id: web::Path<Uuid>,
    form: web::Json<AddressForm>,
    uid: IsUser
) -> Result<HttpResponse, PostAddressError>{
    form.validate()?;
    let input = form.into_inner()
        .into_input()
        .map_err(PostAddressError::InvalidPhoneNumber)?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let address = update_address(conn, uid.0, address_id.into_inner(), input).await?;

    Ok(HttpResponse::Ok().json(address))
}

#[tracing::instrument(
    "Setting default address",
    skip(pool, uid)
)]
pub async fn put_default_address(
    pool: web::Data<DbPool>,
    address_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, PostAddressError>{
    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    set_default_address(conn, uid.0, address_id.into_inner()).await?;

    Ok(HttpResponse::Ok().finish())
}
