use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::{auth::extractors::IsUser, db_interaction::{insert_address, AddressError, AddressInput}, domain::phone_number::PhoneNumberDomain, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

use super::address_error_status;

#[derive(Deserialize, Debug, Validate)]
pub struct AddressForm{
    #[validate(length(min = 1, max = 100))]
    pub recipient_name: String,
    pub phone_number: String,
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    pub ward_id: i32,
    pub district_id: i32,
    pub province_id: i32
}

impl AddressForm {
    pub fn into_input(self) -> Result<AddressInput, String> {
        let phone_number = PhoneNumberDomain::parse(self.phone_number)?.inner();

        Ok(AddressInput{
            recipient_name: self.recipient_name.trim().to_string(),
            phone_number,
            street: self.street.trim().to_string(),
            ward_id: self.ward_id,
            district_id: self.district_id,
            province_id: self.province_id
        })
    }
}

#[derive(Error)]
pub enum PostAddressError{
    #[error("Invalid address: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{0}")]
    InvalidPhoneNumber(String),
    #[error("{0}")]
    AddressError(#[from] AddressError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostAddressError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostAddressError::ValidationError(_) | PostAddressError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
            PostAddressError::AddressError(e) => address_error_status(e),
            PostAddressError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Posting address",
    skip(pool, uid)
)]
pub async fn post_address(
    pool: web::Data<DbPool>,
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

    let address = insert_address(conn, uid.0, input).await?;

    Ok(HttpResponse::Created().json(address))
}
