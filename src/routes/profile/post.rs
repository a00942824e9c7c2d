use std::fmt::Debug;
use std::error::Error;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use serde::Deserialize;

use crate::{auth::extractors::IsUser, db_interaction::{get_user_profile_info, post_user_profile_info}, domain::{phone_number::PhoneNumberDomain, user_email::UserEmail}, models::UserProfileInfo, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Deserialize, Debug)]
pub struct ProfileForm{
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>
}

#[derive(thiserror::Error)]
pub enum PostProfileError{
    #[error("{0}")]
    InvalidEmailOrPhoneNumber(String),
    #[error("Email not unique")]
    EmailNotUnique,
    #[error("Unexpected error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostProfileError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostProfileError::InvalidEmailOrPhoneNumber(_) => StatusCode::BAD_REQUEST,
            PostProfileError::EmailNotUnique => StatusCode::CONFLICT,
            PostProfileError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Posting user profile info",
    skip_all
)]
pub async fn post_profile(
    pool: web::Data<DbPool>,
    form: web::Form<ProfileForm>,
    uid: IsUser
) -> Result<HttpResponse, PostProfileError>{
    let user_id = uid.0;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;
    let info = get_user_profile_info(conn, user_id).await?;

    let new_info = substitute_old_info_with_new(info, form.into_inner())
        .map_err(PostProfileError::InvalidEmailOrPhoneNumber)?;

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    post_user_profile_info(conn, new_info, user_id).await
        .map_err(|e| {
            if e.is_unique_violation() {
                PostProfileError::EmailNotUnique
            } else {
                PostProfileError::UnexpectedError(anyhow::Error::new(e))
            }
        })?;

    Ok(HttpResponse::Ok().finish())
}

// Fields absent from the form keep their stored value
pub fn substitute_old_info_with_new(
    mut current_info: UserProfileInfo,
    new_info: ProfileForm
) -> Result<UserProfileInfo, String>{
    if let Some(email) = new_info.email {
        current_info.email = UserEmail::parse(email)?.inner();
    }

    if let Some(name) = new_info.name.filter(|name| !name.trim().is_empty()) {
        current_info.name = name.trim().to_string();
    }

    if let Some(number) = new_info.phone_number {
        current_info.phone_number = Some(PhoneNumberDomain::parse(number)?.inner());
    }

    Ok(current_info)
}
