mod get;
mod post;
mod update;
mod delete;

pub use get::*;
pub use post::*;
pub use update::*;
pub use delete::*;

use actix_web::http::StatusCode;

use crate::db_interaction::AddressError;

pub(crate) fn address_error_status(e: &AddressError) -> StatusCode {
    match e {
        AddressError::NotFound => StatusCode::NOT_FOUND,
        AddressError::InvalidLocation => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR
    }
}
