mod get;
mod post;
mod update;
mod delete;

pub use get::*;
pub use post::*;
pub use update::*;
pub use delete::*;

use actix_web::http::StatusCode;

use crate::db_interaction::CartError;

pub(crate) fn cart_error_status(e: &CartError) -> StatusCode {
    match e {
        CartError::ProductNotFound | CartError::NotInCart => StatusCode::NOT_FOUND,
        CartError::InsufficientStock{ .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR
    }
}
