mod get;
mod post;
mod update;
mod delete;

pub use get::*;
pub use post::*;
pub use update::*;
pub use delete::*;

use actix_web::http::StatusCode;

use crate::db_interaction::OrderError;

pub(crate) fn order_error_status(e: &OrderError) -> StatusCode {
    match e {
        OrderError::NotFound => StatusCode::NOT_FOUND,
        OrderError::InvalidTransition{ .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR
    }
}
