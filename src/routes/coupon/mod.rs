mod get;
mod post;
mod update;

pub use get::*;
pub use post::*;
pub use update::*;

use actix_web::http::StatusCode;

use crate::db_interaction::CouponError;

pub(crate) fn coupon_error_status(e: &CouponError) -> StatusCode {
    match e {
        CouponError::DuplicateCode(_) => StatusCode::CONFLICT,
        CouponError::NotFound => StatusCode::NOT_FOUND,
        CouponError::EmptyCart | CouponError::Rejected(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR
    }
}
