use actix_web::{error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized}, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use super::jwt::{Claims, Tokenizer, UserRole};

pub const AUTH_COOKIE: &str = "access_token";

// Extractor for admin role
pub struct IsAdmin(pub Uuid);

// Extractor for seller role, second field is true for admins acting as sellers
pub struct IsSeller(pub Uuid, pub bool);

// Extractor for any logged in account, second field is true for admins
pub struct IsUser(pub Uuid, pub bool);

// Bearer header first, then the cookie set at login
fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization") {
        return header.to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer"))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    req.cookie(AUTH_COOKIE).map(|cookie| cookie.value().to_string())
}

fn claims_from_request(req: &HttpRequest) -> Result<Claims, actix_web::Error> {
    let tokenizer = req.app_data::<web::Data<Tokenizer>>()
        .ok_or_else(|| ErrorInternalServerError("Tokenizer is not configured"))?;

    let token = bearer_token(req)
        .ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    tokenizer.decode_key(&token)
        .ok_or_else(|| ErrorUnauthorized("Invalid token"))
}

impl FromRequest for IsAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| {
            match claims.role {
                UserRole::ADMIN => Ok(IsAdmin(claims.sub)),
                _ => Err(ErrorForbidden("Unauthorized Role"))
            }
        }))
    }
}

impl FromRequest for IsSeller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| {
            match claims.role {
                UserRole::SELLER => Ok(IsSeller(claims.sub, false)),
                UserRole::ADMIN => Ok(IsSeller(claims.sub, true)),
                UserRole::USER => Err(ErrorForbidden("Unauthorized Role"))
            }
        }))
    }
}

impl FromRequest for IsUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req).map(|claims| {
            IsUser(claims.sub, claims.role == UserRole::ADMIN)
        }))
    }
}
