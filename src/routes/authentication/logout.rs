use actix_web::{cookie::Cookie, HttpResponse};

use crate::auth::extractors::{IsUser, AUTH_COOKIE};

// Tokens are stateless, logging out only drops the browser cookie
#[tracing::instrument(
    "Logging out currently logged in user",
    skip_all
)]
pub async fn logout(
    _: IsUser
) -> HttpResponse {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).finish()
}
