use std::{error::Error, fmt::Debug, net::SocketAddr};

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{auth::extractors::IsUser, db_interaction::{place_order, CheckoutError, PlaceOrder}, domain::status::PaymentMethod, models::SalesOrder, payment_gateway::{PaymentGateway, PaymentRequest}, utils::{error_fmt_chain, get_pooled_connection, DbPool}};

#[derive(Serialize, Deserialize, Debug)]
pub struct PlacedOrder{
    pub order: SalesOrder,
    pub payment_url: Option<String>
}

#[derive(Error)]
pub enum PostOrderError{
    #[error("{0}")]
    CheckoutError(#[from] CheckoutError),
    #[error("Failed due to internal server error")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for PostOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for PostOrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostOrderError::CheckoutError(e) => match e {
                CheckoutError::EmptyCart | CheckoutError::CouponRejected(_) => StatusCode::BAD_REQUEST,
                CheckoutError::AddressNotFound | CheckoutError::CouponNotFound => StatusCode::NOT_FOUND,
                CheckoutError::ProductUnavailable(_) | CheckoutError::InsufficientStock{ .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR
            },
            PostOrderError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(format!("{}", self))
    }
}

#[tracing::instrument(
    "Posting order",
    skip(req, pool, gateway, uid)
)]
pub async fn post_order(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    gateway: web::Data<PaymentGateway>,
    form: web::Json<PlaceOrder>,
    uid: IsUser
) -> Result<HttpResponse, PostOrderError> {
    let request = form.into_inner();
    let payment_method = request.payment_method;
    let now = Utc::now();

    let conn = get_pooled_connection(&pool)
        .await
        .context("Failed to get connection from pool")?;

    let order = place_order(conn, uid.0, request, now).await?;

    let payment_url = match payment_method {
        PaymentMethod::Vnpay => {
            let client_ip = req.connection_info()
                .realip_remote_addr()
                .map(|addr| match addr.parse::<SocketAddr>() {
                    Ok(socket) => socket.ip().to_string(),
                    Err(_) => addr.to_string()
                })
                .unwrap_or_else(|| "127.0.0.1".to_string());

            Some(gateway.build_payment_url(&PaymentRequest{
                order_id: order.order_id,
                amount: order.total,
                client_ip: &client_ip,
                created_at: now
            })
            .context("Failed to build payment url")?)
        },
        PaymentMethod::Cod => None
    };

    Ok(HttpResponse::Created().json(PlacedOrder{ order, payment_url }))
}
