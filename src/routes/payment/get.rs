use std::collections::HashMap;

use actix_web::{web, HttpResponse};

use crate::{db_interaction::{reconcile_payment, PaymentOutcome}, payment_gateway::{IpnResponse, PaymentCallback, PaymentGateway}, utils::{get_pooled_connection, DbPool}};

// Every outcome is acknowledged with a 200 and an RspCode
#[tracing::instrument(
    "Handling payment gateway IPN",
    skip_all
)]
pub async fn get_vnpay_ipn(
    pool: web::Data<DbPool>,
    gateway: web::Data<PaymentGateway>,
    query: web::Query<HashMap<String, String>>
) -> HttpResponse {
    let params = query.into_inner();

    if !gateway.verify_callback(&params) {
        tracing::warn!("Payment callback signature mismatch");
        return HttpResponse::Ok().json(IpnResponse::INVALID_SIGNATURE)
    }

    let callback = match PaymentCallback::from_params(&params) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::warn!("{:?}", e);
            return HttpResponse::Ok().json(IpnResponse::ORDER_NOT_FOUND)
        }
    };

    let conn = match get_pooled_connection(&pool).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("{:?}", e);
            return HttpResponse::Ok().json(IpnResponse::UNKNOWN_ERROR)
        }
    };

    let response = match reconcile_payment(conn, callback).await {
        Ok(PaymentOutcome::Paid) | Ok(PaymentOutcome::Cancelled) => IpnResponse::CONFIRMED,
        Ok(PaymentOutcome::OrderNotFound) => IpnResponse::ORDER_NOT_FOUND,
        Ok(PaymentOutcome::AmountMismatch) => IpnResponse::INVALID_AMOUNT,
        Ok(PaymentOutcome::AlreadyProcessed) => IpnResponse::ALREADY_CONFIRMED,
        Err(e) => {
            tracing::error!("{:?}", e);
            IpnResponse::UNKNOWN_ERROR
        }
    };

    HttpResponse::Ok().json(response)
}
