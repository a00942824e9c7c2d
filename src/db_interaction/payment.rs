use chrono::Utc;
use diesel::{Connection, RunQueryDsl};
use uuid::Uuid;

use crate::{db_interaction::{lock_order, transition_order, OrderError}, domain::status::{OrderStatus, PaymentMethod, PaymentStatus}, models::Payment, payment_gateway::PaymentCallback, schema::payments, telemetry::spawn_blocking_with_tracing, utils::DbConnection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome{
    Paid,
    Cancelled,
    OrderNotFound,
    AmountMismatch,
    AlreadyProcessed
}

#[tracing::instrument(
    "Reconciling gateway payment",
    skip(conn),
    fields(order_id = %callback.order_id)
)]
pub async fn reconcile_payment(
    mut conn: DbConnection,
    callback: PaymentCallback
) -> Result<PaymentOutcome, OrderError> {
    spawn_blocking_with_tracing(move || {
        conn.transaction::<_, OrderError, _>(|conn| {
            let Some(order) = lock_order(conn, callback.order_id)? else {
                return Ok(PaymentOutcome::OrderNotFound)
            };

            if !callback.amount_matches(order.total) {
                tracing::warn!(expected = order.total, received_minor = callback.amount_minor, "Payment amount mismatch");
                return Ok(PaymentOutcome::AmountMismatch)
            }

            if OrderStatus::parse(&order.status) != Some(OrderStatus::Pending) {
                return Ok(PaymentOutcome::AlreadyProcessed)
            }

            let status = if callback.is_success() {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            };

            let payment = Payment{
                payment_id: Uuid::new_v4(),
                order_id: order.order_id,
                amount: order.total,
                provider: PaymentMethod::Vnpay.as_str().to_string(),
                transaction_no: callback.transaction_no.clone(),
                response_code: callback.response_code.clone(),
                status: status.as_str().to_string(),
                created_at: Utc::now()
            };

            diesel::insert_into(payments::table)
                .values(&payment)
                .execute(conn)?;

            match status {
                PaymentStatus::Success => {
                    transition_order(conn, &order, OrderStatus::Paid, None)?;
                    Ok(PaymentOutcome::Paid)
                },
                PaymentStatus::Failed => {
                    transition_order(conn, &order, OrderStatus::Cancelled, None)?;
                    Ok(PaymentOutcome::Cancelled)
                }
            }
        })
    })
    .await?
}
