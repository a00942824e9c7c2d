use anyhow::Context;

use crate::{db_interaction::{apply_tracking_status, shipping_orders_with_tracking}, shipment_tracking::TrackingClient, utils::{get_pooled_connection, DbPool}};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShipmentPollSummary{
    pub checked: usize,
    pub updated: usize,
    pub failed: usize
}

// One failing order is logged and counted, the rest are still polled
#[tracing::instrument(
    "Shipment status poll tick",
    skip_all
)]
pub async fn poll_shipments_tick(
    pool: &DbPool,
    tracking_client: &TrackingClient
) -> Result<ShipmentPollSummary, anyhow::Error> {
    let conn = get_pooled_connection(pool)
        .await
        .context("Failed to get connection from pool")?;

    let orders = shipping_orders_with_tracking(conn)
        .await
        .context("Failed to load shipping orders")?;

    let mut summary = ShipmentPollSummary::default();

    for (order_id, tracking_code) in orders {
        summary.checked += 1;

        let status = match tracking_client.order_status(&tracking_code).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(%order_id, tracking_code = %tracking_code, "Failed to fetch carrier status: {}", e);
                summary.failed += 1;
                continue
            }
        };

        let Some(next) = status.order_status() else {
            continue
        };

        let conn = get_pooled_connection(pool)
            .await
            .context("Failed to get connection from pool")?;

        match apply_tracking_status(conn, order_id, next).await {
            Ok(true) => summary.updated += 1,
            Ok(false) => {},
            Err(e) => {
                tracing::warn!(%order_id, "Failed to apply carrier status: {:?}", e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(checked = summary.checked, updated = summary.updated, failed = summary.failed, "Shipment poll finished");
    Ok(summary)
}
