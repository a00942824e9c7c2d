//! Periodic maintenance tasks run next to the HTTP server.
//!
//! Each task is a plain async tick function so it can be driven directly
//! from tests; `spawn_background_jobs` wraps them in tokio intervals.

mod popular_products;
mod shipment_status;

pub use popular_products::*;
pub use shipment_status::*;

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{configuration::JobSettings, shipment_tracking::TrackingClient, utils::DbPool};

pub fn spawn_background_jobs(
    pool: DbPool,
    tracking_client: TrackingClient,
    settings: &JobSettings
) -> Vec<JoinHandle<()>> {
    if !settings.enabled {
        tracing::info!("Background jobs are disabled");
        return Vec::new()
    }

    let popular_pool = pool.clone();
    let popular_limit = settings.popular_products_limit;
    let mut popular_interval = tokio::time::interval(Duration::from_secs(settings.popular_products_interval_secs.max(1)));
    popular_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let popular = tokio::spawn(async move {
        loop {
            popular_interval.tick().await;
            if let Err(e) = refresh_popular_products_tick(&popular_pool, popular_limit).await {
                tracing::error!("Popular products refresh failed: {:?}", e);
            }
        }
    });

    let mut shipment_interval = tokio::time::interval(Duration::from_secs(settings.shipment_poll_interval_secs.max(1)));
    shipment_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shipments = tokio::spawn(async move {
        loop {
            shipment_interval.tick().await;
            if let Err(e) = poll_shipments_tick(&pool, &tracking_client).await {
                tracing::error!("Shipment polling failed: {:?}", e);
            }
        }
    });

    vec![popular, shipments]
}
