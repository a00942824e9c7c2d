use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{configuration::ShippingSettings, domain::status::OrderStatus};

// Client for the carrier's order tracking API (GHN compatible)
#[derive(Clone)]
pub struct TrackingClient{
    http_client: Client,
    base_url: String,
    token: SecretString
}

#[derive(Serialize)]
struct OrderDetailRequest<'a>{
    order_code: &'a str
}

#[derive(Deserialize, Debug)]
pub struct OrderDetailResponse{
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<OrderDetail>
}

#[derive(Deserialize, Debug)]
pub struct OrderDetail{
    pub status: String
}

#[derive(Error, Debug)]
pub enum TrackingError{
    #[error("Failed to reach the tracking api")]
    RequestError(#[from] reqwest::Error),
    #[error("Tracking api rejected the request: {0}")]
    ApiError(String)
}

// Carrier-side shipment state, reduced to what the order lifecycle cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus{
    InTransit,
    Delivered,
    Returned,
    Cancelled
}

impl TrackingStatus {
    pub fn from_carrier(status: &str) -> TrackingStatus {
        let status = status.trim().to_lowercase();

        if status == "delivered" {
            TrackingStatus::Delivered
        } else if status.starts_with("return") {
            TrackingStatus::Returned
        } else if status == "cancel" || status == "cancelled" {
            TrackingStatus::Cancelled
        } else {
            TrackingStatus::InTransit
        }
    }

    // Order status to move a shipping order to, None while still moving
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            TrackingStatus::InTransit => None,
            TrackingStatus::Delivered => Some(OrderStatus::Delivered),
            TrackingStatus::Returned | TrackingStatus::Cancelled => Some(OrderStatus::Returned)
        }
    }
}

impl TrackingClient {
    pub fn new(settings: &ShippingSettings) -> Result<TrackingClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self{
            http_client,
            base_url: settings.api_uri.clone(),
            token: settings.token.clone()
        })
    }

    #[tracing::instrument(
        "Fetching shipment status from carrier",
        skip(self)
    )]
    pub async fn order_status(&self, tracking_code: &str) -> Result<TrackingStatus, TrackingError> {
        let url = format!("{}/shipping-order/detail", self.base_url);

        let response: OrderDetailResponse = self.http_client
            .post(url)
            .header("Token", self.token.expose_secret())
            .json(&OrderDetailRequest{ order_code: tracking_code })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response {
            OrderDetailResponse{ code: 200, data: Some(detail), .. } => {
                Ok(TrackingStatus::from_carrier(&detail.status))
            },
            OrderDetailResponse{ message, .. } => Err(TrackingError::ApiError(message))
        }
    }
}
