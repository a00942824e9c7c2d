//! VNPay compatible payment gateway adapter.
//!
//! Checkout redirects the buyer to a signed gateway URL. The gateway later
//! calls the IPN endpoint with the transaction outcome, signed with the
//! same shared secret.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha512;
use thiserror::Error;
use uuid::Uuid;

use crate::configuration::PaymentSettings;

type HmacSha512 = Hmac<Sha512>;

const VERSION: &str = "2.1.0";
const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
const SUCCESS_CODE: &str = "00";

#[derive(Clone)]
pub struct PaymentGateway{
    payment_url: String,
    tmn_code: String,
    hash_secret: SecretString,
    return_url: String,
    expire_minutes: i64
}

#[derive(Debug)]
pub struct PaymentRequest<'a>{
    pub order_id: Uuid,
    pub amount: i64,
    pub client_ip: &'a str,
    pub created_at: DateTime<Utc>
}

#[derive(Error, Debug)]
pub enum PaymentGatewayError{
    #[error("Gateway hash secret is not usable as an HMAC key")]
    InvalidSecret,
    #[error("Gateway timezone offset is out of range")]
    InvalidTimezone,
    #[error("Callback is missing parameter {0}")]
    MissingParameter(&'static str),
    #[error("Callback parameter {0} is malformed")]
    MalformedParameter(&'static str)
}

// Transaction outcome reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback{
    pub order_id: Uuid,
    // vnp_Amount as sent, in hundredths of a dong
    pub amount_minor: i64,
    pub response_code: String,
    pub transaction_status: String,
    pub transaction_no: Option<String>
}

impl PaymentCallback {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, PaymentGatewayError>{
        let get = |key: &'static str| {
            params.get(key)
                .map(|value| value.as_str())
                .ok_or(PaymentGatewayError::MissingParameter(key))
        };

        let order_id = Uuid::parse_str(get("vnp_TxnRef")?)
            .map_err(|_| PaymentGatewayError::MalformedParameter("vnp_TxnRef"))?;
        let amount_minor = get("vnp_Amount")?
            .parse::<i64>()
            .map_err(|_| PaymentGatewayError::MalformedParameter("vnp_Amount"))?;

        Ok(Self{
            order_id,
            amount_minor,
            response_code: get("vnp_ResponseCode")?.to_string(),
            transaction_status: get("vnp_TransactionStatus")?.to_string(),
            transaction_no: params.get("vnp_TransactionNo")
                .filter(|no| !no.is_empty() && no.as_str() != "0")
                .cloned()
        })
    }

    // Compared in minor units so a fractional amount never matches a whole total
    pub fn amount_matches(&self, total: i64) -> bool {
        total.checked_mul(100) == Some(self.amount_minor)
    }

    pub fn is_success(&self) -> bool {
        self.response_code == SUCCESS_CODE && self.transaction_status == SUCCESS_CODE
    }
}

// Acknowledgement body the gateway expects from the IPN endpoint
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct IpnResponse{
    #[serde(rename = "RspCode")]
    pub rsp_code: &'static str,
    #[serde(rename = "Message")]
    pub message: &'static str
}

impl IpnResponse {
    pub const CONFIRMED: IpnResponse = IpnResponse{ rsp_code: "00", message: "Confirm Success" };
    pub const ORDER_NOT_FOUND: IpnResponse = IpnResponse{ rsp_code: "01", message: "Order not found" };
    pub const ALREADY_CONFIRMED: IpnResponse = IpnResponse{ rsp_code: "02", message: "Order already confirmed" };
    pub const INVALID_AMOUNT: IpnResponse = IpnResponse{ rsp_code: "04", message: "Invalid amount" };
    pub const INVALID_SIGNATURE: IpnResponse = IpnResponse{ rsp_code: "97", message: "Invalid signature" };
    pub const UNKNOWN_ERROR: IpnResponse = IpnResponse{ rsp_code: "99", message: "Unknown error" };
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn query_string(params: &BTreeMap<&str, String>) -> String {
    params.iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

const GATEWAY_UTC_OFFSET_SECS: i32 = 7 * 3600;

// Gateway timestamps are wall-clock GMT+7
fn gateway_time(time: DateTime<Utc>) -> Result<String, PaymentGatewayError> {
    let offset = FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS)
        .ok_or(PaymentGatewayError::InvalidTimezone)?;

    Ok(time.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string())
}

impl PaymentGateway {
    pub fn new(settings: &PaymentSettings) -> Self {
        Self{
            payment_url: settings.payment_url.clone(),
            tmn_code: settings.tmn_code.clone(),
            hash_secret: settings.hash_secret.clone(),
            return_url: settings.return_url.clone(),
            expire_minutes: settings.expire_minutes
        }
    }

    fn sign(&self, data: &str) -> Result<String, PaymentGatewayError>{
        let mut mac = HmacSha512::new_from_slice(self.hash_secret.expose_secret().as_bytes())
            .map_err(|_| PaymentGatewayError::InvalidSecret)?;
        mac.update(data.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    #[tracing::instrument(
        "Building payment gateway url",
        skip(self),
        fields(order_id = %request.order_id)
    )]
    pub fn build_payment_url(&self, request: &PaymentRequest<'_>) -> Result<String, PaymentGatewayError>{
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("vnp_Version", VERSION.to_string());
        params.insert("vnp_Command", "pay".to_string());
        params.insert("vnp_TmnCode", self.tmn_code.clone());
        params.insert("vnp_Amount", (request.amount * 100).to_string());
        params.insert("vnp_CurrCode", "VND".to_string());
        params.insert("vnp_TxnRef", request.order_id.simple().to_string());
        params.insert("vnp_OrderInfo", format!("Thanh toan don hang {}", request.order_id.simple()));
        params.insert("vnp_OrderType", "other".to_string());
        params.insert("vnp_Locale", "vn".to_string());
        params.insert("vnp_ReturnUrl", self.return_url.clone());
        params.insert("vnp_IpAddr", request.client_ip.to_string());
        params.insert("vnp_CreateDate", gateway_time(request.created_at)?);
        params.insert(
            "vnp_ExpireDate",
            gateway_time(request.created_at + Duration::minutes(self.expire_minutes))?
        );

        let query = query_string(&params);
        let signature = self.sign(&query)?;

        Ok(format!("{}?{}&{}={}", self.payment_url, query, SECURE_HASH, signature))
    }

    // Recomputes the signature over every vnp_ parameter except the hash itself
    #[tracing::instrument(
        "Verifying payment callback signature",
        skip_all
    )]
    pub fn verify_callback(&self, params: &HashMap<String, String>) -> bool {
        let Some(provided) = params.get(SECURE_HASH) else {
            return false;
        };

        let signed: BTreeMap<&str, String> = params.iter()
            .filter(|(key, value)| {
                key.starts_with("vnp_")
                    && key.as_str() != SECURE_HASH
                    && key.as_str() != SECURE_HASH_TYPE
                    && !value.is_empty()
            })
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();

        match self.sign(&query_string(&signed)) {
            Ok(expected) => expected.eq_ignore_ascii_case(provided),
            Err(e) => {
                tracing::error!("{:?}", e);
                false
            }
        }
    }
}
