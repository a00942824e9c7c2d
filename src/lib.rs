pub mod routes;
pub mod startup;
pub mod configuration;
pub mod telemetry;
pub mod utils;
pub mod schema;
pub mod models;
pub mod password;
pub mod email_client;
pub mod payment_gateway;
pub mod shipment_tracking;
pub mod domain;
pub mod auth;
pub mod db_interaction;
pub mod jobs;
