use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::user_email::UserEmail;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings{
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JWTSettings,
    pub email: EmailSettings,
    pub payment: PaymentSettings,
    pub shipping: ShippingSettings,
    pub jobs: JobSettings
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApplicationSettings{
    pub host: String,
    pub port: u16,
    pub base_url: String
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings{
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub name: String,
    pub max_connections: u32
}

impl DatabaseSettings {
    // Url of the database server, used to create databases
    pub fn get_database_url(&self) -> String{
        format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port
        )
    }

    // Url of the application database
    pub fn get_database_table_url(&self) -> String{
        format!("{}/{}", self.get_database_url(), self.name)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct JWTSettings{
    pub secret: String,
    pub expiry_hours: u64
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings{
    pub api_uri: String,
    pub sender: String,
    pub authorization_token: SecretString,
    pub timeout_secs: u64
}

impl EmailSettings {
    pub fn sender(&self) -> Result<UserEmail, String>{
        UserEmail::parse(self.sender.clone())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaymentSettings{
    pub payment_url: String,
    pub tmn_code: String,
    pub hash_secret: SecretString,
    pub return_url: String,
    pub expire_minutes: i64
}

#[derive(Deserialize, Debug, Clone)]
pub struct ShippingSettings{
    pub api_uri: String,
    pub token: SecretString,
    pub timeout_secs: u64
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobSettings{
    pub enabled: bool,
    pub popular_products_interval_secs: u64,
    pub popular_products_limit: i64,
    pub shipment_poll_interval_secs: u64
}

impl Settings{
    pub fn get() -> Self{
        Self::try_get().expect("Failed to read configuration")
    }

    // base.yaml overridden by APP_ prefixed environment variables,
    // e.g. APP_DATABASE__PORT=5433
    pub fn try_get() -> Result<Self, ConfigError>{
        Config::builder()
            .add_source(File::with_name("configuration/base.yaml"))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
            )
            .build()?
            .try_deserialize::<Settings>()
    }
}
