use std::{collections::BTreeMap, error::Error};

use chrono::Utc;
use diesel::{pg::Pg, r2d2::ConnectionManager, Connection, PgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use hmac::{Hmac, Mac};
use marketplace::{
    configuration::{DatabaseSettings, Settings},
    domain::status::AccountRole,
    models::{Category, Product, Subcategory, User},
    password::compute_password_hash,
    routes::LoginResponse,
    schema::{categories, products, subcategories, users},
    shipment_tracking::TrackingClient,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
    utils::DbPool
};
use once_cell::sync::Lazy;
use r2d2::Pool;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha512;
use uuid::Uuid;
use wiremock::MockServer;

static LOGGER_INSTANCE: Lazy<()> = Lazy::new(|| {
    let log_level = "info".to_string();
    let name = "marketplace-test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(name, log_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(name, log_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub const TEST_PASSWORD: &str = "testpassword";

// Seeded by the locations migration: Ba Đình, Hà Nội
pub const PROVINCE_ID: i32 = 1;
pub const DISTRICT_ID: i32 = 1;
pub const WARD_ID: i32 = 1;
pub const PROVINCE_SHIPPING_FEE: i64 = 20000;

fn run_migrations(connection: &mut impl MigrationHarness<Pg>)
    -> Result<(), Box<dyn Error + Send + Sync + 'static>>
{
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

// Body the app posts to the email api
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveEmailRequest{
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String
}

pub struct TestUser{
    pub user_id: Uuid,
    pub email: String,
    pub token: String
}

pub struct TestApp{
    pub host: String,
    pub port: u16,
    pub pool: DbPool,
    pub email_api: MockServer,
    pub tracking_api: MockServer,
    pub tracking_client: TrackingClient,
    pub settings: Settings,
    pub api_client: reqwest::Client
}

impl TestApp {
    fn create_db(settings: &DatabaseSettings) -> DbPool{
        let mut connection = PgConnection::establish(&settings.get_database_url())
                                .expect("Failed to connect to postgres database");

        let query = format!(r#"CREATE DATABASE "{}";"#, settings.name);
        diesel::sql_query(query)
            .execute(&mut connection)
            .expect("Failed to create test database");

        let pool = Pool::new(ConnectionManager::<PgConnection>::new(settings.get_database_table_url()))
            .expect("Failed to build connection pool to test database");

        let mut conn = pool.get().expect("Failed to get connection to test database");
        run_migrations(&mut conn).expect("Failed to run migrations");

        pool
    }

    pub fn get_app_url(&self) -> String{
        format!("http://{}:{}", self.host, self.port)
    }

    pub async fn spawn_app() -> TestApp{
        Lazy::force(&LOGGER_INSTANCE);

        let email_api = MockServer::start().await;
        let tracking_api = MockServer::start().await;

        let mut settings = Settings::get();
        settings.application.port = 0;
        settings.database.name = Uuid::new_v4().to_string();
        settings.email.api_uri = email_api.uri();
        settings.shipping.api_uri = tracking_api.uri();
        settings.jobs.enabled = false;

        let pool = TestApp::create_db(&settings.database);

        let application = Application::new(settings.clone())
                            .await
                            .expect("Failed to build application");

        let host = application.host.clone();
        let port = application.port;
        let tracking_client = application.tracking_client.clone();

        tokio::task::spawn(application.server);

        let api_client = reqwest::Client::builder()
                            .redirect(Policy::none())
                            .cookie_store(true)
                            .build()
                            .unwrap();

        TestApp{
            host,
            port,
            pool,
            email_api,
            tracking_api,
            tracking_client,
            settings,
            api_client
        }
    }

    pub fn get_confirmation_link(&self, text: &str) -> String{
        let links: Vec<_> = linkify::LinkFinder::new()
                    .links(text)
                    .filter(|l| *l.kind() == linkify::LinkKind::Url)
                    .collect();
        assert_eq!(links.len(), 1);
        let raw_link = links[0].as_str().to_owned();
        let mut confirmation_link = reqwest::Url::parse(&raw_link).unwrap();

        assert_eq!(confirmation_link.host_str().unwrap(), "localhost");
        confirmation_link.set_port(Some(self.port)).unwrap();

        confirmation_link.to_string()
    }

    pub async fn post_register(&self, body: &serde_json::Value) -> reqwest::Response{
        self.api_client.post(format!("{}/register", self.get_app_url()))
            .form(body)
            .send()
            .await
            .expect("Failed to send request to register endpoint")
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response{
        let body = serde_json::json!({
            "email": email,
            "password": password
        });

        // Fresh client so the login cookie does not leak between test users
        reqwest::Client::new()
            .post(format!("{}/login", self.get_app_url()))
            .form(&body)
            .send()
            .await
            .expect("Failed to send request to login endpoint")
    }

    // Inserts a confirmed account with the given role and logs it in
    pub async fn create_user(&self, role: AccountRole) -> TestUser{
        let user_id = Uuid::new_v4();
        let email = format!("{}@example.com", user_id.simple());
        let hash = compute_password_hash(SecretString::from(TEST_PASSWORD.to_string())).unwrap();

        let user = User{
            user_id,
            name: "Test User".to_string(),
            email: email.clone(),
            password: hash.expose_secret().to_string(),
            status: Some("confirmed".to_string()),
            role: role.as_str().to_string(),
            phone_number: None
        };

        {
            let mut conn = self.pool.get().unwrap();
            diesel::insert_into(users::table)
                .values(&user)
                .execute(&mut conn)
                .unwrap();
        }

        let response = self.post_login(&email, TEST_PASSWORD).await;
        assert_eq!(response.status().as_u16(), 200);
        let token = response.json::<LoginResponse>().await.unwrap().token;

        TestUser{ user_id, email, token }
    }

    // Returns (category_id, subcategory_id)
    pub fn seed_subcategory(&self, category_name: &str) -> (Uuid, Uuid){
        let category = Category{
            category_id: Uuid::new_v4(),
            name: category_name.to_string()
        };
        let subcategory = Subcategory{
            subcategory_id: Uuid::new_v4(),
            category_id: category.category_id,
            name: format!("{} misc", category_name)
        };

        let mut conn = self.pool.get().unwrap();
        diesel::insert_into(categories::table)
            .values(&category)
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(subcategories::table)
            .values(&subcategory)
            .execute(&mut conn)
            .unwrap();

        (category.category_id, subcategory.subcategory_id)
    }

    pub fn seed_product(&self, seller_id: Uuid, subcategory_id: Uuid, name: &str, price: i64, stock: i32) -> Uuid{
        let product = Product{
            product_id: Uuid::new_v4(),
            seller_id,
            subcategory_id,
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            photo_url: None,
            is_active: true,
            created_at: Utc::now()
        };

        let mut conn = self.pool.get().unwrap();
        diesel::insert_into(products::table)
            .values(&product)
            .execute(&mut conn)
            .unwrap();

        product.product_id
    }

    pub fn product_stock(&self, product_id: Uuid) -> i32{
        use diesel::{ExpressionMethods, QueryDsl};

        let mut conn = self.pool.get().unwrap();
        products::table
            .select(products::stock)
            .filter(products::product_id.eq(product_id))
            .first::<i32>(&mut conn)
            .unwrap()
    }

    pub async fn add_to_cart(&self, user: &TestUser, product_id: Uuid, quantity: i32) -> reqwest::Response{
        self.api_client.post(format!("{}/user/cart", self.get_app_url()))
            .bearer_auth(&user.token)
            .json(&serde_json::json!({
                "product_id": product_id,
                "quantity": quantity
            }))
            .send()
            .await
            .expect("Failed to send request to cart endpoint")
    }

    pub async fn add_address(&self, user: &TestUser) -> Uuid{
        let response = self.api_client.post(format!("{}/user/addresses", self.get_app_url()))
            .bearer_auth(&user.token)
            .json(&serde_json::json!({
                "recipient_name": "Nguyen Van A",
                "phone_number": "0912345678",
                "street": "12 Phan Dinh Phung",
                "ward_id": WARD_ID,
                "district_id": DISTRICT_ID,
                "province_id": PROVINCE_ID
            }))
            .send()
            .await
            .expect("Failed to send request to address endpoint");

        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        Uuid::parse_str(body["address_id"].as_str().unwrap()).unwrap()
    }

    pub async fn place_order(&self, user: &TestUser, address_id: Uuid, payment_method: &str, coupon_code: Option<&str>) -> reqwest::Response{
        self.api_client.post(format!("{}/user/orders", self.get_app_url()))
            .bearer_auth(&user.token)
            .json(&serde_json::json!({
                "address_id": address_id,
                "payment_method": payment_method,
                "coupon_code": coupon_code
            }))
            .send()
            .await
            .expect("Failed to send request to orders endpoint")
    }

    pub async fn set_order_status(&self, admin: &TestUser, order_id: Uuid, status: &str) -> reqwest::Response{
        self.api_client.put(format!("{}/admin/orders/{}/status", self.get_app_url(), order_id))
            .bearer_auth(&admin.token)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .expect("Failed to send request to order status endpoint")
    }

    // IPN query parameters signed with the configured gateway secret
    pub fn signed_ipn_params(&self, order_id: Uuid, amount: i64, response_code: &str) -> Vec<(String, String)>{
        self.signed_ipn_params_minor(order_id, amount * 100, response_code)
    }

    // Same as signed_ipn_params with vnp_Amount given as sent on the wire
    pub fn signed_ipn_params_minor(&self, order_id: Uuid, amount_minor: i64, response_code: &str) -> Vec<(String, String)>{
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("vnp_TmnCode".to_string(), self.settings.payment.tmn_code.clone());
        params.insert("vnp_TxnRef".to_string(), order_id.simple().to_string());
        params.insert("vnp_Amount".to_string(), amount_minor.to_string());
        params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
        params.insert("vnp_TransactionStatus".to_string(), response_code.to_string());
        params.insert("vnp_TransactionNo".to_string(), "14123456".to_string());
        params.insert("vnp_BankCode".to_string(), "NCB".to_string());

        let query = params.iter()
            .map(|(key, value)| {
                let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{}={}", key, value)
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut mac = Hmac::<Sha512>::new_from_slice(self.settings.payment.hash_secret.expose_secret().as_bytes()).unwrap();
        mac.update(query.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let mut params: Vec<(String, String)> = params.into_iter().collect();
        params.push(("vnp_SecureHash".to_string(), signature));
        params
    }

    pub async fn get_ipn(&self, params: &[(String, String)]) -> serde_json::Value{
        let response = self.api_client.get(format!("{}/payment/vnpay-ipn", self.get_app_url()))
            .query(params)
            .send()
            .await
            .expect("Failed to send request to ipn endpoint");

        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }
}
