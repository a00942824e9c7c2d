use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::Pool;
use tracing_actix_web::TracingLogger;

use crate::{
    auth::jwt::Tokenizer,
    configuration::{DatabaseSettings, Settings},
    email_client::EmailClient,
    payment_gateway::PaymentGateway,
    routes::*,
    shipment_tracking::TrackingClient,
    utils::DbPool
};

// Public url used to build links sent by email
#[derive(Clone, Debug)]
pub struct BaseUrl(pub String);

pub struct Application{
    pub host: String,
    pub port: u16,
    pub server: Server,
    pub pool: DbPool,
    pub tracking_client: TrackingClient
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> Result<DbPool, r2d2::Error> {
    Pool::builder()
        .max_size(settings.max_connections)
        .build(ConnectionManager::<PgConnection>::new(settings.get_database_table_url()))
}

impl Application {
    pub async fn new(settings: Settings) -> Result<Self, anyhow::Error>{
        let listener = TcpListener::bind((settings.application.host.as_str(), settings.application.port))
            .context("Failed to bind application address")?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&settings.database)
            .context("Failed to build database connection pool")?;

        let email_client = EmailClient::new(&settings.email)
            .context("Failed to build email client")?;

        let tracking_client = TrackingClient::new(&settings.shipping)
            .context("Failed to build shipment tracking client")?;

        let server = run(
            listener,
            pool.clone(),
            Tokenizer::new(&settings.jwt),
            email_client,
            PaymentGateway::new(&settings.payment),
            BaseUrl(settings.application.base_url.clone())
        )?;

        Ok(Self{
            host: settings.application.host,
            port,
            server,
            pool,
            tracking_client
        })
    }
}

pub fn run(
    listener: TcpListener,
    pool: DbPool,
    tokenizer: Tokenizer,
    email_client: EmailClient,
    payment_gateway: PaymentGateway,
    base_url: BaseUrl
) -> Result<Server, std::io::Error> {
    let pool = web::Data::new(pool);
    let tokenizer = web::Data::new(tokenizer);
    let email_client = web::Data::new(email_client);
    let payment_gateway = web::Data::new(payment_gateway);
    let base_url = web::Data::new(base_url);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(tokenizer.clone())
            .app_data(email_client.clone())
            .app_data(payment_gateway.clone())
            .app_data(base_url.clone())
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/confirm", web::get().to(confirm))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/categories", web::get().to(get_categories))
            .route("/products", web::get().to(get_products))
            .route("/products/popular", web::get().to(get_popular))
            .route("/products/{id}", web::get().to(get_product))
            .route("/products/{id}/reviews", web::get().to(get_product_reviews))
            .route("/provinces", web::get().to(get_provinces))
            .route("/provinces/{id}/districts", web::get().to(get_districts))
            .route("/districts/{id}/wards", web::get().to(get_wards))
            .route("/payment/vnpay-ipn", web::get().to(get_vnpay_ipn))
            .service(
                web::scope("/user")
                    .route("/profile", web::get().to(get_profile))
                    .route("/profile", web::post().to(post_profile))
                    .route("/cart", web::get().to(get_user_cart))
                    .route("/cart", web::post().to(post_cart_item))
                    .route("/cart/{product_id}", web::put().to(put_cart_item))
                    .route("/cart/{product_id}", web::delete().to(delete_cart_item))
                    .route("/coupons/check", web::post().to(post_coupon_check))
                    .route("/orders", web::get().to(get_orders))
                    .route("/orders", web::post().to(post_order))
                    .route("/orders/{id}", web::get().to(get_order_detail))
                    .route("/orders/{id}", web::delete().to(delete_order))
                    .route("/products/{id}/reviews", web::post().to(post_product_review))
                    .route("/addresses", web::get().to(get_addresses))
                    .route("/addresses", web::post().to(post_address))
                    .route("/addresses/{id}", web::put().to(put_address))
                    .route("/addresses/{id}", web::delete().to(delete_user_address))
                    .route("/addresses/{id}/default", web::put().to(put_default_address))
            )
            .service(
                web::scope("/seller")
                    .route("/products", web::post().to(post_product))
                    .route("/products/{id}", web::put().to(put_product))
                    .route("/products/{id}", web::delete().to(delete_product))
                    .route("/orders", web::get().to(get_seller_orders))
            )
            .service(
                web::scope("/admin")
                    .route("/categories", web::post().to(post_category))
                    .route("/subcategories", web::post().to(post_subcategory))
                    .route("/coupons", web::get().to(get_coupons))
                    .route("/coupons", web::post().to(post_coupon))
                    .route("/coupons/{id}/deactivate", web::put().to(put_coupon_deactivate))
                    .route("/orders/{id}/status", web::put().to(put_order_status))
                    .route("/orders/{id}/shipment", web::post().to(post_order_shipment))
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
