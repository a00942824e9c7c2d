use marketplace::{db_interaction::PopularProductEntry, domain::status::AccountRole, jobs::{poll_shipments_tick, refresh_popular_products_tick, ShipmentPollSummary}, models::SalesOrder};
use uuid::Uuid;
use wiremock::{matchers::{body_json, method, path}, Mock, ResponseTemplate};

use crate::helpers::{TestApp, TestUser};

async fn order_of(app: &TestApp, buyer: &TestUser, address_id: Uuid, items: &[(Uuid, i32)]) -> SalesOrder{
    for (product_id, quantity) in items {
        assert_eq!(app.add_to_cart(buyer, *product_id, *quantity).await.status().as_u16(), 200);
    }

    let response = app.place_order(buyer, address_id, "cod", None).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    serde_json::from_value(body["order"].clone()).unwrap()
}

async fn ship(app: &TestApp, admin: &TestUser, order_id: Uuid, tracking_code: &str){
    let response = app.api_client.post(format!("{}/admin/orders/{}/shipment", app.get_app_url(), order_id))
        .bearer_auth(&admin.token)
        .json(&serde_json::json!({ "tracking_code": tracking_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

fn carrier_reply(status: &str) -> ResponseTemplate{
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "code": 200,
        "message": "Success",
        "data": { "status": status }
    }))
}

async fn order_status(app: &TestApp, admin: &TestUser, order_id: Uuid) -> String{
    let detail: serde_json::Value = app.api_client.get(format!("{}/user/orders/{}", app.get_app_url(), order_id))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    detail["status"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn popular_products_rank_recent_sales(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Stationery");
    let pen = app.seed_product(seller.user_id, subcategory_id, "Pen", 10000, 50);
    let notebook = app.seed_product(seller.user_id, subcategory_id, "Notebook", 25000, 50);
    let ruler = app.seed_product(seller.user_id, subcategory_id, "Ruler", 8000, 50);
    let address_id = app.add_address(&buyer).await;

    order_of(&app, &buyer, address_id, &[(pen, 2), (notebook, 5)]).await;
    order_of(&app, &buyer, address_id, &[(pen, 4)]).await;

    // Cancelled sales do not count
    let cancelled = order_of(&app, &buyer, address_id, &[(ruler, 9)]).await;
    let response = app.api_client.delete(format!("{}/user/orders/{}", app.get_app_url(), cancelled.order_id))
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let cached = refresh_popular_products_tick(&app.pool, 10).await.unwrap();
    assert_eq!(cached, 2);

    let popular: Vec<PopularProductEntry> = app.api_client.get(format!("{}/products/popular", app.get_app_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(popular.len(), 2);
    assert_eq!(popular[0].product.product_id, pen);
    assert_eq!(popular[0].sold_quantity, 6);
    assert_eq!(popular[1].product.product_id, notebook);
    assert_eq!(popular[1].sold_quantity, 5);

    assert_eq!(refresh_popular_products_tick(&app.pool, 1).await.unwrap(), 1);
}

#[actix_web::test]
async fn shipment_poll_applies_final_carrier_statuses(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_user(AccountRole::Admin).await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Garden");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Hose", 120000, 10);
    let address_id = app.add_address(&buyer).await;

    let delivered = order_of(&app, &buyer, address_id, &[(product_id, 1)]).await;
    let returned = order_of(&app, &buyer, address_id, &[(product_id, 2)]).await;
    let moving = order_of(&app, &buyer, address_id, &[(product_id, 3)]).await;
    ship(&app, &admin, delivered.order_id, "GHN-DELIVERED").await;
    ship(&app, &admin, returned.order_id, "GHN-RETURNED").await;
    ship(&app, &admin, moving.order_id, "GHN-MOVING").await;
    assert_eq!(app.product_stock(product_id), 4);

    for (code, status) in [("GHN-DELIVERED", "delivered"), ("GHN-RETURNED", "returned"), ("GHN-MOVING", "delivering")] {
        Mock::given(method("POST"))
            .and(path("/shipping-order/detail"))
            .and(body_json(serde_json::json!({ "order_code": code })))
            .respond_with(carrier_reply(status))
            .expect(1)
            .mount(&app.tracking_api)
            .await;
    }

    let summary = poll_shipments_tick(&app.pool, &app.tracking_client).await.unwrap();
    assert_eq!(summary, ShipmentPollSummary{ checked: 3, updated: 2, failed: 0 });

    assert_eq!(order_status(&app, &admin, delivered.order_id).await, "delivered");
    assert_eq!(order_status(&app, &admin, returned.order_id).await, "returned");
    assert_eq!(order_status(&app, &admin, moving.order_id).await, "shipping");
    assert_eq!(app.product_stock(product_id), 6);
}

#[actix_web::test]
async fn shipment_poll_survives_carrier_errors(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_user(AccountRole::Admin).await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Garden");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Hose", 120000, 10);
    let address_id = app.add_address(&buyer).await;

    let broken = order_of(&app, &buyer, address_id, &[(product_id, 1)]).await;
    let fine = order_of(&app, &buyer, address_id, &[(product_id, 1)]).await;
    ship(&app, &admin, broken.order_id, "GHN-BROKEN").await;
    ship(&app, &admin, fine.order_id, "GHN-FINE").await;

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({ "order_code": "GHN-BROKEN" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.tracking_api)
        .await;
    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({ "order_code": "GHN-FINE" })))
        .respond_with(carrier_reply("delivered"))
        .mount(&app.tracking_api)
        .await;

    let summary = poll_shipments_tick(&app.pool, &app.tracking_client).await.unwrap();
    assert_eq!(summary, ShipmentPollSummary{ checked: 2, updated: 1, failed: 1 });

    assert_eq!(order_status(&app, &admin, broken.order_id).await, "shipping");
    assert_eq!(order_status(&app, &admin, fine.order_id).await, "delivered");
}
