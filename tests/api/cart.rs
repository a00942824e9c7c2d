use marketplace::domain::status::AccountRole;
use uuid::Uuid;

use crate::helpers::{TestApp, TestUser};

async fn get_cart(app: &TestApp, user: &TestUser) -> serde_json::Value{
    let response = app.api_client.get(format!("{}/user/cart", app.get_app_url()))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("Failed to send request to cart endpoint");

    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[actix_web::test]
async fn cart_requires_login(){
    let app = TestApp::spawn_app().await;

    let response = app.api_client.get(format!("{}/user/cart", app.get_app_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn adding_same_product_twice_merges_quantities(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let novel = app.seed_product(seller.user_id, subcategory_id, "Novel", 85000, 10);
    let comic = app.seed_product(seller.user_id, subcategory_id, "Comic", 30000, 10);

    assert_eq!(app.add_to_cart(&buyer, novel, 2).await.status().as_u16(), 200);
    assert_eq!(app.add_to_cart(&buyer, novel, 1).await.status().as_u16(), 200);
    assert_eq!(app.add_to_cart(&buyer, comic, 4).await.status().as_u16(), 200);

    let cart = get_cart(&app, &buyer).await;
    let items = cart["items"].as_array().unwrap();

    assert_eq!(items.len(), 2);
    let novel_line = items.iter()
        .find(|item| item["product_id"] == novel.to_string())
        .unwrap();
    assert_eq!(novel_line["quantity"], 3);
    assert_eq!(novel_line["line_total"], 255000);
    assert_eq!(cart["subtotal"], 3 * 85000 + 4 * 30000);
}

#[actix_web::test]
async fn adding_more_than_stock_conflicts(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Rare Print", 500000, 2);

    assert_eq!(app.add_to_cart(&buyer, product_id, 2).await.status().as_u16(), 200);
    assert_eq!(app.add_to_cart(&buyer, product_id, 1).await.status().as_u16(), 409);

    let cart = get_cart(&app, &buyer).await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[actix_web::test]
async fn adding_past_the_quantity_limit_conflicts(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Atlas", 120000, 10);

    assert_eq!(app.add_to_cart(&buyer, product_id, 1).await.status().as_u16(), 200);
    assert_eq!(app.add_to_cart(&buyer, product_id, i32::MAX).await.status().as_u16(), 409);

    let cart = get_cart(&app, &buyer).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[actix_web::test]
async fn adding_unknown_product_is_not_found(){
    let app = TestApp::spawn_app().await;
    let buyer = app.create_user(AccountRole::Customer).await;

    assert_eq!(app.add_to_cart(&buyer, Uuid::new_v4(), 1).await.status().as_u16(), 404);
}

#[actix_web::test]
async fn zero_quantity_is_rejected(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Novel", 85000, 10);

    assert_eq!(app.add_to_cart(&buyer, product_id, 0).await.status().as_u16(), 400);
}

#[actix_web::test]
async fn quantity_can_be_changed_and_line_removed(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let buyer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Novel", 85000, 10);

    app.add_to_cart(&buyer, product_id, 1).await;
    let url = format!("{}/user/cart/{}", app.get_app_url(), product_id);

    let response = app.api_client.put(&url)
        .bearer_auth(&buyer.token)
        .json(&serde_json::json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(get_cart(&app, &buyer).await["subtotal"], 5 * 85000);

    let response = app.api_client.put(&url)
        .bearer_auth(&buyer.token)
        .json(&serde_json::json!({ "quantity": 11 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app.api_client.delete(&url)
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let cart = get_cart(&app, &buyer).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["subtotal"], 0);

    let response = app.api_client.delete(&url)
        .bearer_auth(&buyer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn carts_are_private_to_each_user(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let first = app.create_user(AccountRole::Customer).await;
    let second = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Books");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Novel", 85000, 10);

    app.add_to_cart(&first, product_id, 1).await;

    let cart = get_cart(&app, &second).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}
