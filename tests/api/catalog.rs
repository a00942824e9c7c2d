use marketplace::{db_interaction::{CategoryWithSubcategories, ProductDetail}, domain::status::AccountRole, models::{Category, Product, Subcategory}};
use uuid::Uuid;

use crate::helpers::TestApp;

#[actix_web::test]
async fn admin_builds_category_tree(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_user(AccountRole::Admin).await;

    let response = app.api_client.post(format!("{}/admin/categories", app.get_app_url()))
        .bearer_auth(&admin.token)
        .json(&serde_json::json!({ "name": "Electronics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let category: Category = response.json().await.unwrap();

    let response = app.api_client.post(format!("{}/admin/subcategories", app.get_app_url()))
        .bearer_auth(&admin.token)
        .json(&serde_json::json!({ "category_id": category.category_id, "name": "Phones" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let subcategory: Subcategory = response.json().await.unwrap();
    assert_eq!(subcategory.category_id, category.category_id);

    let tree: Vec<CategoryWithSubcategories> = app.api_client.get(format!("{}/categories", app.get_app_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Electronics");
    assert_eq!(tree[0].subcategories.len(), 1);
    assert_eq!(tree[0].subcategories[0].name, "Phones");
}

#[actix_web::test]
async fn duplicate_category_conflicts(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_user(AccountRole::Admin).await;

    for expected in [201, 409] {
        let response = app.api_client.post(format!("{}/admin/categories", app.get_app_url()))
            .bearer_auth(&admin.token)
            .json(&serde_json::json!({ "name": "Books" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }
}

#[actix_web::test]
async fn subcategory_of_unknown_category_is_not_found(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_user(AccountRole::Admin).await;

    let response = app.api_client.post(format!("{}/admin/subcategories", app.get_app_url()))
        .bearer_auth(&admin.token)
        .json(&serde_json::json!({ "category_id": Uuid::new_v4(), "name": "Orphans" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn non_admin_cannot_create_categories(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;

    let response = app.api_client.post(format!("{}/admin/categories", app.get_app_url()))
        .bearer_auth(&seller.token)
        .json(&serde_json::json!({ "name": "Electronics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[actix_web::test]
async fn seller_posts_product_and_buyers_see_it(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let (category_id, subcategory_id) = app.seed_subcategory("Electronics");

    let response = app.api_client.post(format!("{}/seller/products", app.get_app_url()))
        .bearer_auth(&seller.token)
        .json(&serde_json::json!({
            "subcategory_id": subcategory_id,
            "name": "Galaxy A15",
            "description": "6.5 inch phone",
            "price": 4990000,
            "stock": 12,
            "photo_url": "https://cdn.example.com/a15.png"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let product: Product = response.json().await.unwrap();
    assert_eq!(product.seller_id, seller.user_id);
    assert!(product.is_active);

    let detail: ProductDetail = app.api_client.get(format!("{}/products/{}", app.get_app_url(), product.product_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail.product.name, "Galaxy A15");
    assert_eq!(detail.category_id, category_id);
    assert_eq!(detail.review_count, 0);
    assert_eq!(detail.average_rating, None);

    let listed: Vec<Product> = app.api_client.get(format!("{}/products?category_id={}", app.get_app_url(), category_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].product_id, product.product_id);
}

#[actix_web::test]
async fn invalid_product_is_rejected(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");

    let test_cases = vec![
        (serde_json::json!({ "subcategory_id": subcategory_id, "name": "", "price": 1000, "stock": 1 }), "empty name"),
        (serde_json::json!({ "subcategory_id": subcategory_id, "name": "   ", "price": 1000, "stock": 1 }), "blank name"),
        (serde_json::json!({ "subcategory_id": subcategory_id, "name": "Cable", "price": 0, "stock": 1 }), "zero price"),
        (serde_json::json!({ "subcategory_id": subcategory_id, "name": "Cable", "price": 1000, "stock": -1 }), "negative stock"),
        (serde_json::json!({ "subcategory_id": subcategory_id, "name": "Cable", "price": 1000, "stock": 1, "photo_url": "not a url" }), "bad photo url")
    ];

    for (body, description) in test_cases {
        let response = app.api_client.post(format!("{}/seller/products", app.get_app_url()))
            .bearer_auth(&seller.token)
            .json(&body)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400, "Product with {} was accepted", description);
    }
}

#[actix_web::test]
async fn customer_cannot_post_products(){
    let app = TestApp::spawn_app().await;
    let customer = app.create_user(AccountRole::Customer).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");

    let response = app.api_client.post(format!("{}/seller/products", app.get_app_url()))
        .bearer_auth(&customer.token)
        .json(&serde_json::json!({ "subcategory_id": subcategory_id, "name": "Cable", "price": 1000, "stock": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[actix_web::test]
async fn product_search_matches_name_case_insensitively(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");
    app.seed_product(seller.user_id, subcategory_id, "USB-C Cable", 90000, 10);
    app.seed_product(seller.user_id, subcategory_id, "Phone Case", 120000, 10);

    let listed: Vec<Product> = app.api_client.get(format!("{}/products?search=cable", app.get_app_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "USB-C Cable");
}

#[actix_web::test]
async fn only_owner_or_admin_may_update_product(){
    let app = TestApp::spawn_app().await;
    let owner = app.create_user(AccountRole::Seller).await;
    let other = app.create_user(AccountRole::Seller).await;
    let admin = app.create_user(AccountRole::Admin).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");
    let product_id = app.seed_product(owner.user_id, subcategory_id, "Charger", 150000, 5);

    let url = format!("{}/seller/products/{}", app.get_app_url(), product_id);

    let response = app.api_client.put(&url)
        .bearer_auth(&other.token)
        .json(&serde_json::json!({ "price": 1000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app.api_client.put(&url)
        .bearer_auth(&owner.token)
        .json(&serde_json::json!({ "price": 140000, "stock": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let product: Product = response.json().await.unwrap();
    assert_eq!(product.price, 140000);
    assert_eq!(product.stock, 8);
    assert_eq!(product.name, "Charger");

    let response = app.api_client.put(&url)
        .bearer_auth(&admin.token)
        .json(&serde_json::json!({ "name": "Fast Charger" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app.api_client.put(&url)
        .bearer_auth(&owner.token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn deleted_product_is_hidden(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Earbuds", 300000, 3);

    let response = app.api_client.delete(format!("{}/seller/products/{}", app.get_app_url(), product_id))
        .bearer_auth(&seller.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app.api_client.get(format!("{}/products/{}", app.get_app_url(), product_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let listed: Vec<Product> = app.api_client.get(format!("{}/products", app.get_app_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[actix_web::test]
async fn product_listing_rejects_bad_paging(){
    let app = TestApp::spawn_app().await;

    let response = app.api_client.get(format!("{}/products?page=0", app.get_app_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn blank_name_update_is_rejected(){
    let app = TestApp::spawn_app().await;
    let seller = app.create_user(AccountRole::Seller).await;
    let (_, subcategory_id) = app.seed_subcategory("Electronics");
    let product_id = app.seed_product(seller.user_id, subcategory_id, "Charger", 150000, 5);

    let response = app.api_client.put(format!("{}/seller/products/{}", app.get_app_url(), product_id))
        .bearer_auth(&seller.token)
        .json(&serde_json::json!({ "name": " \t  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let detail: ProductDetail = app.api_client.get(format!("{}/products/{}", app.get_app_url(), product_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail.product.name, "Charger");
}
