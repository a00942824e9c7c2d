use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
use marketplace::{domain::status::AccountRole, models::{District, Province, Ward}, schema::user_addresses};
use uuid::Uuid;

use crate::helpers::{TestApp, TestUser, PROVINCE_ID};

async fn list_addresses(app: &TestApp, user: &TestUser) -> Vec<serde_json::Value>{
    let response = app.api_client.get(format!("{}/user/addresses", app.get_app_url()))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("Failed to send request to address endpoint");

    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

fn default_address_id(addresses: &[serde_json::Value]) -> String{
    let defaults: Vec<_> = addresses.iter()
        .filter(|address| address["is_default"] == true)
        .collect();
    assert_eq!(defaults.len(), 1);
    defaults[0]["address_id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn location_tree_is_browsable(){
    let app = TestApp::spawn_app().await;

    let provinces: Vec<Province> = app.api_client.get(format!("{}/provinces", app.get_app_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(provinces.iter().any(|province| province.province_id == PROVINCE_ID));

    let districts: Vec<District> = app.api_client.get(format!("{}/provinces/{}/districts", app.get_app_url(), PROVINCE_ID))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!districts.is_empty());
    assert!(districts.iter().all(|district| district.province_id == PROVINCE_ID));

    let wards: Vec<Ward> = app.api_client.get(format!("{}/districts/{}/wards", app.get_app_url(), districts[0].district_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(wards.iter().all(|ward| ward.district_id == districts[0].district_id));
}

#[actix_web::test]
async fn first_address_becomes_default_and_is_formatted(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let address_id = app.add_address(&user).await;

    let addresses = list_addresses(&app, &user).await;
    assert_eq!(addresses.len(), 1);
    assert_eq!(default_address_id(&addresses), address_id.to_string());
    assert_eq!(addresses[0]["full_address"], "12 Phan Dinh Phung, Phúc Xá, Ba Đình, Hà Nội");
}

#[actix_web::test]
async fn mismatched_location_is_rejected(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.post(format!("{}/user/addresses", app.get_app_url()))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({
            "recipient_name": "Nguyen Van A",
            "phone_number": "0912345678",
            "street": "1 Le Loi",
            "ward_id": 26734,
            "district_id": 1,
            "province_id": 1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn invalid_phone_number_is_rejected(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.post(format!("{}/user/addresses", app.get_app_url()))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({
            "recipient_name": "Nguyen Van A",
            "phone_number": "123",
            "street": "1 Le Loi",
            "ward_id": 1,
            "district_id": 1,
            "province_id": 1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn default_address_can_be_switched(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let first = app.add_address(&user).await;
    let second = app.add_address(&user).await;
    assert_eq!(default_address_id(&list_addresses(&app, &user).await), first.to_string());

    let response = app.api_client.put(format!("{}/user/addresses/{}/default", app.get_app_url(), second))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(default_address_id(&list_addresses(&app, &user).await), second.to_string());
}

#[actix_web::test]
async fn deleting_default_address_promotes_another(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let first = app.add_address(&user).await;
    let second = app.add_address(&user).await;

    let response = app.api_client.delete(format!("{}/user/addresses/{}", app.get_app_url(), first))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let addresses = list_addresses(&app, &user).await;
    assert_eq!(addresses.len(), 1);
    assert_eq!(default_address_id(&addresses), second.to_string());
}

#[actix_web::test]
async fn address_can_be_updated_by_owner_only(){
    let app = TestApp::spawn_app().await;
    let owner = app.create_user(AccountRole::Customer).await;
    let stranger = app.create_user(AccountRole::Customer).await;
    let address_id = app.add_address(&owner).await;

    let body = serde_json::json!({
        "recipient_name": "Tran Thi B",
        "phone_number": "0987654321",
        "street": "99 Xuan Thuy",
        "ward_id": 157,
        "district_id": 5,
        "province_id": 1
    });
    let url = format!("{}/user/addresses/{}", app.get_app_url(), address_id);

    let response = app.api_client.put(&url)
        .bearer_auth(&stranger.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = app.api_client.put(&url)
        .bearer_auth(&owner.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let addresses = list_addresses(&app, &owner).await;
    assert_eq!(addresses[0]["full_address"], "99 Xuan Thuy, Dịch Vọng, Cầu Giấy, Hà Nội");

    let response = app.api_client.delete(format!("{}/user/addresses/{}", app.get_app_url(), Uuid::new_v4()))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn concurrent_first_addresses_leave_one_default(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    futures_util::future::join_all((0..5).map(|_| app.add_address(&user))).await;

    let addresses = list_addresses(&app, &user).await;
    assert_eq!(addresses.len(), 5);
    let default_id = default_address_id(&addresses);

    // The database refuses a second default row
    let mut conn = app.pool.get().unwrap();
    let second_default = diesel::update(
        user_addresses::table
            .filter(user_addresses::user_id.eq(user.user_id))
            .filter(user_addresses::address_id.ne(Uuid::parse_str(&default_id).unwrap()))
    )
    .set(user_addresses::is_default.eq(true))
    .execute(&mut conn);
    assert!(second_default.is_err());
}
