use marketplace::{domain::status::AccountRole, models::UserProfileInfo};

use crate::helpers::TestApp;

#[actix_web::test]
async fn get_profile_without_logged_in_user(){
    let app = TestApp::spawn_app().await;

    let response = app.api_client.get(format!("{}/user/profile", app.get_app_url()))
                    .send()
                    .await
                    .expect("Failed to send request to user profile endpoint");

    assert_eq!(response.status().as_u16(), 401)
}

#[actix_web::test]
async fn get_profile_with_logged_in_user(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.get(format!("{}/user/profile", app.get_app_url()))
                    .bearer_auth(&user.token)
                    .send()
                    .await
                    .expect("Failed to send request to user profile endpoint");

    assert_eq!(response.status().as_u16(), 200);

    let profile: UserProfileInfo = response.json().await.unwrap();
    assert_eq!(profile.email, user.email);
    assert_eq!(profile.name, "Test User");
    assert_eq!(profile.phone_number, None);
}

#[actix_web::test]
async fn post_profile_updates_only_given_fields(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.post(format!("{}/user/profile", app.get_app_url()))
                    .bearer_auth(&user.token)
                    .form(&serde_json::json!({
                        "name": "Tran Thi B",
                        "phone_number": "0912345678"
                    }))
                    .send()
                    .await
                    .unwrap();

    assert_eq!(response.status().as_u16(), 200);

    let profile: UserProfileInfo = app.api_client.get(format!("{}/user/profile", app.get_app_url()))
                    .bearer_auth(&user.token)
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();

    assert_eq!(profile.name, "Tran Thi B");
    assert_eq!(profile.email, user.email);
    assert_eq!(profile.phone_number.as_deref(), Some("0912345678"));
}

#[actix_web::test]
async fn post_profile_with_invalid_phone_number_is_rejected(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.post(format!("{}/user/profile", app.get_app_url()))
                    .bearer_auth(&user.token)
                    .form(&serde_json::json!({ "phone_number": "12" }))
                    .send()
                    .await
                    .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn post_profile_with_taken_email_conflicts(){
    let app = TestApp::spawn_app().await;
    let first = app.create_user(AccountRole::Customer).await;
    let second = app.create_user(AccountRole::Customer).await;

    let response = app.api_client.post(format!("{}/user/profile", app.get_app_url()))
                    .bearer_auth(&second.token)
                    .form(&serde_json::json!({ "email": first.email }))
                    .send()
                    .await
                    .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}
