use super::TestApp;
use serde_json::{json, Value};

pub const TEST_PASSWORD: &str = "TestPassword123!";

pub struct TestUser {
    pub email: String,
    pub user_id: String,
    pub token: String,
}

/// Sign up and log in; returns the bearer token.
pub async fn register_test_user(app: &TestApp, email: &str) -> TestUser {
    let response = app
        .client()
        .post(&app.path("/auth/signup"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 201, "signup failed: {}", response.text());

    let response = app
        .client()
        .post(&app.path("/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200, "login failed: {}", response.text());
    let body: Value = response.json();

    TestUser {
        email: email.to_string(),
        user_id: body["userId"].as_str().expect("userId").to_string(),
        token: body["accessToken"].as_str().expect("accessToken").to_string(),
    }
}

pub fn bearer(user: &TestUser) -> String {
    format!("Bearer {}", user.token)
}
