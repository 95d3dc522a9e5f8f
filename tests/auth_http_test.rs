mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{seed_user, TestApp};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn login_returns_a_usable_token() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({
                "email": "admin@tabacaria.test",
                "password": "secret-password",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().expect("token missing");
    assert!(body["user"].get("password_hash").is_none());

    let response = app
        .router()
        .oneshot(request(Method::GET, "/api/users/profile", Some(token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@tabacaria.test");
}

#[tokio::test]
async fn wrong_credentials_are_rejected_uniformly() {
    let app = TestApp::new().await;
    for (email, password) in [
        ("admin@tabacaria.test", "wrong-password"),
        ("nobody@tabacaria.test", "secret-password"),
    ] {
        let response = app
            .router()
            .oneshot(request(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "email": email, "password": password })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(request(Method::GET, "/api/products", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router()
        .oneshot(request(
            Method::GET,
            "/api/products",
            Some("not-a-real-token"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = TestApp::new().await;
    let seller = seed_user(&app.state, "Seller", "seller@tabacaria.test", false).await;
    let seller_token = app.state.auth.generate_token(&seller).unwrap();

    let response = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/users/register",
            Some(&seller_token),
            Some(json!({
                "name": "New User",
                "email": "new@tabacaria.test",
                "password": "another-secret",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/users/register",
            Some(&app.admin_token),
            Some(json!({
                "name": "New User",
                "email": "new@tabacaria.test",
                "password": "another-secret",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn tokens_of_deleted_users_stop_working() {
    use sea_orm::EntityTrait;
    use tabacaria_api::entities::user;

    let app = TestApp::new().await;
    let seller = seed_user(&app.state, "Seller", "seller@tabacaria.test", false).await;
    let seller_token = app.state.auth.generate_token(&seller).unwrap();

    user::Entity::delete_by_id(seller.id)
        .exec(&*app.state.db)
        .await
        .unwrap();

    let response = app
        .router()
        .oneshot(request(
            Method::GET,
            "/api/users/profile",
            Some(&seller_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn demoted_admins_lose_admin_access_immediately() {
    use sea_orm::{ActiveModelTrait, Set};
    use tabacaria_api::entities::user;

    let app = TestApp::new().await;

    // Token minted while the account was still an admin.
    let old_token = app.admin_token.clone();
    let mut model: user::ActiveModel = app.admin.clone().into();
    model.is_admin = Set(false);
    model.update(&*app.state.db).await.unwrap();

    let response = app
        .router()
        .oneshot(request(Method::GET, "/api/users", Some(&old_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Plain authenticated routes still work for the demoted account.
    let response = app
        .router()
        .oneshot(request(
            Method::GET,
            "/api/users/profile",
            Some(&old_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_answers_on_the_collection_route() {
    let app = TestApp::new().await;
    for uri in ["/api/dashboard", "/api/dashboard/stats"] {
        let response = app
            .router()
            .oneshot(request(Method::GET, uri, Some(&app.admin_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_json(response).await;
        assert!(body.get("totalProducts").is_some(), "{uri}");
    }
}

#[tokio::test]
async fn validation_failures_map_to_bad_request() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/sales",
            Some(&app.admin_token),
            Some(json!({ "items": [] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
