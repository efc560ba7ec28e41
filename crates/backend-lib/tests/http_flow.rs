//! End-to-end tests driving the router with a stub identity provider.
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use backend_lib::{
    auth::{ExchangeError, IdentityProfile, IdentityProvider, ProviderRegistry},
    config::Settings,
    create_router,
    storage::MemoryStorage,
    AppState,
};
use tower::ServiceExt;

enum Outcome {
    Succeed,
    Fail,
}

struct StubProvider(Outcome);

#[async_trait]
impl IdentityProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn label(&self) -> &str {
        "Stub"
    }

    fn begin_exchange(&self, state: &str) -> Result<String, ExchangeError> {
        Ok(format!("https://idp.example/authorize?state={state}"))
    }

    async fn complete_exchange(&self, code: &str) -> Result<IdentityProfile, ExchangeError> {
        match self.0 {
            Outcome::Succeed if code == "good-code" => Ok(IdentityProfile {
                subject: "1815".to_string(),
                given_name: Some("Ada".to_string()),
                family_name: Some("Lovelace".to_string()),
                ..IdentityProfile::default()
            }),
            Outcome::Succeed => Err(ExchangeError::InvalidArtifact(code.to_string())),
            Outcome::Fail => Err(ExchangeError::Provider {
                status: 502,
                body: "connection reset".to_string(),
            }),
        }
    }
}

async fn app(outcome: Outcome) -> Router {
    let mut settings = Settings::default();
    settings.storage.list_delay_ms = 0;
    let providers = ProviderRegistry::new().with(Arc::new(StubProvider(outcome)));
    let state =
        AppState::with_providers(Arc::new(MemoryStorage::new()), settings, providers).unwrap();
    state.tasks.seed_sample_tasks().await.unwrap();
    create_router(Arc::new(state))
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, content_type: &str, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` part of the response's Set-Cookie header
fn cookie_pair(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string())
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Run the whole login dance and return the session cookie
async fn login(app: &Router) -> String {
    let begun = send(app, get("/auth/stub", None)).await;
    assert_eq!(begun.status(), StatusCode::SEE_OTHER);
    let pending = cookie_pair(&begun).unwrap();
    let state = location(&begun)
        .split("state=")
        .nth(1)
        .unwrap()
        .to_string();

    let callback = send(
        app,
        get(
            &format!("/auth/stub/callback?code=good-code&state={state}"),
            Some(&pending),
        ),
    )
    .await;
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    cookie_pair(&callback).unwrap()
}

#[tokio::test]
async fn anonymous_index_shows_login_link_and_no_tasks() {
    let app = app(Outcome::Succeed).await;
    let response = send(&app, get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"href="/login""#));
    assert!(!html.contains("Logged in as"));
    assert!(!html.contains("Shruti"));
}

#[tokio::test]
async fn successful_login_shows_user_and_tasks() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;
    assert!(cookie.starts_with("__session="));

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Logged in as: Ada Lovelace"));
    assert!(html.contains("Shruti"));
    assert!(html.contains("alex-anderson"));
}

#[tokio::test]
async fn login_returns_to_requested_page() {
    let app = app(Outcome::Succeed).await;

    let denied = send(&app, get("/tasks/1", None)).await;
    assert_eq!(denied.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&denied), "/login?return_to=%2Ftasks%2F1");

    let page = body_text(send(&app, get("/login?return_to=%2Ftasks%2F1", None)).await).await;
    assert!(page.contains(r#"href="/auth/stub?return_to=%2Ftasks%2F1""#));
    assert!(page.contains("Login with Stub"));

    let begun = send(&app, get("/auth/stub?return_to=%2Ftasks%2F1", None)).await;
    let pending = cookie_pair(&begun).unwrap();
    let state = location(&begun).split("state=").nth(1).unwrap().to_string();
    let callback = send(
        &app,
        get(
            &format!("/auth/stub/callback?code=good-code&state={state}"),
            Some(&pending),
        ),
    )
    .await;
    assert_eq!(location(&callback), "/tasks/1");
}

#[tokio::test]
async fn anonymous_form_post_returns_home_after_login() {
    let app = app(Outcome::Succeed).await;
    let form = "application/x-www-form-urlencoded";

    let denied = send(&app, post("/tasks/1/destroy", None, form, "")).await;
    assert_eq!(denied.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&denied), "/login?return_to=%2F");

    let denied = send(&app, post("/tasks/1/edit", None, form, "name=x")).await;
    assert_eq!(location(&denied), "/login?return_to=%2F");
}

#[tokio::test]
async fn starting_login_while_signed_in_keeps_session() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;

    let again = send(&app, get("/auth/stub?return_to=%2Ftasks%2F1", Some(&cookie))).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&again), "/tasks/1");
    assert!(again.headers().get(header::SET_COOKIE).is_none());

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Logged in as: Ada Lovelace"));
}

#[tokio::test]
async fn failed_exchange_redirects_to_login_without_cookie() {
    let app = app(Outcome::Fail).await;
    let begun = send(&app, get("/auth/stub", None)).await;
    let pending = cookie_pair(&begun).unwrap();
    let state = location(&begun).split("state=").nth(1).unwrap().to_string();

    let callback = send(
        &app,
        get(
            &format!("/auth/stub/callback?code=good-code&state={state}"),
            Some(&pending),
        ),
    )
    .await;

    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/login");
    assert!(callback.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn forged_callback_is_denied() {
    let app = app(Outcome::Succeed).await;
    let callback = send(
        &app,
        get("/auth/stub/callback?code=good-code&state=guess", None),
    )
    .await;
    assert_eq!(location(&callback), "/login");
    assert!(callback.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let app = app(Outcome::Succeed).await;
    let response = send(&app, get("/auth/github", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tampered_cookie_is_anonymous() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;

    let mut bytes = cookie.into_bytes();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let html = body_text(send(&app, get("/", Some(&tampered))).await).await;
    assert!(!html.contains("Logged in as"));
    assert_eq!(
        send(&app, get("/api/tasks", Some(&tampered))).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;

    let first = send(&app, post("/logout", Some(&cookie), "text/plain", "")).await;
    let second = send(&app, post("/logout", None, "text/plain", "")).await;

    for response in [&first, &second] {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response), "/");
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
    }
    assert_eq!(
        first.headers()[header::SET_COOKIE],
        second.headers()[header::SET_COOKIE]
    );

    let cleared = cookie_pair(&first).unwrap();
    let html = body_text(send(&app, get("/", Some(&cleared))).await).await;
    assert!(!html.contains("Logged in as"));
}

#[tokio::test]
async fn create_edit_toggle_and_destroy_task() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;
    let form = "application/x-www-form-urlencoded";

    let created = send(&app, post("/", Some(&cookie), form, "")).await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let edit_path = location(&created);
    assert!(edit_path.ends_with("/edit"));
    let task_path = edit_path.trim_end_matches("/edit").to_string();

    let page = body_text(send(&app, get(&task_path, Some(&cookie))).await).await;
    assert!(page.contains("No Name"));

    let saved = send(
        &app,
        post(&edit_path, Some(&cookie), form, "name=Buy+milk&notes=two+litres"),
    )
    .await;
    assert_eq!(location(&saved), task_path);

    let toggled = send(&app, post(&task_path, Some(&cookie), form, "done=true")).await;
    assert_eq!(toggled.status(), StatusCode::SEE_OTHER);

    let page = body_text(send(&app, get(&task_path, Some(&cookie))).await).await;
    assert!(page.contains("Buy milk"));
    assert!(page.contains("two litres"));
    assert!(page.contains(r#"name="done" value="false""#));

    let destroyed = send(
        &app,
        post(&format!("{task_path}/destroy"), Some(&cookie), form, ""),
    )
    .await;
    assert_eq!(location(&destroyed), "/");
    assert_eq!(
        send(&app, get(&task_path, Some(&cookie))).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn search_filters_sidebar() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;

    let html = body_text(send(&app, get("/?q=alex", Some(&cookie))).await).await;
    assert!(html.contains("alex-anderson"));
    assert!(!html.contains("Shruti"));
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;
    let response = send(&app, get("/tasks/does-not-exist", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_requires_login() {
    let app = app(Outcome::Succeed).await;
    let response = send(&app, get("/api/tasks", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "AUTH_001");
}

#[tokio::test]
async fn api_crud() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;
    let json = "application/json";

    let list: serde_json::Value =
        serde_json::from_str(&body_text(send(&app, get("/api/tasks", Some(&cookie))).await).await)
            .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);

    let created = send(&app, post("/api/tasks", Some(&cookie), json, "")).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let task: serde_json::Value = serde_json::from_str(&body_text(created).await).unwrap();
    let id = task["id"].as_str().unwrap().to_string();
    assert!(task["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(task["done"], false);
    assert!(task.get("name").is_none());

    let fetched: serde_json::Value = serde_json::from_str(
        &body_text(send(&app, get(&format!("/api/tasks/{id}"), Some(&cookie))).await).await,
    )
    .unwrap();
    assert_eq!(fetched, task);

    let patch = Request::builder()
        .method("PATCH")
        .uri(format!("/api/tasks/{id}"))
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, json)
        .body(Body::from(r#"{"name":"Call Ada"}"#))
        .unwrap();
    let patched: serde_json::Value =
        serde_json::from_str(&body_text(send(&app, patch).await).await).unwrap();
    assert_eq!(patched["name"], "Call Ada");
    assert_eq!(patched["createdAt"], task["createdAt"]);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/tasks/{id}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, delete).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        send(&app, get(&format!("/api/tasks/{id}"), Some(&cookie)))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn api_rejects_invalid_body() {
    let app = app(Outcome::Succeed).await;
    let cookie = login(&app).await;
    let response = send(
        &app,
        post("/api/tasks", Some(&cookie), "application/json", "{oops"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
