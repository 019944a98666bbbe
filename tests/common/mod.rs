use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use tradebase::config::Config;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Sign up a user, return the response body + status.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/signup"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("signup request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Sign in and return the response body + status.
    pub async fn signin(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("signin request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Sign up a user and return their session token.
    pub async fn signup_token(&self, email: &str, password: &str, name: &str) -> String {
        let (body, status) = self.signup(email, password, name).await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create an organization, return the organization JSON.
    pub async fn create_organization(&self, token: &str, name: &str, slug: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/v1/organizations"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "slug": slug }))
            .send()
            .await
            .expect("create organization failed");
        assert_eq!(resp.status(), StatusCode::OK, "create organization non-200");
        resp.json().await.unwrap()
    }

    /// Point the caller's session at an organization.
    pub async fn set_active_organization(&self, token: &str, org_id: &str) -> (Value, StatusCode) {
        self.put_auth(
            "/api/v1/session/active-organization",
            token,
            &json!({ "organization_id": org_id }),
        )
        .await
    }

    /// Invite an email to an organization and accept as the invitee.
    /// Returns the membership JSON.
    pub async fn invite_and_accept(
        &self,
        inviter_token: &str,
        org_id: &str,
        inviter_role: &str,
        invitee_token: &str,
        email: &str,
        role: &str,
    ) -> Value {
        let (invitation, status) = self
            .post_auth(
                &format!("/api/v1/organizations/{org_id}/{inviter_role}/invitations"),
                inviter_token,
                &json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite failed: {invitation}");

        let invitation_id = invitation["id"].as_str().unwrap();
        let (membership, status) = self
            .post_auth(
                &format!("/api/v1/invitations/{invitation_id}/accept"),
                invitee_token,
                &json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "accept failed: {membership}");
        membership
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_with(false).await
}

/// Spawn a test app that refuses sign-in until the email is verified.
#[allow(dead_code)]
pub async fn spawn_app_requiring_verification() -> TestApp {
    spawn_with(true).await
}

async fn spawn_with(require_email_verification: bool) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("tradebase_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        session_ttl_hours: 168,
        invitation_ttl_hours: 48,
        require_email_verification,
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        cors_origin: None,
        log_level: "warn".to_string(),
        smtp: None,
        image_cdn: None,
    };

    let app = tradebase::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
