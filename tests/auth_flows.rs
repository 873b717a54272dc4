use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use authgate::auth::{
    hash_password, AuthEvent, AuthEventSink, AuthService, Token, TokenStore, User, UserStore,
};
use authgate::configuration::JwtSettings;
use authgate::error::StorageError;
use authgate::startup::run;

struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.id == id).cloned())
    }
}

struct MemoryTokenStore {
    tokens: Mutex<HashMap<Uuid, Token>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, token: &Token) -> Result<(), StorageError> {
        self.tokens.lock().unwrap().insert(token.id, token.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Token>, StorageError> {
        Ok(self.tokens.lock().unwrap().get(&id).cloned())
    }

    async fn delete_if_present(&self, id: Uuid) -> Result<bool, StorageError> {
        Ok(self.tokens.lock().unwrap().remove(&id).is_some())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<(), StorageError> {
        self.tokens
            .lock()
            .unwrap()
            .retain(|_, token| token.user_id != user_id);
        Ok(())
    }
}

struct RecordingEventSink {
    events: Mutex<Vec<AuthEvent>>,
}

impl AuthEventSink for RecordingEventSink {
    fn publish(&self, event: AuthEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestApp {
    pub address: String,
    pub alice_id: Uuid,
    events: Arc<RecordingEventSink>,
}

impl TestApp {
    fn recorded_events(&self) -> Vec<AuthEvent> {
        self.events.events.lock().unwrap().clone()
    }
}

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-at-least-32-chars".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "authgate-test".to_string(),
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let alice = User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        password_hash: hash_password("SecurePass123").expect("Failed to hash password"),
        is_active: true,
    };
    let alice_id = alice.id;

    let users = Arc::new(MemoryUserStore {
        users: Mutex::new(vec![alice]),
    });
    let tokens = Arc::new(MemoryTokenStore {
        tokens: Mutex::new(HashMap::new()),
    });
    let events = Arc::new(RecordingEventSink {
        events: Mutex::new(Vec::new()),
    });

    let jwt_config = jwt_settings();
    let service = AuthService::new(users, tokens, events.clone(), jwt_config.clone());

    let server = run(listener, service, jwt_config).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        alice_id,
        events,
    }
}

async fn login_alice(app: &TestApp, client: &reqwest::Client) -> Value {
    let body = json!({
        "username": "alice",
        "password": "SecurePass123"
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

// --- Health Check ---

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_tokens_and_sets_refresh_cookie() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = json!({
        "username": "alice",
        "password": "SecurePass123"
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("No Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("HttpOnly"));

    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert!(response_body.get("access_token").is_some());
    assert!(response_body.get("refresh_token").is_some());
    assert_eq!(response_body["token_type"], "Bearer");

    assert_eq!(
        app.recorded_events(),
        vec![AuthEvent::LoggedIn {
            user_id: app.alice_id
        }]
    );
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let attempts = vec![
        json!({"username": "mallory", "password": "SecurePass123"}),
        json!({"username": "alice", "password": "WrongPass123"}),
    ];

    let mut outcomes = Vec::new();
    for body in attempts {
        let response = client
            .post(&format!("{}/auth/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16());

        let response_body: Value = response.json().await.expect("Failed to parse response");
        outcomes.push((
            response_body["code"].clone(),
            response_body["message"].clone(),
        ));
    }

    // Unknown user and wrong password produce the exact same outward error.
    assert_eq!(outcomes[0], outcomes[1]);
    assert!(app.recorded_events().is_empty());
}

// --- Token Refresh Tests ---

#[tokio::test]
async fn refresh_rotates_the_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_data = login_alice(&app, &client).await;
    let old_refresh_token = login_data["refresh_token"]
        .as_str()
        .expect("No refresh token in response");

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": old_refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let response_body: Value = response.json().await.expect("Failed to parse response");
    let new_refresh_token = response_body["refresh_token"]
        .as_str()
        .expect("No new refresh token");

    assert_ne!(old_refresh_token, new_refresh_token,
        "Refresh token should be rotated on each refresh");
}

#[tokio::test]
async fn refresh_accepts_the_cookie_carrier() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_data = login_alice(&app, &client).await;
    let refresh_token = login_data["refresh_token"].as_str().unwrap();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header("Cookie", format!("refresh_token={}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_token_is_rejected_on_second_use() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_data = login_alice(&app, &client).await;
    let refresh_token = login_data["refresh_token"].as_str().unwrap();

    let first = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, first.status().as_u16());

    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());
}

#[tokio::test]
async fn refresh_without_a_token_is_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_with_a_garbage_token_is_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": "definitely.not.valid" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn anonymous_logout_succeeds_and_clears_the_cookie() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(204, response.status().as_u16());

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("No Set-Cookie header")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("Max-Age=0"));

    // No identity was resolvable, so nothing is audited.
    assert!(app.recorded_events().is_empty());
}

#[tokio::test]
async fn logout_revokes_the_refresh_token_and_audits_once() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_data = login_alice(&app, &client).await;
    let access_token = login_data["access_token"].as_str().unwrap();
    let refresh_token = login_data["refresh_token"].as_str().unwrap();

    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .header("Cookie", format!("refresh_token={}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(204, response.status().as_u16());

    // The revoked token no longer refreshes.
    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());

    let logged_out: Vec<_> = app
        .recorded_events()
        .into_iter()
        .filter(|event| matches!(event, AuthEvent::LoggedOut { .. }))
        .collect();
    assert_eq!(
        logged_out,
        vec![AuthEvent::LoggedOut {
            user_id: app.alice_id
        }]
    );
}

// --- Full Lifecycle ---

#[tokio::test]
async fn full_token_lifecycle_scenario() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Login -> (A1, R1)
    let first = login_alice(&app, &client).await;
    let r1 = first["refresh_token"].as_str().unwrap();

    // Refresh(R1) -> (A2, R2)
    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": r1 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let second: Value = response.json().await.expect("Failed to parse response");
    let a2 = second["access_token"].as_str().unwrap();
    let r2 = second["refresh_token"].as_str().unwrap();

    // Refresh(R1) again -> unauthorized
    let replay = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": r1 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, replay.status().as_u16());

    // Logout while holding R2's identity -> success
    let logout = client
        .post(&format!("{}/auth/logout", &app.address))
        .header("Authorization", format!("Bearer {}", a2))
        .header("Cookie", format!("refresh_token={}", r2))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, logout.status().as_u16());

    // Refresh(R2) -> unauthorized
    let after_logout = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": r2 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, after_logout.status().as_u16());
}
