use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use uuid::Uuid;

use schoolhub::auth::{TokenGenerator, issue_token};
use schoolhub::billing::{Billing, PaymentProvider, ProviderOrder};
use schoolhub::config::LifecycleConfig;
use schoolhub::error::Result as StoreResult;
use schoolhub::lifecycle::Lifecycle;
use schoolhub::server::{AppState, create_router};
use schoolhub::store::{SqliteStore, Store, TenantStore};
use schoolhub::types::{User, UserRole};

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const HOST_SUFFIX: &str = "schoolhub.test";

/// Hands out sequential order ids instead of calling Razorpay.
#[derive(Default)]
pub struct FakeProvider {
    next: AtomicU32,
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> StoreResult<ProviderOrder> {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProviderOrder {
            id: format!("order_test_{n}"),
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
        })
    }
}

/// A school admin session created through signup.
pub struct Session {
    pub token: String,
    pub school_id: String,
    pub subdomain: String,
}

/// Router and lifecycle worker running in-process on an ephemeral port.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    pub store: Arc<dyn Store>,
    pub client: Client,
    server: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(LifecycleConfig::immediate()).await
    }

    pub async fn start_with(lifecycle_config: LifecycleConfig) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("schoolhub.db")).expect("open store");
        store.initialize().expect("initialize store");
        let store: Arc<dyn Store> = Arc::new(store);

        let admin_token = create_platform_admin(store.as_ref());

        let lifecycle = Lifecycle::new(store.clone(), lifecycle_config, HOST_SUFFIX.to_string());
        let worker = tokio::spawn(lifecycle.worker().run());

        let billing = Billing::new(
            Arc::new(FakeProvider::default()),
            KEY_ID.to_string(),
            KEY_SECRET.to_string(),
            Some(WEBHOOK_SECRET.to_string()),
        );
        let state = Arc::new(AppState {
            store: store.clone(),
            data_dir: temp_dir.path().to_path_buf(),
            public_host_suffix: HOST_SUFFIX.to_string(),
            billing: Some(billing),
            lifecycle,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let app = create_router(state);
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url,
            admin_token,
            store,
            client: Client::new(),
            server,
            worker,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Sends a JSON request and returns the status and parsed body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("send request");
        let status = response.status();
        let text = response.text().await.expect("read body");
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, body)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, path, Some(token), None).await
    }

    /// Signs up a fresh school and returns its admin session.
    pub async fn signup(&self, subdomain: &str) -> Session {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "school_name": format!("{subdomain} school"),
                    "subdomain": subdomain,
                    "name": "Head Teacher",
                    "email": format!("head@{subdomain}.edu"),
                    "password": "correct horse",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        Session {
            token: body["data"]["token"].as_str().expect("token").to_string(),
            school_id: body["data"]["school"]["id"]
                .as_str()
                .expect("school id")
                .to_string(),
            subdomain: subdomain.to_string(),
        }
    }

    /// Moves a school to `plan` through the platform admin API.
    pub async fn set_plan(&self, school_id: &str, plan: &str) {
        let (status, body) = self
            .put(
                &format!("/admin/schools/{school_id}"),
                &self.admin_token,
                json!({ "plan": plan }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "set plan failed: {body}");
    }

    /// Polls `path` until `field` of the returned record equals `expected`.
    pub async fn wait_for(&self, path: &str, token: &str, field: &str, expected: &str) -> Value {
        let mut last = Value::Null;
        for _ in 0..300 {
            let (status, body) = self.get(path, token).await;
            assert_eq!(status, StatusCode::OK, "poll failed: {body}");
            if body["data"][field] == expected {
                return body["data"].clone();
            }
            last = body;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("{path} never reached {field}={expected}; last response: {last}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        self.worker.abort();
    }
}

fn create_platform_admin(store: &dyn Store) -> String {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: "admin@schoolhub.test".to_string(),
        password_hash: TokenGenerator::new()
            .hash("platform admin password")
            .expect("hash password"),
        name: "Platform Admin".to_string(),
        role: UserRole::SuperAdmin,
        school_id: None,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user).expect("create admin");
    issue_token(store, &user.id, None).expect("issue token").0
}
