//! Shared test utilities: an in-process fake DRS server and key fixtures
#![allow(dead_code, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use common::crypto::KeyPair;

pub const DUMMY_ID: &str = "dummy_id";

/// Service-info without the Crypt4gh extension
pub fn service_info_plain() -> Value {
    json!({
        "contactUrl": "contact/abc",
        "createdAt": "2020-01-01",
        "description": "Description of service.",
        "documentationUrl": "docs/abc",
        "environment": "ENV",
        "id": "TEMPID1",
        "name": "TEMP_STUB",
        "organization": {"name": "Parent organization", "url": "parent/abc"},
        "type": {"artifact": "TEMP_ARTIFACT", "group": "TEMP_GROUP", "version": "v1"},
        "updatedAt": "2020-01-01",
        "version": "0.0.0"
    })
}

/// Service-info advertising `server` as the Crypt4gh recipient
pub fn service_info_crypt4gh(server: &KeyPair) -> Value {
    let mut info = service_info_plain();
    info["crypt4gh"] = json!({ "pubkey": server.public.to_base64() });
    info
}

#[derive(Clone)]
struct FakeState {
    service_info: Value,
    objects: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
}

/// A DRS server bound to an ephemeral local port
pub struct FakeDrs {
    pub url: Url,
    objects: Arc<Mutex<Vec<Value>>>,
}

impl FakeDrs {
    pub async fn start(service_info: Value) -> Self {
        Self::start_with_status(service_info, StatusCode::OK).await
    }

    /// Every object registration answers with `status`
    pub async fn start_with_status(service_info: Value, status: StatusCode) -> Self {
        let objects = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            service_info,
            objects: objects.clone(),
            status,
        };

        let app = Router::new()
            .route("/ga4gh/drs/v1/service-info", get(service_info_handler))
            .route("/ga4gh/drs/v1/objects", post(objects_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{}", addr)).unwrap(),
            objects,
        }
    }

    /// Bodies of every object registration received so far
    pub fn registered(&self) -> Vec<Value> {
        self.objects.lock().unwrap().clone()
    }
}

async fn service_info_handler(State(state): State<FakeState>) -> Json<Value> {
    Json(state.service_info)
}

async fn objects_handler(
    State(state): State<FakeState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if state.status != StatusCode::OK {
        return (state.status, Json(json!({"msg": "rejected"})));
    }
    state.objects.lock().unwrap().push(body);
    (StatusCode::OK, Json(json!(DUMMY_ID)))
}

/// Write a file under `dir` and return its path
pub fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Write `pair` as `<name>.sec` / `<name>.pub` under `dir`, returning both paths
pub fn write_key_pair(dir: &Path, name: &str, pair: &KeyPair) -> (PathBuf, PathBuf) {
    let sk = write(dir, &format!("{name}.sec"), pair.secret.to_key_file().as_bytes());
    let pk = write(dir, &format!("{name}.pub"), pair.public.to_key_file().as_bytes());
    (sk, pk)
}
