//! End-to-end tests for the CSRF-aware client against the real router.
//!
//! The app is served on an ephemeral port with an outer layer recording every
//! request, so tests can assert exactly which calls the client made and in
//! which order.

use anyhow::Result;
use axum::{
    Json, Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::post,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use waypoint::{
    api::{
        self,
        handlers::{
            auth::{AuthConfig, AuthState, derive},
            blueprints::MemoryStore,
        },
    },
    client::{ApiClient, ClientConfig, ClientError},
};

const CSRF_PATH: &str = "/api/v1/auth/csrf-token";
const SITES_PATH: &str = "/api/v1/orgs/org-a/sites";
const FORBIDDEN_PATH: &str = "/api/v1/always-forbidden";

#[derive(Clone, Default)]
struct Hits(Arc<Mutex<Vec<(String, String)>>>);

impl Hits {
    fn record(&self, method: &str, path: &str) {
        if let Ok(mut hits) = self.0.lock() {
            hits.push((method.to_string(), path.to_string()));
        }
    }

    fn all(&self) -> Vec<(String, String)> {
        self.0.lock().map(|hits| hits.clone()).unwrap_or_default()
    }

    fn count(&self, path: &str) -> usize {
        self.all().iter().filter(|(_, hit)| hit == path).count()
    }
}

async fn always_forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "CSRF token missing or invalid" })),
    )
}

async fn spawn_app() -> Result<(ApiClient, Hits)> {
    let state = Arc::new(AuthState::new(AuthConfig::default())?);
    let hits = Hits::default();
    let recorder = hits.clone();

    let app: Router = api::app(state, Arc::new(MemoryStore::new()))?
        .route(FORBIDDEN_PATH, post(always_forbidden))
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                recorder.record(request.method().as_str(), request.uri().path());
                next.run(request).await
            }
        }));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = ApiClient::new(ClientConfig::new(&format!("http://{addr}/api/v1"))?)?;
    Ok((client, hits))
}

#[tokio::test]
async fn first_mutation_fetches_token_once() -> Result<()> {
    let (client, hits) = spawn_app().await?;
    client.set_session("tok1")?;

    let site: Value = client
        .post_json("/orgs/org-a/sites", &json!({ "niceId": "edge" }))
        .await?;
    assert_eq!(site["niceId"], "edge");
    assert_eq!(client.csrf_token().await, Some(derive("tok1")));

    let _: Value = client
        .post_json("/orgs/org-a/sites", &json!({ "niceId": "lab" }))
        .await?;

    assert_eq!(
        hits.all(),
        vec![
            ("GET".to_string(), CSRF_PATH.to_string()),
            ("POST".to_string(), SITES_PATH.to_string()),
            ("POST".to_string(), SITES_PATH.to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn parallel_first_mutations_share_one_fetch() -> Result<()> {
    let (client, hits) = spawn_app().await?;
    client.set_session("tok1")?;

    let tasks: Vec<_> = ["edge", "lab", "core", "dmz"]
        .into_iter()
        .map(|nice_id| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .post_json::<_, Value>("/orgs/org-a/sites", &json!({ "niceId": nice_id }))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await??;
    }

    assert_eq!(hits.count(CSRF_PATH), 1);
    assert_eq!(hits.count(SITES_PATH), 4);
    assert_eq!(client.csrf_token().await, Some(derive("tok1")));
    Ok(())
}

#[tokio::test]
async fn safe_requests_never_fetch_token() -> Result<()> {
    let (client, hits) = spawn_app().await?;
    client.set_session("tok1")?;

    let resources: Value = client.get_json("/orgs/org-a/client-resources").await?;
    assert_eq!(resources, json!([]));
    assert_eq!(hits.count(CSRF_PATH), 0);
    assert_eq!(client.csrf_token().await, None);
    Ok(())
}

#[tokio::test]
async fn session_change_is_recovered_by_one_retry() -> Result<()> {
    let (client, hits) = spawn_app().await?;
    client.set_session("tok1")?;
    let _: Value = client
        .post_json("/orgs/org-a/sites", &json!({ "niceId": "edge" }))
        .await?;

    client.set_session("tok2")?;
    let site: Value = client
        .post_json("/orgs/org-a/sites", &json!({ "niceId": "lab" }))
        .await?;
    assert_eq!(site["niceId"], "lab");
    assert_eq!(client.csrf_token().await, Some(derive("tok2")));

    // One fetch per session, and the stale-token POST is sent twice.
    assert_eq!(hits.count(CSRF_PATH), 2);
    assert_eq!(hits.count(SITES_PATH), 3);
    Ok(())
}

#[tokio::test]
async fn second_forbidden_response_propagates() -> Result<()> {
    let (client, hits) = spawn_app().await?;
    client.set_session("tok1")?;

    let result: Result<Value, ClientError> = client.post_json("/always-forbidden", &json!({})).await;

    assert_eq!(
        result.err(),
        Some(ClientError::Http {
            status: 403,
            message: r#"{"error":"CSRF token missing or invalid"}"#.to_string(),
        })
    );
    // Initial fetch, the refetch after the first 403, and exactly one retry.
    assert_eq!(hits.count(CSRF_PATH), 2);
    assert_eq!(hits.count(FORBIDDEN_PATH), 2);
    Ok(())
}

#[tokio::test]
async fn missing_session_sends_without_token() -> Result<()> {
    let (client, hits) = spawn_app().await?;

    let site: Value = client
        .post_json("/orgs/org-a/sites", &json!({ "niceId": "edge" }))
        .await?;
    assert_eq!(site["niceId"], "edge");
    assert_eq!(client.csrf_token().await, None);
    assert_eq!(hits.count(CSRF_PATH), 1);
    Ok(())
}

#[tokio::test]
async fn forbidden_without_fresh_token_is_not_retried() -> Result<()> {
    let (client, hits) = spawn_app().await?;

    let result: Result<Value, ClientError> = client.post_json("/always-forbidden", &json!({})).await;

    assert_eq!(result.err().and_then(|err| err.status()), Some(403));
    // The token endpoint answers 401 both times, so there is nothing to retry with.
    assert_eq!(hits.count(CSRF_PATH), 2);
    assert_eq!(hits.count(FORBIDDEN_PATH), 1);
    Ok(())
}

#[tokio::test]
async fn http_errors_carry_server_message() -> Result<()> {
    let (client, _hits) = spawn_app().await?;
    client.set_session("tok1")?;

    let result: Result<Value, ClientError> = client
        .put_json("/orgs/org-a/blueprint", &json!({ "client-resources": {} }))
        .await;
    // An empty blueprint is a no-op and succeeds.
    assert_eq!(result?, json!([]));

    let result: Result<Value, ClientError> = client
        .put_json(
            "/orgs/org-a/blueprint",
            &json!({
                "client-resources": {
                    "ssh": { "hostname": "10.0.0.2", "internal-port": 22, "protocol": "tcp" }
                }
            }),
        )
        .await;
    assert_eq!(
        result.err(),
        Some(ClientError::Http {
            status: 400,
            message: r#"{"error":"Target site is required"}"#.to_string(),
        })
    );
    Ok(())
}
