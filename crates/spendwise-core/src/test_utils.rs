//! Test utilities for spendwise-core
//!
//! - `fixtures`: in-memory transaction builders for engine tests
//! - `MockChatServer`: a local OpenAI-compatible chat-completions server that
//!   can be told to fail its first N requests (for retry/backoff tests)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::sync::oneshot;

/// Transaction builders that don't touch the database
pub mod fixtures {
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::{NaiveDate, Utc};

    use crate::models::{CategoryKind, CategoryRef, Transaction, TransactionType};

    static NEXT_ID: AtomicI64 = AtomicI64::new(1);

    /// Category names/kinds used by the fixtures, by id
    pub fn category(id: i64) -> CategoryRef {
        let (name, kind) = match id {
            1 => ("Food", CategoryKind::Food),
            2 => ("Transport", CategoryKind::Transport),
            3 => ("Housing", CategoryKind::Housing),
            4 => ("Utilities", CategoryKind::Utilities),
            5 => ("Health", CategoryKind::Health),
            6 => ("Education", CategoryKind::Education),
            7 => ("Shopping", CategoryKind::Shopping),
            8 => ("Entertainment", CategoryKind::Entertainment),
            9 => ("Salary", CategoryKind::Salary),
            _ => ("Misc", CategoryKind::Other),
        };
        let name = if kind == CategoryKind::Other {
            format!("{} {}", name, id)
        } else {
            name.to_string()
        };
        CategoryRef {
            id,
            name,
            kind,
            icon: String::new(),
            color: String::new(),
        }
    }

    pub fn transaction(
        category_id: i64,
        amount: f64,
        transaction_type: TransactionType,
        date: &str,
    ) -> Transaction {
        Transaction {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            user_id: "test-user".to_string(),
            category_id,
            amount,
            transaction_type,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("fixture date"),
            description: None,
            category: Some(category(category_id)),
            created_at: Utc::now(),
        }
    }

    pub fn expense(category_id: i64, amount: f64, date: &str) -> Transaction {
        transaction(category_id, amount, TransactionType::Expense, date)
    }

    pub fn income(category_id: i64, amount: f64, date: &str) -> Transaction {
        transaction(category_id, amount, TransactionType::Income, date)
    }
}

/// Mock chat-completions server for testing the OpenAI-compatible backend
pub struct MockChatServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<AtomicUsize>,
    fail_first: usize,
    fail_status: StatusCode,
    reply: String,
}

impl MockChatServer {
    /// Start a server that always answers with `reply`
    pub async fn start(reply: &str) -> Self {
        Self::start_failing(reply, 0, StatusCode::TOO_MANY_REQUESTS).await
    }

    /// Start a server whose first `fail_first` completions fail with `status`
    pub async fn start_failing(reply: &str, fail_first: usize, status: StatusCode) -> Self {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            requests: requests.clone(),
            fail_first,
            fail_status: status,
            reply: reply.to_string(),
        };

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_completion))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far (including failed ones)
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "object": "list",
        "data": [{ "id": "mock-model", "object": "model" }]
    }))
}

#[derive(Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<serde_json::Value>,
}

async fn handle_completion(
    State(state): State<MockState>,
    Json(request): Json<CompletionRequest>,
) -> Response {
    let seen = state.requests.fetch_add(1, Ordering::SeqCst);
    if seen < state.fail_first {
        return (
            state.fail_status,
            Json(serde_json::json!({ "error": { "message": "mock failure" } })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "id": format!("mock-{}", seen),
        "model": request.model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": state.reply },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": request.messages.len(), "completion_tokens": 1 }
    }))
    .into_response()
}
