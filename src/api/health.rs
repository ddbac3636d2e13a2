use axum::response::Json;
use serde_json::{Value, json};

use crate::types::Book;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "books": Book::ALL,
    }))
}
