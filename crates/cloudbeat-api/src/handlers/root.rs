use axum::Json;
use serde_json::{json, Value};

pub async fn banner() -> Json<Value> {
    Json(json!({ "message": "CloudBeat Backend is running!" }))
}

pub async fn auth_status() -> Json<Value> {
    Json(json!({
        "message": "Auth is handled by Supabase on the frontend. Backend verifies JWT tokens."
    }))
}
