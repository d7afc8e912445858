use axum::Json;

pub async fn index() -> &'static str {
    "Urban Harvest Hub API Running"
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
