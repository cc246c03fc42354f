use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub done: bool,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub done: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListFilter {
    pub name: Option<String>,
    pub done: Option<bool>,
}

/// Failure body in the `{"message", "code", "params"}` convention.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl ApiError {
    fn validation(field: &str, message: &str) -> Self {
        let mut params = Map::new();
        params.insert("field".to_string(), Value::from(field));
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.to_string(),
            code: "VALIDATION".to_string(),
            params: Some(params),
        }
    }

    fn not_found(id: Uuid) -> Self {
        let mut params = Map::new();
        params.insert("id".to_string(), Value::from(id.to_string()));
        Self {
            status: StatusCode::NOT_FOUND,
            message: "item not found".to_string(),
            code: "NOT_FOUND".to_string(),
            params: Some(params),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/headers", get(echo_headers))
        .route("/unclassified", get(unclassified_error))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_items(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Vec<Item>> {
    let items = db.read().await;
    let mut matching: Vec<Item> = items
        .values()
        .filter(|item| filter.name.as_ref().is_none_or(|name| &item.name == name))
        .filter(|item| filter.done.is_none_or(|done| item.done == done))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    Json(matching)
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let name = input
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::validation("name", "name is required"))?;
    let item = Item {
        id: Uuid::new_v4(),
        name,
        done: input.done,
    };
    tracing::debug!(id = %item.id, "created item");
    db.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Item>, ApiError> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or_else(|| ApiError::not_found(id))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, ApiError> {
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or_else(|| ApiError::not_found(id))?;
    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name", "name must not be empty"));
        }
        item.name = name;
    }
    if let Some(done) = input.done {
        item.done = done;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let mut items = db.write().await;
    items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found(id))
}

/// Reflect request headers back as a JSON object, for header tests.
async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let mut out = Map::new();
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            out.insert(name.as_str().to_string(), Value::from(value));
        }
    }
    Json(Value::Object(out))
}

/// A failure without a JSON error body.
async fn unclassified_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_serializes_to_json() {
        let item = Item {
            id: Uuid::nil(),
            name: "Test".to_string(),
            done: false,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Test");
        assert_eq!(json["done"], false);
    }

    #[test]
    fn validation_error_body_carries_field() {
        let body = serde_json::to_value(ApiError::validation("name", "name is required")).unwrap();
        assert_eq!(
            body,
            json!({"message": "name is required", "code": "VALIDATION", "params": {"field": "name"}})
        );
    }

    #[test]
    fn not_found_error_body_carries_id() {
        let body = serde_json::to_value(ApiError::not_found(Uuid::nil())).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["params"]["id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn create_item_defaults_done_to_false() {
        let input: CreateItem = serde_json::from_str(r#"{"name":"No done field"}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("No done field"));
        assert!(!input.done);
    }

    #[test]
    fn update_item_all_fields_optional() {
        let input: UpdateItem = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.done.is_none());
    }
}
