//! JSON HTTP API.
//!
//! All routes live under `/api`. Successful calls return the affected record;
//! failures return `{"error": <kind>, "message": <text>}` with a status picked
//! by [`status_for`].

use crate::clients::OrderClient;
use crate::config::ApiConfig;
use crate::error::OrderError;
use crate::model::{
    Menu, MenuId, MenuItemId, MenuSnapshot, NewMenu, Order, OrderId, OrderItem, OrderItemId,
    OrderItemUpdate, OrderPatch, OrderSnapshot, OrderState, PaidToggle, User, UserId,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub client: OrderClient,
}

/// Builds the `/api` router around `client`.
pub fn router(client: OrderClient) -> Router {
    let api = Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/orders/{id}/items", get(list_order_items).post(add_item))
        .route("/orders/{id}/transition", post(transition_order))
        .route("/orders/{id}/sugar-person", post(set_sugar_person))
        .route("/orders/{id}/toggle-paid", post(toggle_paid))
        .route("/items/{id}", get(get_item).put(update_item).delete(remove_item))
        .route("/menus", get(list_menus).post(create_menu))
        .route("/menus/{key}", get(get_menu).put(update_menu).delete(delete_menu))
        .route("/users", post(register_user));

    Router::new()
        .nest("/api", api)
        .with_state(AppState { client })
}

/// Serves the API on `config.bind_address()` until `shutdown` is cancelled.
pub async fn serve(
    config: &ApiConfig,
    client: OrderClient,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!(%bind_address, "REST API listening");

    axum::serve(listener, router(client))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("REST API stopped");
    Ok(())
}

// =============================================================================
// ERRORS
// =============================================================================

/// An [`OrderError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        ApiError(e)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

pub fn status_for(e: &OrderError) -> StatusCode {
    match e {
        OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::InvalidTransition { .. }
        | OrderError::FieldNotSettable { .. }
        | OrderError::ImmutableFieldChanged(_)
        | OrderError::InvalidMenu(_) => StatusCode::BAD_REQUEST,
        OrderError::PermissionDenied(_)
        | OrderError::PaidChangeForbidden
        | OrderError::SugarPersonImmutable
        | OrderError::SugarPersonNotSet
        | OrderError::OrderDelivered => StatusCode::FORBIDDEN,
        OrderError::ActiveOrderAlreadyExists(_)
        | OrderError::OrderNotOpenForItems(_)
        | OrderError::NoItemsForUser(_)
        | OrderError::Conflict
        | OrderError::UserAlreadyRegistered(_)
        | OrderError::MenuAlreadyExists(_)
        | OrderError::MenuInUse(_)
        | OrderError::DuplicateCorrelation(_) => StatusCode::CONFLICT,
        OrderError::CallerTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        OrderError::Persistence { .. } | OrderError::CoordinatorUnavailable(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, %status, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;
type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub initiator: UserId,
    pub menu_id: MenuId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub user: UserId,
    pub menu_item_id: MenuItemId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub caller: UserId,
    pub target: OrderState,
    #[serde(default)]
    pub patch: OrderPatch,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallerRequest {
    pub caller: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TogglePaidRequest {
    pub caller: UserId,
    pub user: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub caller: UserId,
    #[serde(flatten)]
    pub update: OrderItemUpdate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<Order>> {
    Ok(Json(state.client.orders().await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> ApiResult<OrderSnapshot> {
    Ok(Json(state.client.order_snapshot(id).await?))
}

async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Created<Order> {
    let order = state.client.create_order(body.initiator, body.menu_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn delete_order(State(state): State<AppState>, Path(id): Path<OrderId>) -> ApiResult<Order> {
    Ok(Json(state.client.delete_order(id).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<AddItemRequest>,
) -> Created<OrderItem> {
    let item = state
        .client
        .add_order_item(id, body.user, body.menu_item_id)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn transition_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<TransitionRequest>,
) -> ApiResult<Order> {
    let order = state
        .client
        .transition_order(body.caller, id, body.target, body.patch)
        .await?;
    Ok(Json(order))
}

async fn set_sugar_person(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<CallerRequest>,
) -> ApiResult<Order> {
    Ok(Json(state.client.set_sugar_person(body.caller, id).await?))
}

async fn toggle_paid(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<TogglePaidRequest>,
) -> ApiResult<PaidToggle> {
    let toggle = state
        .client
        .toggle_paid_for_user(body.caller, id, body.user)
        .await?;
    Ok(Json(toggle))
}

async fn list_order_items(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> ApiResult<Vec<OrderItem>> {
    Ok(Json(state.client.items_for_order(id).await?))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<OrderItemId>) -> ApiResult<OrderItem> {
    Ok(Json(state.client.order_item(id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<OrderItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> ApiResult<OrderItem> {
    let item = state
        .client
        .update_order_item(body.caller, id, body.update)
        .await?;
    Ok(Json(item))
}

async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<OrderItemId>,
    Query(query): Query<CallerRequest>,
) -> ApiResult<OrderItem> {
    Ok(Json(state.client.remove_order_item(query.caller, id).await?))
}

async fn create_menu(State(state): State<AppState>, Json(menu): Json<NewMenu>) -> Created<MenuSnapshot> {
    let snapshot = state.client.create_menu(menu).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn list_menus(State(state): State<AppState>) -> ApiResult<Vec<Menu>> {
    Ok(Json(state.client.menus().await?))
}

/// `key` is a menu id or, failing that, a menu name.
async fn get_menu(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<MenuSnapshot> {
    let snapshot = match key.parse::<MenuId>() {
        Ok(id) => state.client.menu(id).await?,
        Err(_) => state.client.menu_by_name(&key).await?,
    };
    Ok(Json(snapshot))
}

async fn update_menu(
    State(state): State<AppState>,
    Path(id): Path<MenuId>,
    Json(menu): Json<NewMenu>,
) -> ApiResult<MenuSnapshot> {
    Ok(Json(state.client.update_menu(id, menu).await?))
}

async fn delete_menu(State(state): State<AppState>, Path(id): Path<MenuId>) -> ApiResult<MenuSnapshot> {
    Ok(Json(state.client.delete_menu(id).await?))
}

async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Created<User> {
    let user = state.client.register_user(&body.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::lifecycle::OrderSystem;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn setup() -> (OrderSystem, Router, Value, Value) {
        let system = OrderSystem::in_memory(&CoordinatorConfig::default()).unwrap();
        let app = router(system.order_client.clone());

        let (status, alice) = call(&app, "POST", "/api/users", Some(json!({ "name": "alice" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let menu = json!({
            "name": "pizza",
            "items": [
                { "short_name": "marg", "name": "Margherita", "price": 850 },
                { "short_name": "fun", "name": "Funghi", "price": 950 }
            ]
        });
        let (status, menu) = call(&app, "POST", "/api/menus", Some(menu)).await;
        assert_eq!(status, StatusCode::CREATED);
        (system, app, alice, menu)
    }

    #[tokio::test]
    async fn order_flow_over_http() {
        let (system, app, alice, menu) = setup().await;

        let (status, order) = call(
            &app,
            "POST",
            "/api/orders",
            Some(json!({ "initiator": alice["id"], "menu_id": menu["menu"]["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["state"], "open");
        let order_uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

        let (status, item) = call(
            &app,
            "POST",
            &format!("{order_uri}/items"),
            Some(json!({ "user": alice["id"], "menu_item_id": menu["items"][0]["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["price"], 850);

        let (status, finalized) = call(
            &app,
            "POST",
            &format!("{order_uri}/transition"),
            Some(json!({ "caller": alice["id"], "target": "finalized" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finalized["state"], "finalized");

        let (status, body) = call(
            &app,
            "POST",
            &format!("{order_uri}/items"),
            Some(json!({ "user": alice["id"], "menu_item_id": menu["items"][1]["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "order_not_open_for_items");

        let (status, snapshot) = call(&app, "GET", &order_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["items"].as_array().unwrap().len(), 1);

        let (status, orders) = call(&app, "GET", "/api/orders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders.as_array().unwrap().len(), 1);

        system.shutdown().await;
    }

    #[tokio::test]
    async fn skipping_a_state_is_a_bad_request() {
        let (system, app, alice, menu) = setup().await;
        let (_, order) = call(
            &app,
            "POST",
            "/api/orders",
            Some(json!({ "initiator": alice["id"], "menu_id": menu["menu"]["id"] })),
        )
        .await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/orders/{}/transition", order["id"].as_str().unwrap()),
            Some(json!({ "caller": alice["id"], "target": "ordered" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_transition");
        assert_eq!(body["message"], "Cannot move an order from open to ordered");

        system.shutdown().await;
    }

    #[tokio::test]
    async fn toggle_paid_requires_a_sugar_person() {
        let (system, app, alice, menu) = setup().await;
        let (_, order) = call(
            &app,
            "POST",
            "/api/orders",
            Some(json!({ "initiator": alice["id"], "menu_id": menu["menu"]["id"] })),
        )
        .await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/orders/{}/toggle-paid", order["id"].as_str().unwrap()),
            Some(json!({ "caller": alice["id"], "user": alice["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "sugar_person_not_set");

        system.shutdown().await;
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (system, app, _, _) = setup().await;

        let (status, body) = call(&app, "GET", &format!("/api/orders/{}", OrderId::new()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = call(&app, "GET", "/api/menus/sushi", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, "POST", "/api/users", Some(json!({ "name": "alice" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "user_already_registered");

        system.shutdown().await;
    }

    #[tokio::test]
    async fn menus_can_be_listed_updated_and_deleted() {
        let (system, app, alice, menu) = setup().await;
        let menu_uri = format!("/api/menus/{}", menu["menu"]["id"].as_str().unwrap());

        let (status, menus) = call(&app, "GET", "/api/menus", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(menus.as_array().unwrap().len(), 1);
        assert_eq!(menus[0]["name"], "pizza");

        let replacement = json!({
            "name": "pizzeria",
            "items": [
                { "short_name": "marg", "name": "Margherita", "price": 900 },
                { "short_name": "diav", "name": "Diavola", "price": 1050 }
            ]
        });
        let (status, updated) = call(&app, "PUT", &menu_uri, Some(replacement.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["menu"]["name"], "pizzeria");
        assert_eq!(updated["items"].as_array().unwrap().len(), 2);

        let (status, by_id) = call(&app, "GET", &menu_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_id["menu"]["name"], "pizzeria");

        let (_, order) = call(
            &app,
            "POST",
            "/api/orders",
            Some(json!({ "initiator": alice["id"], "menu_id": menu["menu"]["id"] })),
        )
        .await;

        let (status, body) = call(&app, "DELETE", &menu_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "menu_in_use");
        let (status, body) = call(&app, "PUT", &menu_uri, Some(replacement)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "menu_in_use");

        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/orders/{}", order["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, deleted) = call(&app, "DELETE", &menu_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["menu"]["name"], "pizzeria");
        let (status, _) = call(&app, "GET", &menu_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, menus) = call(&app, "GET", "/api/menus", None).await;
        assert!(menus.as_array().unwrap().is_empty());

        system.shutdown().await;
    }

    #[tokio::test]
    async fn order_items_are_readable_by_order_and_by_id() {
        let (system, app, alice, menu) = setup().await;
        let (_, order) = call(
            &app,
            "POST",
            "/api/orders",
            Some(json!({ "initiator": alice["id"], "menu_id": menu["menu"]["id"] })),
        )
        .await;
        let items_uri = format!("/api/orders/{}/items", order["id"].as_str().unwrap());

        for dish in [0, 1] {
            let (status, _) = call(
                &app,
                "POST",
                &items_uri,
                Some(json!({ "user": alice["id"], "menu_item_id": menu["items"][dish]["id"] })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, items) = call(&app, "GET", &items_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let items = items.as_array().unwrap().clone();
        assert_eq!(items.len(), 2);

        let (status, item) = call(
            &app,
            "GET",
            &format!("/api/items/{}", items[0]["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item, items[0]);

        let (status, _) = call(&app, "GET", &format!("/api/items/{}", OrderItemId::new()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "GET", &format!("/api/orders/{}/items", OrderId::new()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        system.shutdown().await;
    }

    #[test]
    fn plumbing_failures_map_to_server_statuses() {
        assert_eq!(
            status_for(&OrderError::CallerTimeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&OrderError::CoordinatorUnavailable("closed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(&OrderError::Conflict), StatusCode::CONFLICT);
    }
}
