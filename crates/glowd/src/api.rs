//! HTTP presentation layer.
//!
//! A thin axum surface over the store: handlers read immutable snapshots,
//! map user actions onto store mutations, and never hold state of their
//! own, so the whole layer is swappable.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::export;
use crate::predict::RuleSource;
use crate::settings::Settings;
use crate::settings::SettingsStore;
use crate::store::AuthOutcome;
use crate::store::BoundDevice;
use crate::store::EnergyStats;
use crate::store::LightDevice;
use crate::store::LinkType;
use crate::store::RuleAction;
use crate::store::RuleRecord;
use crate::store::SensorSamples;
use crate::store::Store;
use crate::store::StoreError;
use crate::store::lights;

/// Shared application state
pub struct AppState {
    pub store: Arc<Store>,
    pub settings_store: Arc<SettingsStore>,
    pub rules: Arc<dyn RuleSource>,
    pub version: &'static str,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(StoreError::UnknownLight(_) | StoreError::UnknownDevice(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(StoreError::DeviceLimit) => StatusCode::CONFLICT,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// Light-panel view: devices plus the derived status line.
#[derive(Serialize)]
struct LightsResponse {
    lights: Vec<LightDevice>,
    total_power: f64,
    power_save: bool,

    /// True when any device holds brightness while switched off.
    fault: bool,
}

#[derive(Serialize)]
struct AuthResponse {
    granted: bool,
    remaining: Option<u32>,
    locked: bool,
}

/// Everything behind the gate.
#[derive(Serialize)]
struct HistoryResponse {
    rules: Vec<RuleRecord>,
    sensors: SensorSamples,
    energy: EnergyStats,
    model_rule: Option<String>,
}

#[derive(Deserialize)]
struct BrightnessBody {
    value: u8,
}

#[derive(Deserialize)]
struct PowerSaveBody {
    enabled: bool,
}

#[derive(Deserialize)]
struct AuthBody {
    password: String,
}

#[derive(Deserialize)]
struct PairBody {
    link: LinkType,
}

#[derive(Deserialize)]
struct ConfirmRuleBody {
    accept: bool,
}

#[derive(Serialize)]
struct ConfirmRuleResponse {
    applied: bool,
}

#[derive(Serialize)]
struct DevicesResponse {
    devices: Vec<BoundDevice>,
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

fn lights_response(store: &Store) -> Json<LightsResponse> {
    let snapshot = store.snapshot();
    Json(LightsResponse {
        fault: lights::has_fault(&snapshot.lights),
        lights: snapshot.lights.clone(),
        total_power: snapshot.total_power,
        power_save: snapshot.power_save,
    })
}

#[tracing::instrument(skip(state))]
async fn lights_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    lights_response(&state.store)
}

#[tracing::instrument(skip(state))]
async fn toggle_light(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<LightsResponse>, ApiError> {
    let is_on = state.store.toggle_light(id)?;
    tracing::info!(id, is_on, "light toggled");
    Ok(lights_response(&state.store))
}

#[tracing::instrument(skip(state, body))]
async fn set_brightness(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(body): Json<BrightnessBody>,
) -> Result<Json<LightsResponse>, ApiError> {
    state.store.set_brightness(id, body.value)?;
    Ok(lights_response(&state.store))
}

#[tracing::instrument(skip(state))]
async fn lights_on(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.all_lights_on();
    lights_response(&state.store)
}

#[tracing::instrument(skip(state))]
async fn lights_off(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.all_lights_off();
    lights_response(&state.store)
}

#[tracing::instrument(skip(state, body))]
async fn power_save(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PowerSaveBody>,
) -> impl IntoResponse {
    if state.store.set_power_save(body.enabled) {
        tracing::info!(enabled = body.enabled, "power-save mode changed");
    }
    lights_response(&state.store)
}

/// Handler for POST /v1/auth
///
/// Runs the gate; the first grant kicks off the prediction fetch.
#[tracing::instrument(skip(state, body))]
async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthBody>,
) -> impl IntoResponse {
    let attempt = state.store.attempt_auth(&body.password);

    if attempt.newly_granted {
        spawn_prediction_fetch(&state);
    }

    let (status, response) = match attempt.outcome {
        AuthOutcome::Granted => (
            StatusCode::OK,
            AuthResponse {
                granted: true,
                remaining: None,
                locked: false,
            },
        ),
        AuthOutcome::Denied { remaining } => (
            StatusCode::UNAUTHORIZED,
            AuthResponse {
                granted: false,
                remaining: Some(remaining),
                locked: false,
            },
        ),
        AuthOutcome::Locked => (
            StatusCode::LOCKED,
            AuthResponse {
                granted: false,
                remaining: Some(0),
                locked: true,
            },
        ),
    };
    (status, Json(response))
}

/// Fetch the predicted rule in the background. Exactly one fetch per
/// successful authentication; a stale completion cannot overwrite a
/// newer one.
fn spawn_prediction_fetch(state: &Arc<AppState>) {
    let store = state.store.clone();
    let rules = state.rules.clone();
    let generation = store.begin_prediction();
    let sample = store.prediction_sample();

    tokio::spawn(async move {
        let rule = rules.fetch_rule(&sample).await;
        store.complete_prediction(generation, rule);
    });
}

fn require_auth(store: &Store) -> Result<(), ApiError> {
    if store.snapshot().auth.is_authenticated {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[tracing::instrument(skip(state))]
async fn history(State(state): State<Arc<AppState>>) -> Result<Json<HistoryResponse>, ApiError> {
    require_auth(&state.store)?;

    let snapshot = state.store.snapshot();
    Ok(Json(HistoryResponse {
        rules: snapshot.rules.clone(),
        sensors: snapshot.sensors.clone(),
        energy: snapshot.energy.clone(),
        model_rule: snapshot.model_rule.clone(),
    }))
}

fn attachment(content_type: &'static str, filename: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    require_auth(&state.store)?;
    let snapshot = state.store.snapshot();
    Ok(attachment(
        "text/csv",
        "lighting_data.csv",
        export::rules_to_csv(&snapshot.rules),
    ))
}

#[tracing::instrument(skip(state))]
async fn export_pdf(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    require_auth(&state.store)?;
    let snapshot = state.store.snapshot();
    Ok(attachment(
        "application/pdf",
        "lighting_data.pdf",
        export::rules_to_report(&snapshot.rules),
    ))
}

#[tracing::instrument(skip(state))]
async fn devices_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    Json(DevicesResponse {
        devices: snapshot.devices.clone(),
    })
}

#[tracing::instrument(skip(state, body))]
async fn pair_device(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PairBody>,
) -> Result<impl IntoResponse, ApiError> {
    let device = state.store.pair_device(body.link)?;
    tracing::info!(id = device.id, "device paired");
    Ok((StatusCode::CREATED, Json(device)))
}

#[tracing::instrument(skip(state))]
async fn remove_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.remove_device(id)?;
    tracing::info!(id, "device removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /v1/rules/confirm
///
/// Accepting a proposed rule renewal appends a history record; declining
/// changes nothing.
#[tracing::instrument(skip(state, body))]
async fn confirm_rule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmRuleBody>,
) -> impl IntoResponse {
    if body.accept {
        state.store.record_rule(
            RuleAction::Update,
            "Intelligent adjustment based on ambient light and habits".to_string(),
        );
    }
    Json(ConfirmRuleResponse {
        applied: body.accept,
    })
}

#[tracing::instrument(skip(state))]
async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot().settings.clone())
}

#[tracing::instrument(skip(state, body))]
async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Settings>,
) -> impl IntoResponse {
    state.settings_store.save(&body);
    state.store.set_settings(body);
    Json(state.store.snapshot().settings.clone())
}

#[tracing::instrument(skip(state))]
async fn reset_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.settings_store.reset();
    state.store.set_settings(Settings::default());
    Json(state.store.snapshot().settings.clone())
}

/// Create the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/lights", get(lights_view))
        .route("/v1/lights/on", post(lights_on))
        .route("/v1/lights/off", post(lights_off))
        .route("/v1/lights/:id/toggle", post(toggle_light))
        .route("/v1/lights/:id/brightness", put(set_brightness))
        .route("/v1/power-save", put(power_save))
        .route("/v1/auth", post(authenticate))
        .route("/v1/history", get(history))
        .route("/v1/history/export/csv", get(export_csv))
        .route("/v1/history/export/pdf", get(export_pdf))
        .route("/v1/devices", get(devices_list).post(pair_device))
        .route("/v1/devices/:id", delete(remove_device))
        .route("/v1/rules/confirm", post(confirm_rule))
        .route("/v1/settings", get(get_settings).put(put_settings))
        .route("/v1/settings/reset", post(reset_settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// Binds to the configured address and serves until the provided shutdown
/// signal is triggered.
pub async fn serve(
    listen: String,
    port: u16,
    state: Arc<AppState>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::StaticRuleSource;
    use crate::store::State as StoreState;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(rule: &str) -> (tempfile::TempDir, Arc<AppState>, Router) {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            store: Arc::new(Store::new(StoreState::default(), "123456".to_string())),
            settings_store: Arc::new(SettingsStore::new(dir.path().join("settings.json"))),
            rules: Arc::new(StaticRuleSource(rule.to_string())),
            version: "test",
        });
        let router = create_router(state.clone());
        (dir, state, router)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_history_is_gated() {
        let (_dir, _state, app) = test_app("unused");

        let response = app.clone().oneshot(get_request("/v1/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get_request("/v1/history/export/csv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_flow_and_model_rule() {
        let (_dir, _state, app) = test_app("Dim hallway after midnight");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth",
                serde_json::json!({"password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["granted"], false);
        assert_eq!(body["remaining"], 4);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth",
                serde_json::json!({"password": "123456"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["granted"], true);

        // The prediction fetch runs in the background; give it a beat.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let response = app.clone().oneshot(get_request("/v1/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["model_rule"], "Dim hallway after midnight");
        assert_eq!(body["rules"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gate_locks_after_budget_spent() {
        let (_dir, _state, app) = test_app("unused");

        for _ in 0..4 {
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/v1/auth",
                    serde_json::json!({"password": "wrong"}),
                ))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth",
                serde_json::json!({"password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::LOCKED);

        // The correct secret no longer helps.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth",
                serde_json::json!({"password": "123456"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::LOCKED);
        let body = body_json(response).await;
        assert_eq!(body["locked"], true);
    }

    #[tokio::test]
    async fn test_toggle_and_brightness() {
        let (_dir, _state, app) = test_app("unused");

        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/lights/2/toggle", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["lights"][1]["is_on"], true);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/v1/lights/2/brightness",
                serde_json::json!({"value": 0}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["lights"][1]["is_on"], false);
        assert_eq!(body["lights"][1]["brightness"], 0);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/lights/99/toggle", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pair_rejected_at_capacity() {
        let (_dir, _state, app) = test_app("unused");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/devices",
                serde_json::json!({"link": "qr"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Unbind one, and pairing works.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/devices/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/devices",
                serde_json::json!({"link": "manual-code"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["link"], "manual-code");
    }

    #[tokio::test]
    async fn test_csv_export_headers() {
        let (_dir, _state, app) = test_app("unused");

        app.clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth",
                serde_json::json!({"password": "123456"}),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(get_request("/v1/history/export/csv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"lighting_data.csv\""
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Date,Action,Description,Status\n"));
    }

    #[tokio::test]
    async fn test_settings_round_trip_clears_password() {
        let (_dir, state, app) = test_app("unused");

        let mut settings = Settings::default();
        settings.username = "casey".to_string();
        settings.password = "hunter2".to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/v1/settings",
                serde_json::to_value(&settings).unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["username"], "casey");
        assert_eq!(body["password"], "");

        // The durable record keeps the password; memory does not.
        assert_eq!(state.settings_store.load().password, "hunter2");
        assert!(state.store.snapshot().settings.password.is_empty());

        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/settings/reset", serde_json::json!({})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["username"], "User");
        assert_eq!(state.settings_store.load(), Settings::default());
    }

    #[tokio::test]
    async fn test_confirm_rule_appends_history() {
        let (_dir, state, app) = test_app("unused");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/rules/confirm",
                serde_json::json!({"accept": false}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["applied"], false);
        assert_eq!(state.store.snapshot().rules.len(), 3);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/rules/confirm",
                serde_json::json!({"accept": true}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["applied"], true);

        let snapshot = state.store.snapshot();
        assert_eq!(snapshot.rules.len(), 4);
        assert_eq!(snapshot.rules[0].action, RuleAction::Update);
    }
}
