//! Axum JSON API and WebSocket for driving an explorer remotely.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade, Message}},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cubegraph_state::{EdgeKey, GraphData, GraphError, StateId};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::driver::drive;
use crate::events::{EngineEvent, GraphSnapshot};
use crate::explorer::Explorer;
use crate::playback::{PlaybackStatus, Velocity};

/// Shared application state.
pub struct AppState {
    explorer: Arc<RwLock<Explorer>>,
    tick_rate: u32,
}

/// Explorer API server.
pub struct ExplorerServer {
    state: Arc<AppState>,
}

impl ExplorerServer {
    /// Create a server owning `explorer`.
    pub fn new(explorer: Explorer) -> Self {
        let tick_rate = explorer.config().tick_rate;
        Self {
            state: Arc::new(AppState {
                explorer: Arc::new(RwLock::new(explorer)),
                tick_rate,
            }),
        }
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/status", get(status_handler))
            .route("/api/snapshot", get(snapshot_handler))
            .route("/api/playback", get(playback_status_handler))
            .route("/api/rotate", post(rotate_handler))
            .route("/api/velocity", post(velocity_handler))
            .route("/api/clear", post(clear_handler))
            .route("/api/step", post(step_handler))
            .route("/api/select", post(select_handler))
            .route("/api/root", post(root_handler))
            .route("/api/delete", post(delete_handler))
            .route("/api/paths", get(paths_handler))
            .route("/api/save", get(save_handler))
            .route("/api/load", post(load_handler))
            .route("/api/reset", post(reset_handler))
            .route("/api/events", get(events_handler))
            // WebSocket for interactive control
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the given port, ticking the explorer in the background.
    pub async fn serve(self, port: u16) -> Result<(), std::io::Error> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let ticker = tokio::spawn(drive(self.state.explorer.clone(), self.state.tick_rate));
        tracing::info!("Explorer API running on http://localhost:{}", port);
        let served = axum::serve(listener, self.router()).await;
        ticker.abort();
        served
    }
}

/// A rejected request, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(GraphError);

impl From<GraphError> for ApiError {
    fn from(error: GraphError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            GraphError::InvalidMoveToken(_) | GraphError::LoadFormat(_) => StatusCode::BAD_REQUEST,
            GraphError::UnknownState(_) | GraphError::UnknownEdge(_) => StatusCode::NOT_FOUND,
            GraphError::RootDeletionRejected(_)
            | GraphError::ActiveTransitionConflict(_)
            | GraphError::WrongEndpoint { .. } => StatusCode::CONFLICT,
            GraphError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Server status response.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    root: StateId,
    current: StateId,
    state_count: usize,
    edge_count: usize,
    frame: u64,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let explorer = state.explorer.read().await;
    let graph = explorer.graph();
    Json(StatusResponse {
        status: "ok",
        root: graph.root(),
        current: explorer.current(),
        state_count: graph.state_count(),
        edge_count: graph.edge_count(),
        frame: explorer.frame(),
    })
}

async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<GraphSnapshot> {
    Json(state.explorer.read().await.snapshot())
}

async fn playback_status_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    Json(state.explorer.read().await.status())
}

#[derive(Deserialize)]
struct RotateRequest {
    path: String,
}

#[derive(Debug, Serialize)]
struct RotateResponse {
    accepted: usize,
    playback: PlaybackStatus,
}

async fn rotate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RotateRequest>,
) -> ApiResult<RotateResponse> {
    let mut explorer = state.explorer.write().await;
    let accepted = explorer.rotate_path(&req.path)?;
    Ok(Json(RotateResponse {
        accepted,
        playback: explorer.status(),
    }))
}

#[derive(Deserialize)]
struct VelocityRequest {
    velocity: Velocity,
}

async fn velocity_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VelocityRequest>,
) -> Json<PlaybackStatus> {
    let mut explorer = state.explorer.write().await;
    explorer.set_velocity(req.velocity);
    Json(explorer.status())
}

async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let mut explorer = state.explorer.write().await;
    explorer.clear_pending();
    Json(explorer.status())
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Forward,
    Backward,
}

#[derive(Deserialize)]
struct StepRequest {
    edge: EdgeKey,
    direction: Direction,
}

async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StepRequest>,
) -> ApiResult<PlaybackStatus> {
    let mut explorer = state.explorer.write().await;
    match req.direction {
        Direction::Forward => explorer.step_forward(req.edge)?,
        Direction::Backward => explorer.step_backward(req.edge)?,
    }
    Ok(Json(explorer.status()))
}

#[derive(Deserialize)]
struct StateRequest {
    state: StateId,
}

async fn select_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StateRequest>,
) -> ApiResult<GraphSnapshot> {
    let mut explorer = state.explorer.write().await;
    explorer.select(req.state)?;
    Ok(Json(explorer.snapshot()))
}

async fn root_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StateRequest>,
) -> ApiResult<GraphSnapshot> {
    let mut explorer = state.explorer.write().await;
    explorer.set_root(req.state)?;
    Ok(Json(explorer.snapshot()))
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    states: Vec<StateId>,
    edges: Vec<EdgeKey>,
    current: StateId,
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StateRequest>,
) -> ApiResult<DeleteResponse> {
    let mut explorer = state.explorer.write().await;
    let removal = explorer.delete_state(req.state)?;
    Ok(Json(DeleteResponse {
        states: removal.states,
        edges: removal.edges,
        current: explorer.current(),
    }))
}

#[derive(Debug, Serialize)]
struct PathsResponse {
    state: StateId,
    to_root: Vec<String>,
    from_root: Vec<String>,
}

fn paths_of(explorer: &Explorer) -> Result<PathsResponse, GraphError> {
    Ok(PathsResponse {
        state: explorer.current(),
        to_root: explorer.path_to_root()?,
        from_root: explorer.path_from_root()?,
    })
}

async fn paths_handler(State(state): State<Arc<AppState>>) -> ApiResult<PathsResponse> {
    let explorer = state.explorer.read().await;
    Ok(Json(paths_of(&explorer)?))
}

async fn save_handler(State(state): State<Arc<AppState>>) -> Json<GraphData> {
    Json(state.explorer.read().await.save())
}

async fn load_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<GraphData>,
) -> ApiResult<GraphSnapshot> {
    let mut explorer = state.explorer.write().await;
    explorer.load(&data)?;
    Ok(Json(explorer.snapshot()))
}

async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<GraphSnapshot> {
    let mut explorer = state.explorer.write().await;
    explorer.reset();
    Json(explorer.snapshot())
}

async fn events_handler(State(state): State<Arc<AppState>>) -> Json<Vec<EngineEvent>> {
    Json(state.explorer.write().await.drain_events())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    // Send the current graph first
    let snapshot = state.explorer.read().await.snapshot();
    if let Ok(json) = serde_json::to_string(&snapshot) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let response = match serde_json::from_str::<WsCommand>(&text) {
                    Ok(cmd) => handle_ws_command(&state, cmd).await,
                    Err(e) => WsResponse::Error {
                        message: e.to_string(),
                    },
                };
                if let Ok(json) = serde_json::to_string(&response) {
                    let _ = socket.send(Message::Text(json.into())).await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WsCommand {
    #[serde(rename = "get_snapshot")]
    GetSnapshot,
    #[serde(rename = "get_status")]
    GetStatus,
    #[serde(rename = "get_paths")]
    GetPaths,
    #[serde(rename = "get_events")]
    GetEvents,
    #[serde(rename = "rotate")]
    Rotate { path: String },
    #[serde(rename = "velocity")]
    SetVelocity { velocity: Velocity },
    #[serde(rename = "clear")]
    Clear,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum WsResponse {
    #[serde(rename = "snapshot")]
    Snapshot(GraphSnapshot),
    #[serde(rename = "status")]
    Status(PlaybackStatus),
    #[serde(rename = "paths")]
    Paths(PathsResponse),
    #[serde(rename = "events")]
    Events { events: Vec<EngineEvent> },
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<GraphError> for WsResponse {
    fn from(error: GraphError) -> Self {
        WsResponse::Error {
            message: error.to_string(),
        }
    }
}

async fn handle_ws_command(state: &Arc<AppState>, cmd: WsCommand) -> WsResponse {
    match cmd {
        WsCommand::GetSnapshot => WsResponse::Snapshot(state.explorer.read().await.snapshot()),
        WsCommand::GetStatus => WsResponse::Status(state.explorer.read().await.status()),
        WsCommand::GetPaths => {
            let explorer = state.explorer.read().await;
            paths_of(&explorer).map_or_else(WsResponse::from, WsResponse::Paths)
        }
        WsCommand::GetEvents => WsResponse::Events {
            events: state.explorer.write().await.drain_events(),
        },
        WsCommand::Rotate { path } => {
            let mut explorer = state.explorer.write().await;
            match explorer.rotate_path(&path) {
                Ok(_) => WsResponse::Status(explorer.status()),
                Err(e) => e.into(),
            }
        }
        WsCommand::SetVelocity { velocity } => {
            let mut explorer = state.explorer.write().await;
            explorer.set_velocity(velocity);
            WsResponse::Status(explorer.status())
        }
        WsCommand::Clear => {
            let mut explorer = state.explorer.write().await;
            explorer.clear_pending();
            WsResponse::Status(explorer.status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;

    fn app_state(velocity: i64) -> Arc<AppState> {
        let explorer = Explorer::new(ExplorerConfig {
            velocity: Velocity::new(velocity),
            tick_rate: 60,
            max_paths: 64,
        });
        ExplorerServer::new(explorer).state
    }

    #[test]
    fn server_creation() {
        let _server = ExplorerServer::new(Explorer::new(ExplorerConfig::from_env()));
    }

    #[test]
    fn router_builds() {
        let server = ExplorerServer::new(Explorer::new(ExplorerConfig::from_env()));
        let _router = server.router();
    }

    #[tokio::test]
    async fn rotate_then_query() {
        let state = app_state(20);
        let Json(rotated) = rotate_handler(
            State(state.clone()),
            Json(RotateRequest { path: "RU".into() }),
        )
        .await
        .unwrap();
        assert_eq!(rotated.accepted, 2);
        assert_eq!(rotated.playback.pending, 1);

        {
            let mut explorer = state.explorer.write().await;
            explorer.tick();
            explorer.tick();
        }

        let Json(paths) = paths_handler(State(state.clone())).await.unwrap();
        assert_eq!(paths.from_root, vec!["RU"]);
        assert_eq!(paths.to_root, vec!["U'R'"]);

        let Json(status) = status_handler(State(state)).await;
        assert_eq!(status.state_count, 3);
        assert_eq!(status.frame, 2);
    }

    #[tokio::test]
    async fn graph_errors_map_to_status_codes() {
        let state = app_state(20);
        let root = state.explorer.read().await.current();

        let err = rotate_handler(State(state.clone()), Json(RotateRequest { path: "Q".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = delete_handler(State(state.clone()), Json(StateRequest { state: root }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = select_handler(State(state), Json(StateRequest { state: StateId(999) }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let state = app_state(20);
        state.explorer.write().await.rotate_path("F").unwrap();
        state.explorer.write().await.tick();

        let Json(data) = save_handler(State(state.clone())).await;
        let Json(reset) = reset_handler(State(state.clone())).await;
        assert_eq!(reset.state_count, 1);

        let Json(loaded) = load_handler(State(state.clone()), Json(data)).await.unwrap();
        assert_eq!(loaded.state_count, 2);
        assert_eq!(loaded.edge_count, 1);

        let Json(events) = events_handler(State(state)).await;
        assert!(matches!(events.last(), Some(EngineEvent::GraphLoaded { states: 2, .. })));
    }

    #[tokio::test]
    async fn ws_commands() {
        let state = app_state(0);
        let cmd: WsCommand = serde_json::from_str(r#"{"type":"rotate","path":"U2"}"#).unwrap();
        match handle_ws_command(&state, cmd).await {
            WsResponse::Status(status) => assert_eq!(status.pending, 1),
            _ => panic!("expected status"),
        }

        let cmd: WsCommand = serde_json::from_str(r#"{"type":"velocity","velocity":40}"#).unwrap();
        match handle_ws_command(&state, cmd).await {
            WsResponse::Status(status) => assert_eq!(status.velocity, Velocity::INSTANT),
            _ => panic!("expected status"),
        }

        let cmd: WsCommand = serde_json::from_str(r#"{"type":"rotate","path":"Uw'x"}"#).unwrap();
        assert!(matches!(handle_ws_command(&state, cmd).await, WsResponse::Status(_)));

        let cmd: WsCommand = serde_json::from_str(r#"{"type":"rotate","path":"Mw"}"#).unwrap();
        assert!(matches!(handle_ws_command(&state, cmd).await, WsResponse::Error { .. }));
    }
}
