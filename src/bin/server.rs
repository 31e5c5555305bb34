use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bomber_rust_server::constants::{ACTION_TICK_MS, BOMB_TICK_MS, FLAME_TICK_MS};
use bomber_rust_server::engine::GameState;
use bomber_rust_server::server_protocol::{
    parse_admin_command, parse_client_message, parse_player_update, ParsedClientMessage,
    PlayerUpdate,
};
use bomber_rust_server::server_utils::{make_admin_uid, make_uid, sanitize_name};
use bomber_rust_server::types::PlayerId;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::ServeDir;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
    uid: Option<String>,
}

struct ServerState {
    game: GameState,
    uids: HashMap<String, PlayerId>,
    clients: HashMap<u64, ClientContext>,
    next_client_id: u64,
    admin_uid: String,
}

impl ServerState {
    fn new(game: GameState) -> Self {
        Self {
            game,
            uids: HashMap::new(),
            clients: HashMap::new(),
            next_client_id: 1,
            admin_uid: make_admin_uid(),
        }
    }
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let game = match std::env::var("ARENA_FILE") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .unwrap_or_else(|error| panic!("failed to read arena file {path}: {error}"));
            GameState::from_text(&text, rand::random())
        }
        Err(_) => GameState::new(rand::random()),
    };

    let state = Arc::new(Mutex::new(ServerState::new(game)));
    {
        let guard = state.lock().await;
        println!("[server] admin uid: {}", guard.admin_uid);
    }
    start_tick_loops(state.clone());

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/game", get(game_handler))
        .route("/player", post(create_player_handler))
        .route(
            "/player/{uid}",
            get(player_status_handler)
                .put(player_update_handler)
                .delete(player_delete_handler),
        )
        .route("/admin", get(admin_hint_handler))
        .route("/admin/{uid}", get(admin_status_handler).put(admin_update_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(ServeDir::new(static_dir))
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    let raw = std::env::var("STATIC_DIR").ok()?;
    let path = PathBuf::from(raw);
    path.is_dir().then_some(path)
}

/// Three independent cadences: fire burns out every second, queued actions
/// resolve four times a second, fuses tick once a second. Each loop takes
/// the lock for one phase only, so the phases interleave but never overlap.
fn start_tick_loops(state: SharedState) {
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(FLAME_TICK_MS));
            loop {
                interval.tick().await;
                let mut guard = state.lock().await;
                guard.game.age_flames();
            }
        });
    }
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(ACTION_TICK_MS));
            loop {
                interval.tick().await;
                let mut guard = state.lock().await;
                guard.game.resolve_actions();
                push_status_to_clients(&mut guard);
            }
        });
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(BOMB_TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            guard.game.age_bombs();
        }
    });
}

async fn root_handler() -> impl IntoResponse {
    "This is a bomber server. POST to /player for a uid, GET /game for the arena."
}

async fn game_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    guard.game.snapshot()
}

async fn create_player_handler(State(state): State<SharedState>, body: String) -> Response {
    let update = if body.trim().is_empty() {
        PlayerUpdate::default()
    } else {
        match parse_player_update(&body) {
            Some(update) => update,
            None => return bad_request("body must be a JSON object"),
        }
    };

    let name = sanitize_name(update.name.as_deref().unwrap_or(""));
    let uid = make_uid();

    let mut guard = state.lock().await;
    let id = guard.game.add_player(&name);
    guard.uids.insert(uid.clone(), id);
    println!("[server] player joined: {name} ({uid})");

    let payload = status_payload(&guard, &uid).unwrap_or_else(|| json!({ "uid": uid }));
    (StatusCode::CREATED, Json(payload)).into_response()
}

async fn player_status_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
) -> Response {
    let guard = state.lock().await;
    match status_payload(&guard, &uid) {
        Some(payload) => Json(payload).into_response(),
        None => not_found(),
    }
}

async fn player_update_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
    body: String,
) -> Response {
    let Some(update) = parse_player_update(&body) else {
        return bad_request("expected a JSON object with optional action and name");
    };

    let mut guard = state.lock().await;
    let Some(id) = guard.uids.get(&uid).copied() else {
        return not_found();
    };
    if let Some(name) = update.name {
        guard.game.set_player_name(id, &sanitize_name(&name));
    }
    if let Some(action) = update.action {
        guard.game.enqueue_action(id, action);
    }

    let payload = status_payload(&guard, &uid).unwrap_or_else(|| json!({ "uid": uid }));
    Json(payload).into_response()
}

async fn player_delete_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
) -> Response {
    let mut guard = state.lock().await;
    let Some(id) = guard.uids.remove(&uid) else {
        return not_found();
    };
    guard.game.remove_player(id);
    println!("[server] player left: {uid}");
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_hint_handler() -> impl IntoResponse {
    "Supply the admin uid printed at server startup: /admin/{uid}"
}

async fn admin_status_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
) -> Response {
    let guard = state.lock().await;
    if uid != guard.admin_uid {
        return forbidden();
    }
    Json(admin_payload(&guard)).into_response()
}

async fn admin_update_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
    body: String,
) -> Response {
    let mut guard = state.lock().await;
    if uid != guard.admin_uid {
        return forbidden();
    }
    let Some(command) = parse_admin_command(&body) else {
        return bad_request("expected a JSON object");
    };
    if command.spawn {
        guard.game.spawn_all();
        println!("[server] admin spawned queued players");
    }
    Json(admin_payload(&guard)).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = {
        let mut guard = state.lock().await;
        let client_id = guard.next_client_id;
        guard.next_client_id += 1;
        client_id
    };
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id, ClientContext { tx, uid: None });
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };
        match message {
            Message::Text(raw) => {
                handle_client_message(&state, client_id, raw.to_string()).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
    }
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: u64, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_to_client(state, client_id, json!({ "error": "invalid message" })).await;
        return;
    };

    match message {
        ParsedClientMessage::Register { uid } => {
            let mut guard = state.lock().await;
            if !guard.uids.contains_key(&uid) {
                let error = json!({ "error": "unknown uid" }).to_string();
                if let Some(client) = guard.clients.get(&client_id) {
                    let _ = client.tx.try_send(error);
                }
                return;
            }
            if let Some(client) = guard.clients.get_mut(&client_id) {
                client.uid = Some(uid.clone());
            }
            if let Some(payload) = status_payload(&guard, &uid) {
                if let Some(client) = guard.clients.get(&client_id) {
                    let _ = client.tx.try_send(payload.to_string());
                }
            }
        }
        ParsedClientMessage::Act { action } => {
            let mut guard = state.lock().await;
            let Some(uid) = guard
                .clients
                .get(&client_id)
                .and_then(|client| client.uid.clone())
            else {
                let error = json!({ "error": "register a uid first" }).to_string();
                if let Some(client) = guard.clients.get(&client_id) {
                    let _ = client.tx.try_send(error);
                }
                return;
            };
            if let Some(id) = guard.uids.get(&uid).copied() {
                guard.game.enqueue_action(id, action);
            }
        }
        ParsedClientMessage::Rename { name } => {
            let mut guard = state.lock().await;
            let Some(uid) = guard
                .clients
                .get(&client_id)
                .and_then(|client| client.uid.clone())
            else {
                return;
            };
            if let Some(id) = guard.uids.get(&uid).copied() {
                guard.game.set_player_name(id, &sanitize_name(&name));
            }
        }
    }
}

async fn send_to_client(state: &SharedState, client_id: u64, message: Value) {
    let guard = state.lock().await;
    if let Some(client) = guard.clients.get(&client_id) {
        let _ = client.tx.try_send(message.to_string());
    }
}

/// Pushed after every action phase. Slow consumers lose frames rather than
/// stalling the game.
fn push_status_to_clients(state: &mut ServerState) {
    let updates: Vec<(u64, String)> = state
        .clients
        .iter()
        .filter_map(|(client_id, client)| {
            let uid = client.uid.as_deref()?;
            let payload = status_payload(state, uid)?;
            Some((*client_id, payload.to_string()))
        })
        .collect();
    for (client_id, payload) in updates {
        if let Some(client) = state.clients.get(&client_id) {
            let _ = client.tx.try_send(payload);
        }
    }
}

fn status_payload(state: &ServerState, uid: &str) -> Option<Value> {
    let id = state.uids.get(uid)?;
    let status = state.game.player_stats(*id)?;
    Some(json!({
        "uid": uid,
        "status": status,
        "game": state.game.snapshot(),
    }))
}

fn admin_payload(state: &ServerState) -> Value {
    let players: Vec<Value> = state
        .uids
        .iter()
        .filter_map(|(uid, id)| {
            let status = state.game.player_stats(*id)?;
            Some(json!({ "uid": uid, "status": status }))
        })
        .collect();
    json!({
        "players": players,
        "game": state.game.snapshot(),
    })
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "no such player" })),
    )
        .into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "admin uid required" })),
    )
        .into_response()
}
