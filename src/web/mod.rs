//! HTTP request surface.
//!
//! | Method | Path               | Effect                                       |
//! |--------|--------------------|----------------------------------------------|
//! | GET    | `/`                | clear the active room, index view            |
//! | POST   | `/login`           | check a tag id (form or reader), index view  |
//! | GET    | `/index`           | index view (rooms, operator, climate)        |
//! | GET    | `/enter/:room_id`  | make the room active, room view              |
//! | POST   | `/update`          | add / remove / set, room view                |
//! | GET    | `/leave/:room_id`  | clear the room if active, index view         |
//! | POST   | `/logout`          | forget the operator, index view              |
//! | GET    | `/sync`            | queue a full snapshot for the remote mirror  |
//!
//! Handlers are thin: every rule lives in
//! [`InventoryService`](crate::app::service::InventoryService).

pub mod error;
pub mod views;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::app::climate::ClimateCell;
use crate::app::commands::UpdateRequest;
use crate::app::ports::{TagError, TagReader};
use crate::app::service::InventoryService;
use crate::app::session::OperatorSession;

use self::error::WebError;
use self::views::{IndexView, RoomPage, RoomView, SyncView};

/// Tag reader shared between login requests.
pub type SharedReader = Arc<Mutex<Box<dyn TagReader>>>;

/// Handler state.  Cheap to clone.
#[derive(Clone)]
pub struct WebState {
    pub service: Arc<InventoryService>,
    pub session: Arc<OperatorSession>,
    pub reader: Option<SharedReader>,
    pub climate: Option<Arc<ClimateCell>>,
}

impl WebState {
    pub fn new(service: Arc<InventoryService>, session: Arc<OperatorSession>) -> Self {
        Self {
            service,
            session,
            reader: None,
            climate: None,
        }
    }

    pub fn with_reader(mut self, reader: impl TagReader + 'static) -> Self {
        self.reader = Some(Arc::new(Mutex::new(Box::new(reader))));
        self
    }

    pub fn with_climate(mut self, cell: Arc<ClimateCell>) -> Self {
        self.climate = Some(cell);
        self
    }

    fn index_view(&self, snapshot: &crate::app::store::Snapshot) -> IndexView {
        IndexView::new(snapshot, self.session.operator())
            .with_climate(self.climate.as_ref().and_then(|c| c.latest()))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub tag_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub room_id: usize,
    pub action: String,
    pub quantity: Option<String>,
}

type WebResult<T> = Result<Json<T>, WebError>;

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/login", post(login))
        .route("/index", get(index))
        .route("/enter/:room_id", get(enter))
        .route("/update", post(update))
        .route("/leave/:room_id", get(leave))
        .route("/logout", post(logout))
        .route("/sync", get(sync))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────

async fn landing(State(state): State<WebState>) -> Json<IndexView> {
    let snapshot = state.service.reset();
    Json(state.index_view(&snapshot))
}

async fn login(
    State(state): State<WebState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> WebResult<IndexView> {
    // No form at all means "scan a tag".
    let posted = form
        .ok()
        .and_then(|Form(f)| f.tag_id)
        .filter(|t| !t.trim().is_empty());

    let tag = match posted {
        Some(tag) => tag,
        None => read_tag(state.reader.clone()).await?,
    };

    state.session.login(&tag)?;
    state.service.note_session(state.session.operator());
    Ok(Json(state.index_view(&state.service.index())))
}

/// Block on the reader off the async workers.
async fn read_tag(reader: Option<SharedReader>) -> Result<String, WebError> {
    let reader = reader.ok_or(TagError::NoReader)?;
    let tag = tokio::task::spawn_blocking(move || {
        let mut reader = reader.lock();
        reader.read_tag()
    })
        .await
        .map_err(|e| WebError::Internal(e.to_string()))??;
    Ok(tag)
}

async fn index(State(state): State<WebState>) -> Json<IndexView> {
    Json(state.index_view(&state.service.index()))
}

async fn enter(State(state): State<WebState>, Path(room_id): Path<usize>) -> WebResult<RoomPage> {
    let room = state.service.enter(room_id)?;
    Ok(Json(RoomPage {
        room: RoomView::new(&room, true),
        max: state.service.store().max_count(),
    }))
}

async fn update(
    State(state): State<WebState>,
    form: Result<Form<UpdateForm>, FormRejection>,
) -> WebResult<RoomPage> {
    let Form(form) = form.map_err(|e| WebError::BadRequest(e.body_text()))?;
    let req = UpdateRequest::from_form(form.room_id, &form.action, form.quantity.as_deref());
    let room = state.service.update(req)?;
    let active = state.service.index().active_room == Some(room.id);
    Ok(Json(RoomPage {
        room: RoomView::new(&room, active),
        max: state.service.store().max_count(),
    }))
}

async fn leave(State(state): State<WebState>, Path(room_id): Path<usize>) -> WebResult<IndexView> {
    let snapshot = state.service.leave(room_id)?;
    Ok(Json(state.index_view(&snapshot)))
}

async fn logout(State(state): State<WebState>) -> Json<IndexView> {
    if state.session.logout().is_some() {
        state.service.note_session(None);
    }
    Json(state.index_view(&state.service.index()))
}

async fn sync(State(state): State<WebState>) -> WebResult<SyncView> {
    let snapshot = state.service.sync().ok_or(WebError::MirrorDisabled)?;
    Ok(Json(SyncView {
        queued: true,
        rooms: IndexView::new(&snapshot, None).rooms,
    }))
}

// ── Server lifecycle ──────────────────────────────────────────

/// Serve `app` until Ctrl-C / SIGTERM, then drain for at most `grace`.
pub async fn serve(listener: tokio::net::TcpListener, app: Router, grace: Duration) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("web: listening on {}", addr);
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result,
        _ = shutdown_signal() => {
            info!("web: shutdown requested");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("web: connections still open after {:?}, closing", grace);
                    Ok(())
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("web: SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}
