use crate::debounce::LastAction;
use crate::server::pages::{CONFIRMATION_PAGE, INDEX_PAGE, REJECTED_BODY};
use crate::trigger::TriggerScheduler;
use crate::{ACTION_ROUTE, INDEX_ROUTE};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use log::{debug, info};
use tower_http::catch_panic::CatchPanicLayer;

/// Per-listener request state.
///
/// `last_action` is shared with the owning `ControlServer`, so the cooldown
/// survives a restart; the script path is fixed for this listener's lifetime.
#[derive(Clone)]
pub(crate) struct RouteState {
    pub(crate) last_action: Arc<LastAction>,
    pub(crate) scheduler: TriggerScheduler,
    pub(crate) script_path: Arc<PathBuf>,
}

pub(crate) fn build_router(state: RouteState) -> Router {
    with_request_isolation(control_routes()).with_state(state)
}

pub(crate) fn control_routes() -> Router<RouteState> {
    Router::new()
        .route(INDEX_ROUTE, get(handle_index))
        .route(ACTION_ROUTE, get(handle_action))
}

/// Wrap every route added so far so a panicking handler yields a 500 for that
/// request and the listener keeps serving.
pub(crate) fn with_request_isolation<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(CatchPanicLayer::new())
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn handle_action(
    State(state): State<RouteState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    if !state.last_action.try_accept(Instant::now()) {
        debug!("Ignoring trigger from {peer}: inside cooldown");
        return (StatusCode::TOO_MANY_REQUESTS, REJECTED_BODY).into_response();
    }

    info!(
        "Trigger accepted from {peer}, running {} in {:?}",
        state.script_path.display(),
        state.scheduler.delay()
    );

    // Detached: the response goes out now, the script runs after the delay.
    let _scheduled = state.scheduler.schedule(state.script_path.as_ref().clone());

    Html(CONFIRMATION_PAGE).into_response()
}
