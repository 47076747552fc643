//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves both surfaces: the REST portal API under `/api`
//! and the chat websocket at `/api/ws`. The websocket side is
//! guest-accessible; the portal routes authenticate via session cookie.

pub mod affairs;
pub mod auth;
pub mod friends;
pub mod papers;
pub mod profiles;
pub mod species;
pub mod targets;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use time::Date;
use time::macros::format_description;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Strict `YYYY-MM-DD` check for date fields arriving as strings.
/// Handlers reject malformed dates as 400 before they reach a SQL cast.
pub(crate) fn valid_iso_date(value: &str) -> bool {
    Date::parse(value, format_description!("[year]-[month]-[day]")).is_ok()
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/profiles", get(profiles::list_profiles))
        .route("/api/profiles/{user_id}", get(profiles::get_profile))
        .route("/api/profile", put(profiles::update_profile))
        .route("/api/friends", get(friends::list_friends))
        .route("/api/friends/{user_id}", delete(friends::unfriend))
        .route("/api/friends/requests", post(friends::send_request))
        .route("/api/friends/requests/pending", get(friends::pending_requests))
        .route("/api/friends/requests/sent", get(friends::sent_requests))
        .route("/api/friends/requests/{id}/accept", post(friends::accept_request))
        .route("/api/friends/requests/{id}/reject", post(friends::reject_request))
        .route("/api/friends/requests/{id}", delete(friends::cancel_request))
        .route("/api/current-affairs", get(affairs::list_affairs).post(affairs::create_affair))
        .route(
            "/api/current-affairs/{id}",
            put(affairs::update_affair).delete(affairs::delete_affair),
        )
        .route("/api/species", get(species::list_species).post(species::create_species))
        .route(
            "/api/species/{id}",
            put(species::update_species).delete(species::delete_species),
        )
        .route("/api/species/{id}/bookmark", post(species::toggle_bookmark))
        .route("/api/bookmarks/species", get(species::list_bookmarked_species))
        .route("/api/papers", get(papers::list_papers).post(papers::create_paper))
        .route("/api/papers/{id}", put(papers::update_paper).delete(papers::delete_paper))
        .route("/api/targets", get(targets::list_targets).post(targets::create_target))
        .route(
            "/api/targets/{id}",
            patch(targets::update_target).delete(targets::delete_target),
        )
        .route(
            "/api/study-durations",
            get(targets::list_study_durations).post(targets::add_study_duration),
        )
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
