use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::{
    auth, colleges, events, external, generate_caption, health_check, index, list_categories,
    users,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(
        &state.config.frontend_url,
        state.config.cors_allowed_origins.as_deref(),
    );

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/github", get(auth::github_login))
        .route("/auth/callback/google", get(auth::google_callback))
        .route("/auth/callback/github", get(auth::github_callback))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/events/external", get(external::external_events))
        .route("/events/external/seatgeek", get(external::seatgeek_events))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/save", post(events::save_event))
        .route("/events/:id/register", post(events::register_for_event))
        .route(
            "/users/me",
            get(users::current_user).put(users::update_current_user),
        )
        .route("/users/:id/saved-events", get(users::saved_events))
        .route("/colleges", get(colleges::list_colleges))
        .route("/categories", get(list_categories))
        .route("/ai/generate-caption", post(generate_caption));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
