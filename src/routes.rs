use crate::handlers::{self, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request size limit: 5MB covers a mentor email with a few inline images.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Builds the application router. Rate limiting is layered on in `main`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route("/customers", get(handlers::list_customers))
        .route("/customers/refresh", post(handlers::refresh_customers))
        .route("/customers/:id", get(handlers::get_customer))
        .route("/invoices", get(handlers::list_invoices))
        .route("/teams", get(handlers::list_teams).post(handlers::create_team))
        .route(
            "/teams/:id",
            get(handlers::get_team)
                .put(handlers::update_team)
                .delete(handlers::delete_team),
        )
        .route(
            "/mentors",
            get(handlers::list_mentors).post(handlers::create_mentor),
        )
        .route("/mentors/email", post(handlers::email_mentors))
        .route(
            "/mentors/:id",
            get(handlers::get_mentor)
                .put(handlers::update_mentor)
                .delete(handlers::delete_mentor),
        )
        .route(
            "/students",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route(
            "/students/:id",
            get(handlers::get_student)
                .put(handlers::update_student)
                .delete(handlers::delete_student),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_admin_token,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/health", get(handlers::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
