pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::history;
use crate::settings;
use crate::state::AppState;
use crate::tailoring;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tailoring pipeline
        .route("/api/v1/tailor", post(tailoring::handlers::handle_tailor))
        .route(
            "/api/v1/tailor/status",
            get(tailoring::handlers::handle_status),
        )
        // History
        .route("/api/v1/history", get(history::handlers::handle_list))
        .route(
            "/api/v1/history/:id",
            get(history::handlers::handle_get)
                .patch(history::handlers::handle_rename)
                .delete(history::handlers::handle_delete),
        )
        .route(
            "/api/v1/history/:id/pdf",
            post(history::handlers::handle_generate_pdf),
        )
        .route(
            "/api/v1/resume/current",
            get(history::handlers::handle_current_resume),
        )
        // Settings and the base résumé
        .route(
            "/api/v1/settings",
            get(settings::handlers::handle_get_settings)
                .put(settings::handlers::handle_save_settings),
        )
        .route(
            "/api/v1/base-resume",
            get(settings::handlers::handle_get_base_resume)
                .put(settings::handlers::handle_save_base_resume),
        )
        .route(
            "/api/v1/base-resume/upload",
            post(settings::handlers::handle_upload_base_resume),
        )
        .with_state(state)
}
