use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in). These routes primarily handle read-only data access
/// that has been explicitly marked as public, and core gateway functions like registration.
///
/// Security Mandate:
/// All data retrieval handlers in this module (i.e., `/lessons/*`) must enforce
/// `visibility='public' AND review_status='approved'` at the Repository level.
/// This prevents anonymous or unauthorized viewing of private lessons or lessons
/// still pending moderation.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Endpoint for new user creation and initial profile setup. The credential itself
        // is created at the external identity provider; we mirror the profile locally.
        .route("/register", post(handlers::register_user))
        // GET /lessons?category=...&search=...
        // Lists all published lessons, supporting category filtering and full-text search.
        // Critical enforcement of the public/approved filter occurs in the Repository query.
        .route("/lessons", get(handlers::get_lessons))
        // GET /lessons/featured
        // Retrieves the admin-curated featured lessons for the landing page.
        .route("/lessons/featured", get(handlers::get_featured_lessons))
        // GET /lessons/{id}
        // Retrieves the detailed view of a single lesson and records the view.
        // Requires a repository-level public/approved check before data release.
        .route("/lessons/{id}", get(handlers::get_lesson_details))
        // GET /contributors/top
        // The landing page's contributor leaderboard, ranked by collected likes.
        .route("/contributors/top", get(handlers::get_top_contributors))
}
