use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the authentication layer.
/// This module implements all core application features for a standard member,
/// including lesson submission, liking, favorites, reporting and the premium upgrade flow.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware being present
/// on the router layer above this module. This guarantees that all handlers receive a
/// validated `AuthUser` struct containing the user's ID, role and premium flag, which is
/// then used for all Owner-Only authorization checks (e.g., in `update_lesson` and
/// `delete_lesson`).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile record.
        .route("/me", get(handlers::get_me))
        // PUT /me/profile
        // Partial update of the caller's display name and avatar URL.
        .route("/me/profile", put(handlers::update_profile))
        // GET /me/lessons
        // Lists all lessons owned by the authenticated user, including private,
        // pending and rejected ones.
        .route("/me/lessons", get(handlers::get_my_lessons))
        // GET /me/favorites
        // Lists the lessons the user saved for later.
        .route("/me/favorites", get(handlers::get_my_favorites))
        // --- Lesson Submission & Reactions ---
        // POST /lessons
        // Submits a new lesson. Enters the moderation queue as 'pending'.
        .route("/lessons", post(handlers::create_lesson))
        // PUT/DELETE /lessons/{id}
        // Allows the user to modify or remove their own lesson.
        // Strict ownership check is enforced within the repository query.
        .route(
            "/lessons/{id}",
            put(handlers::update_lesson).delete(handlers::delete_lesson),
        )
        // PUT /lessons/{id}/visibility
        // Owner toggle between 'public' and 'private'.
        .route(
            "/lessons/{id}/visibility",
            put(handlers::set_lesson_visibility),
        )
        // POST /lessons/{id}/like
        // Registers a 'like' for a specific lesson. The handler implements **idempotency**
        // using the composite primary key on the `lesson_likes` table to prevent double liking.
        .route("/lessons/{id}/like", post(handlers::like_lesson))
        // POST /lessons/{id}/favorite
        // Saves a lesson to the caller's favorites.
        .route("/lessons/{id}/favorite", post(handlers::add_favorite))
        // DELETE /favorites/{id}
        // Removes one of the caller's own favorites. Ownership validation is required.
        .route("/favorites/{id}", delete(handlers::remove_favorite))
        // POST /lessons/{id}/report
        // Files a moderation report against a lesson.
        .route("/lessons/{id}/report", post(handlers::report_lesson))
        // --- Premium Upgrade Flow ---
        // POST /payments/checkout
        // Opens a hosted checkout session at the external payment processor.
        .route("/payments/checkout", post(handlers::create_checkout_session))
        // POST /payments/verify
        // Verifies a completed session server-side and flips the premium flag.
        .route("/payments/verify", post(handlers::verify_payment))
}
