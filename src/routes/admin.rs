use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'admin' role.
/// These endpoints provide moderation, curation, oversight, and statistical access.
///
/// Access Control:
/// This entire router is nested behind the authentication layer, and every handler
/// additionally performs the explicit `role == "admin"` check before touching the
/// repository. The check is duplicated deliberately: the routing layer guarantees a
/// valid session, the handler guarantees the role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Retrieves core dashboard metrics (Total Users, Lessons, Likes, Pending Reviews,
        // Open Reports, Premium Users). Essential for oversight.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/lessons
        // Lists ALL lessons in the system regardless of visibility or review status,
        // pending reviews first. Used for the moderation queue.
        .route("/lessons", get(handlers::get_admin_lessons))
        // PUT /admin/lessons/{id}/review
        // Records the moderation verdict ('approved' or 'rejected') for a lesson.
        .route("/lessons/{id}/review", put(handlers::review_lesson))
        // PUT /admin/lessons/{id}/feature
        // Features or unfeatures a lesson on the landing page.
        .route("/lessons/{id}/feature", put(handlers::feature_lesson))
        // DELETE /admin/lessons/{id}
        // Force-deletes any lesson, bypassing the ownership check.
        .route("/lessons/{id}", delete(handlers::delete_lesson_admin))
        // GET /admin/reports
        // The open moderation report queue, enriched with lesson titles and reporter emails.
        .route("/reports", get(handlers::get_reports))
        // PUT /admin/reports/{id}/ignore
        // Dismisses a report without touching the reported lesson.
        .route("/reports/{id}/ignore", put(handlers::ignore_report))
        // GET /admin/users?page=...&limit=...&search=...&sort_by=...&sort_order=...
        // Paginated, searchable, sortable user listing.
        .route("/users", get(handlers::list_users))
        // PUT /admin/users/{id}/role
        // Promotes or demotes a user ('user' / 'admin'). Self-demotion is blocked.
        .route("/users/{id}/role", put(handlers::update_user_role))
        // DELETE /admin/users/{id}
        // Removes a user account; their content cascades. Self-deletion is blocked.
        .route("/users/{id}", delete(handlers::delete_user))
}
