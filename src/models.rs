use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents the user's canonical identity record stored in the `public.users` table.
/// The credential itself lives with the external identity provider; this row mirrors
/// the profile data the application needs (role, premium flag, display identity).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, also the Foreign Key to the identity provider's user record.
    pub id: Uuid,
    pub name: String,
    // The user's primary identifier.
    pub email: String,
    // The RBAC field: 'user' or 'admin'.
    pub role: String,
    // Premium subscription flag, flipped by the payment verification flow.
    pub is_premium: bool,
    // Avatar URL hosted on the external CDN.
    pub photo_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Lesson
///
/// Represents a life lesson record from the `public.lessons` table.
/// This is the primary data structure for the core business logic.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Lesson {
    pub id: Uuid,
    // FK to public.users.id (Creator).
    pub creator_id: Uuid,
    // Denormalized creator display name, captured at creation time.
    pub creator_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    // The lesson's emotional register (e.g. 'hopeful', 'regretful').
    pub emotional_tone: String,
    // CDN URL of the cover image. The upload happens client-side against the CDN;
    // the API only ever stores the resulting URL.
    pub image: Option<String>,

    // Logic Fields
    // 'public' or 'private'. Private lessons are visible to their creator only.
    pub visibility: String,
    // 'free' or 'premium'. Premium lessons may only be created by premium accounts.
    pub access_level: String,
    // Moderation state: 'pending', 'approved' or 'rejected'. Only approved public
    // lessons appear in anonymous listings.
    pub review_status: String,
    // Set by an admin to surface the lesson on the landing page.
    pub is_featured: bool,

    // Counters maintained by the repository layer.
    pub likes_count: i64,
    pub favorites_count: i64,
    pub views_count: i64,

    // Timestamp handling for database integration and JSON serialization.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Like
///
/// Internal structure representing a single like record in the `public.lesson_likes`
/// table. It is only used internally by the repository for insertion and validation checks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Like {
    // Composite PK component 1: The user who liked.
    pub user_id: Uuid,
    // Composite PK component 2: The lesson that was liked.
    pub lesson_id: Uuid,
}

/// Favorite
///
/// A saved lesson in the `public.favorites` table. Unlike likes, favorites have their
/// own ID because the frontend removes them by favorite ID, not by lesson ID.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Report
///
/// A moderation report filed by a member against a lesson (`public.reports`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Report {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    // 'open' or 'ignored'. Reports are cleared implicitly when the lesson is deleted.
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ReportResponse
///
/// The enriched report payload returned to the admin moderation queue, joining the
/// lesson title and the reporter's email onto the raw report row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ReportResponse {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub reporter_email: String,
    pub reason: String,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ContributorSummary
///
/// One row of the landing page's "top contributors" widget: a creator ranked by
/// published lessons and the likes they collected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContributorSummary {
    pub user_id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
    pub lesson_count: i64,
    pub total_likes: i64,
}

/// AdminDashboardStats
///
/// Aggregated counters backing the admin dashboard overview.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_lessons: i64,
    pub total_likes: i64,
    pub pending_reviews: i64,
    pub open_reports: i64,
    pub premium_users: i64,
}

/// UserPage
///
/// One page of the admin user listing, together with the total row count the
/// frontend needs to render pagination controls.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// --- Request Payloads (Input Schemas) ---

/// CreateLessonRequest
///
/// Input payload for submitting a new lesson (POST /lessons). The image URL is
/// provided here after the client completes the direct-to-CDN upload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub emotional_tone: String,
    pub image: Option<String>,
    // 'public' or 'private'.
    pub visibility: String,
    // 'free' or 'premium'. Premium requires the creator to hold a premium account.
    pub access_level: String,
}

/// UpdateLessonRequest
///
/// Partial update payload for a lesson the caller owns. All fields optional;
/// omitted fields are left untouched (COALESCE semantics in the repository).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub emotional_tone: Option<String>,
    pub image: Option<String>,
    pub access_level: Option<String>,
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// Note: The password is only passed through to the external identity provider and
/// never persisted or logged internally by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial profile update for the authenticated user (PUT /me/profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

/// CreateReportRequest
///
/// Input payload when a member reports a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReportRequest {
    pub reason: String,
}

/// ReviewLessonRequest
///
/// Admin moderation verdict for a pending lesson: 'approved' or 'rejected'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReviewLessonRequest {
    pub status: String,
}

/// UpdateRoleRequest
///
/// Admin payload for promoting/demoting a user: 'user' or 'admin'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// CheckoutSessionResponse
///
/// The hosted checkout URL handed back to the client, which redirects the browser
/// to the external payment processor.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// VerifyPaymentRequest
///
/// Sent by the payment success page after the processor redirects back. The actual
/// verification is delegated to the processor; this payload only names the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VerifyPaymentRequest {
    pub session_id: String,
}

/// UserProfile
///
/// The authenticated user's own profile view (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_premium: bool,
    pub photo_url: Option<String>,
}
