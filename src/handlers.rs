use crate::{
    AppState,
    auth::AuthUser,
    models::{
        self, AdminDashboardStats, CheckoutSessionResponse, ContributorSummary, CreateLessonRequest,
        CreateReportRequest, Favorite, Lesson, RegisterUserRequest, ReportResponse,
        ReviewLessonRequest, UpdateLessonRequest, UpdateProfileRequest, UpdateRoleRequest, User,
        UserPage, UserProfile, VerifyPaymentRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// LessonFilter
///
/// Defines the accepted query parameters for the public lesson listing endpoint (GET /lessons).
/// Used by Axum's Query extractor to safely bind HTTP query parameters for filtering and search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LessonFilter {
    /// Optional category filter (exact match).
    pub category: Option<String>,
    /// Optional full-text search string for title/description/creator matching.
    pub search: Option<String>,
}

/// UserListParams
///
/// Query parameters for the admin user listing: pagination, search and sorting.
/// The sort column passes through a whitelist in the repository.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// IdentityProviderResponse
///
/// Minimal struct to deserialize the response from the external identity provider's
/// signup endpoint, specifically capturing the newly created user's UUID.
#[derive(Deserialize)]
struct IdentityProviderResponse {
    id: Uuid,
}

// --- Public Handlers ---

/// get_lessons
///
/// [Public Route] Lists published lessons with category filtering and search.
///
/// *Security*: The repository method applies `visibility='public' AND review_status='approved'`
/// **unconditionally** to prevent data leakage to anonymous users, ensuring Defense-in-Depth.
#[utoipa::path(
    get,
    path = "/lessons",
    params(LessonFilter),
    responses(
        (status = 200, description = "List filtered lessons", body = [Lesson])
    )
)]
pub async fn get_lessons(
    State(state): State<AppState>,
    Query(filter): Query<LessonFilter>,
) -> Json<Vec<models::Lesson>> {
    let lessons = state
        .repo
        .get_public_lessons(filter.category, filter.search)
        .await;
    Json(lessons)
}

/// get_lesson_details
///
/// [Public Route] Retrieves a single published lesson by ID and records the view.
/// Private or unapproved lessons are indistinguishable from missing ones (404).
#[utoipa::path(
    get,
    path = "/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Found", body = Lesson),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_lesson_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Lesson>, StatusCode> {
    match state.repo.get_public_lesson(id).await {
        Some(lesson) => {
            state.repo.record_view(id).await;
            Ok(Json(lesson))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_featured_lessons
///
/// [Public Route] Retrieves the admin-curated lessons for the landing page.
/// The `limit` (6) is hardcoded in the repository call.
#[utoipa::path(
    get,
    path = "/lessons/featured",
    responses((status = 200, description = "Featured lessons", body = [Lesson]))
)]
pub async fn get_featured_lessons(State(state): State<AppState>) -> Json<Vec<models::Lesson>> {
    let featured = state.repo.get_featured_lessons(6).await;
    Json(featured)
}

/// get_top_contributors
///
/// [Public Route] Retrieves the landing page's contributor leaderboard.
#[utoipa::path(
    get,
    path = "/contributors/top",
    responses((status = 200, description = "Top contributors", body = [ContributorSummary]))
)]
pub async fn get_top_contributors(
    State(state): State<AppState>,
) -> Json<Vec<models::ContributorSummary>> {
    let contributors = state.repo.get_top_contributors(5).await;
    Json(contributors)
}

/// register_user
///
/// [Public Route] Handles initial user registration via the external identity provider.
///
/// *Flow*: Calls the provider's signup endpoint, retrieves the canonical user UUID, and then
/// uses that ID to create the corresponding record in the application's local `public.users` table.
/// This ensures primary key synchronization between the external identity system and our local schema.
/// The role is always 'user' here; promotion to admin only happens through the admin API.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected by identity provider"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, StatusCode> {
    // Cheap local duplicate check before burning a round-trip on the provider.
    if state.repo.get_user_by_email(&payload.email).await.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    // Step 1: Call the external identity provider.
    let client = reqwest::Client::new();
    let signup_url = format!("{}/signup", state.config.auth_provider_url);

    let response = client
        .post(signup_url)
        .header("apikey", &state.config.auth_provider_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !response.status().is_success() {
        // The provider rejected the signup (e.g., email already exists, weak password).
        return Err(StatusCode::BAD_REQUEST);
    }

    // Step 2: Extract the canonical user ID from the external response.
    let provider_user = response
        .json::<IdentityProviderResponse>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Step 3: Create the mirrored profile in our local database (`public.users`).
    let new_user = User {
        id: provider_user.id,
        name: payload.name,
        email: payload.email,
        role: "user".to_string(),
        ..Default::default()
    };

    match state.repo.create_user(new_user).await {
        Some(created) => Ok(Json(created)),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile information,
/// straight from the `public.users` row the extractor already verified exists.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        is_premium: user.is_premium,
        photo_url: user.photo_url,
    }))
}

/// update_profile
///
/// [Authenticated Route] Partial update of the caller's own display name and avatar.
#[utoipa::path(
    put,
    path = "/me/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, StatusCode> {
    match state.repo.update_profile(id, payload).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_my_lessons
///
/// [Authenticated Route] Lists all lessons owned by the requesting user.
/// This includes lessons that are currently private, pending or rejected.
///
/// *Note*: The user identity (`id`) is resolved securely via the `AuthUser` extractor.
#[utoipa::path(
    get,
    path = "/me/lessons",
    responses((status = 200, description = "My Lessons", body = [Lesson]))
)]
pub async fn get_my_lessons(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Lesson>> {
    let lessons = state.repo.get_my_lessons(id).await;
    Json(lessons)
}

/// create_lesson
///
/// [Authenticated Route] Handles the submission of a new lesson.
/// The creator identity is taken from the authenticated session, ensuring data integrity.
///
/// *Premium gate*: a lesson may only be marked `access_level='premium'` by a premium
/// account; everyone else gets a 403 before the repository is touched.
#[utoipa::path(
    post,
    path = "/lessons",
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Created", body = Lesson),
        (status = 403, description = "Premium access level requires a premium account"),
        (status = 422, description = "Invalid field value")
    )
)]
pub async fn create_lesson(
    AuthUser { id, is_premium, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<models::Lesson>), StatusCode> {
    if !matches!(payload.visibility.as_str(), "public" | "private") {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    if !matches!(payload.access_level.as_str(), "free" | "premium") {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    if payload.access_level == "premium" && !is_premium {
        return Err(StatusCode::FORBIDDEN);
    }

    let creator = state
        .repo
        .get_user(id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.repo.create_lesson(payload, &creator).await {
        Some(lesson) => Ok((StatusCode::CREATED, Json(lesson))),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// update_lesson
///
/// [Authenticated Route] Allows a user to modify their own lesson.
///
/// *Authorization*: Enforces the **Owner-Only** check in the repository layer.
/// Edits send the lesson back through moderation ('pending').
#[utoipa::path(
    put,
    path = "/lessons/{id}",
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Updated", body = Lesson),
        (status = 404, description = "Not Found / Not Owner")
    )
)]
pub async fn update_lesson(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<Json<models::Lesson>, StatusCode> {
    if let Some(level) = payload.access_level.as_deref() {
        if !matches!(level, "free" | "premium") {
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
    match state.repo.update_lesson(id, user_id, payload).await {
        Some(lesson) => Ok(Json(lesson)),
        // Returns 404 if the lesson is not found OR if the authenticated user is not the owner.
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_lesson
///
/// [Authenticated Route] Allows a user to delete their own lesson.
///
/// *Authorization*: The repository method enforces an **Owner-Only** check against the `user_id`
/// provided by the `AuthUser` extractor. If the user is not the owner, the repository query
/// will affect 0 rows, resulting in a 404.
#[utoipa::path(
    delete,
    path = "/lessons/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found / Not Owner")
    )
)]
pub async fn delete_lesson(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    // If the repository returns false, it means either the lesson didn't exist,
    // or the user wasn't the owner, hence 404 is a safe default response.
    if state.repo.delete_lesson(id, user_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// set_lesson_visibility
///
/// [Authenticated Route] Owner toggle between 'public' and 'private'.
#[utoipa::path(
    put,
    path = "/lessons/{id}/visibility",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = String,
    responses(
        (status = 200, description = "Updated", body = Lesson),
        (status = 404, description = "Not Found / Not Owner"),
        (status = 422, description = "Invalid visibility value")
    )
)]
pub async fn set_lesson_visibility(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(visibility): Json<String>,
) -> Result<Json<models::Lesson>, StatusCode> {
    if !matches!(visibility.as_str(), "public" | "private") {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    match state.repo.set_lesson_visibility(id, user_id, visibility).await {
        Some(lesson) => Ok(Json(lesson)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// like_lesson
///
/// [Authenticated Route] Records a 'like' from the user for a lesson.
///
/// *Idempotency*: The repository method uses the composite primary key on `lesson_likes`
/// to enforce the **one-like-per-user-per-lesson** rule, returning a 409 Conflict if violated.
#[utoipa::path(
    post,
    path = "/lessons/{id}/like",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Liked"),
        (status = 409, description = "Duplicate")
    )
)]
pub async fn like_lesson(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let like = models::Like {
        user_id: id,
        lesson_id,
    };

    match state.repo.like_lesson(like).await {
        true => Ok(StatusCode::OK),
        false => Err(StatusCode::CONFLICT),
    }
}

/// get_my_favorites
///
/// [Authenticated Route] Lists the lessons the user saved for later.
#[utoipa::path(
    get,
    path = "/me/favorites",
    responses((status = 200, description = "Saved lessons", body = [Lesson]))
)]
pub async fn get_my_favorites(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Lesson>> {
    Json(state.repo.get_favorite_lessons(id).await)
}

/// add_favorite
///
/// [Authenticated Route] Saves a lesson to the user's favorites.
#[utoipa::path(
    post,
    path = "/lessons/{id}/favorite",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 201, description = "Saved", body = Favorite),
        (status = 409, description = "Already saved")
    )
)]
pub async fn add_favorite(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
) -> Result<(StatusCode, Json<models::Favorite>), StatusCode> {
    match state.repo.add_favorite(id, lesson_id).await {
        Some(favorite) => Ok((StatusCode::CREATED, Json(favorite))),
        None => Err(StatusCode::CONFLICT),
    }
}

/// remove_favorite
///
/// [Authenticated Route] Removes one of the caller's own favorites by favorite ID.
#[utoipa::path(
    delete,
    path = "/favorites/{id}",
    params(("id" = Uuid, Path, description = "Favorite ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not Found / Not Owner")
    )
)]
pub async fn remove_favorite(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.remove_favorite(id, user_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// report_lesson
///
/// [Authenticated Route] Files a moderation report against a lesson.
#[utoipa::path(
    post,
    path = "/lessons/{id}/report",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Reported"),
        (status = 404, description = "Lesson not found"),
        (status = 422, description = "Empty reason")
    )
)]
pub async fn report_lesson(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<StatusCode, StatusCode> {
    if payload.reason.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    match state.repo.create_report(lesson_id, id, payload.reason).await {
        Some(_) => Ok(StatusCode::CREATED),
        // Insert failures here are almost always the FK: the lesson is gone.
        None => Err(StatusCode::NOT_FOUND),
    }
}

// --- Payment Handlers ---

/// create_checkout_session
///
/// [Authenticated Route] Opens a hosted checkout session for the premium upgrade
/// and hands back the redirect URL.
#[utoipa::path(
    post,
    path = "/payments/checkout",
    responses(
        (status = 200, description = "Session created", body = CheckoutSessionResponse),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn create_checkout_session(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CheckoutSessionResponse>, StatusCode> {
    match state.payments.create_checkout_session(id).await {
        Ok(session) => Ok(Json(session)),
        Err(e) => {
            tracing::error!("checkout session error: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// verify_payment
///
/// [Authenticated Route] Called by the success page after the processor redirects
/// back. The session is verified **server-side** against the processor; only a
/// confirmed payment flips the caller's premium flag.
#[utoipa::path(
    post,
    path = "/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Premium activated", body = User),
        (status = 402, description = "Session not paid"),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn verify_payment(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<User>, StatusCode> {
    let paid = match state.payments.verify_session(&payload.session_id).await {
        Ok(paid) => paid,
        Err(e) => {
            tracing::error!("payment verification error: {}", e);
            return Err(StatusCode::BAD_GATEWAY);
        }
    };

    if !paid {
        return Err(StatusCode::PAYMENT_REQUIRED);
    }

    if !state.repo.set_premium(id).await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    state
        .repo
        .get_user(id)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Retrieves core application statistics for the dashboard.
///
/// *Authorization*: Explicitly checks that the `role` is "admin".
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_lessons
///
/// [Admin Route] Retrieves ALL lessons in the system, regardless of visibility or
/// review status, pending reviews first.
///
/// *Authorization*: Explicitly checks that the `role` resolved by `AuthUser` is "admin".
#[utoipa::path(
    get,
    path = "/admin/lessons",
    responses((status = 200, description = "All lessons", body = [Lesson]))
)]
pub async fn get_admin_lessons(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::Lesson>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_all_lessons().await))
}

/// review_lesson
///
/// [Admin Route] Records the moderation verdict for a lesson.
///
/// *RBAC*: Strict enforcement of the "admin" role before calling the repository.
#[utoipa::path(
    put,
    path = "/admin/lessons/{id}/review",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = ReviewLessonRequest,
    responses(
        (status = 200, description = "Reviewed", body = Lesson),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid status value")
    )
)]
pub async fn review_lesson(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewLessonRequest>,
) -> Result<Json<models::Lesson>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    if !matches!(payload.status.as_str(), "approved" | "rejected") {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    match state.repo.set_review_status(id, payload.status).await {
        Some(lesson) => Ok(Json(lesson)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// feature_lesson
///
/// [Admin Route] Endpoint for an administrator to feature or unfeature a lesson
/// on the landing page.
#[utoipa::path(
    put,
    path = "/admin/lessons/{id}/feature",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = bool,
    responses((status = 200, description = "Updated", body = Lesson))
)]
pub async fn feature_lesson(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(featured): Json<bool>,
) -> Result<Json<models::Lesson>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.set_featured(id, featured).await {
        Some(lesson) => Ok(Json(lesson)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_lesson_admin
///
/// [Admin Route] Deletes ANY lesson (no ownership check). Used when moderation
/// decides a lesson has to go regardless of who wrote it.
#[utoipa::path(
    delete,
    path = "/admin/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_lesson_admin(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_lesson_admin(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// get_reports
///
/// [Admin Route] The open moderation queue, enriched with lesson titles and
/// reporter emails.
#[utoipa::path(
    get,
    path = "/admin/reports",
    responses((status = 200, description = "Open reports", body = [ReportResponse]))
)]
pub async fn get_reports(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::ReportResponse>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_open_reports().await))
}

/// ignore_report
///
/// [Admin Route] Dismisses a report without touching the reported lesson.
#[utoipa::path(
    put,
    path = "/admin/reports/{id}/ignore",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 204, description = "Dismissed"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn ignore_report(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.ignore_report(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// list_users
///
/// [Admin Route] Paginated, searchable, sortable user listing for the admin dashboard.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserListParams),
    responses((status = 200, description = "User page", body = UserPage))
)]
pub async fn list_users(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<UserPage>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    let page = state
        .repo
        .list_users(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(20),
            params.search,
            params.sort_by.unwrap_or_else(|| "created_at".to_string()),
            params.sort_order.unwrap_or_else(|| "desc".to_string()),
        )
        .await;
    Ok(Json(page))
}

/// update_user_role
///
/// [Admin Route] Promotes or demotes a user. Admins cannot demote themselves —
/// that is the classic way to lock everyone out of the admin area.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid role value")
    )
)]
pub async fn update_user_role(
    AuthUser { id: admin_id, role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    if !matches!(payload.role.as_str(), "user" | "admin") {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    if id == admin_id && payload.role != "admin" {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    match state.repo.set_user_role(id, payload.role).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_user
///
/// [Admin Route] Removes a user account and (via cascade) everything they created.
/// Self-deletion is blocked for the same lock-out reason as self-demotion.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    AuthUser { id: admin_id, role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if id == admin_id {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    if state.repo.delete_user(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
