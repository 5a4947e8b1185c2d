use crate::models::{
    AdminDashboardStats, ContributorSummary, CreateLessonRequest, Favorite, Lesson, Like, Report,
    ReportResponse, UpdateLessonRequest, UpdateProfileRequest, User, UserPage,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Column list shared by every lesson SELECT, kept in one place so the
/// `FromRow` mapping cannot drift between queries.
const LESSON_COLS: &str = "id, creator_id, creator_name, title, description, category, \
     emotional_tone, image, visibility, access_level, review_status, is_featured, \
     likes_count, favorites_count, views_count, created_at, updated_at";

const USER_COLS: &str = "id, name, email, role, is_premium, photo_url, created_at";

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Lesson Retrieval ---
    // Public listing with filtering. Must enforce visibility='public' AND review_status='approved'.
    async fn get_public_lessons(
        &self,
        category: Option<String>,
        search: Option<String>,
    ) -> Vec<Lesson>;
    // Landing page: admin-curated featured lessons.
    async fn get_featured_lessons(&self, limit: i64) -> Vec<Lesson>;
    // Landing page: creators ranked by published lessons and collected likes.
    async fn get_top_contributors(&self, limit: i64) -> Vec<ContributorSummary>;
    // Public detail view. Returns the lesson only if it is publicly visible and approved.
    async fn get_public_lesson(&self, id: Uuid) -> Option<Lesson>;
    // Bumps the view counter. Fire-and-forget: failures are logged, never surfaced.
    async fn record_view(&self, id: Uuid);
    // Unrestricted fetch, for callers that have already settled authorization.
    async fn get_lesson(&self, id: Uuid) -> Option<Lesson>;
    // Admin access: retrieves all lessons regardless of visibility/review state.
    async fn get_all_lessons(&self) -> Vec<Lesson>;
    async fn get_my_lessons(&self, user_id: Uuid) -> Vec<Lesson>;

    // --- Lesson Actions ---
    async fn create_lesson(&self, req: CreateLessonRequest, creator: &User) -> Option<Lesson>;
    // Owner-Only: Updates only if the user_id matches. Uses COALESCE for partial updates.
    async fn update_lesson(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateLessonRequest,
    ) -> Option<Lesson>;
    // Owner-Only: Deletes only if the user_id matches the lesson's creator_id.
    async fn delete_lesson(&self, id: Uuid, user_id: Uuid) -> bool;
    // Owner-Only visibility toggle ('public' / 'private').
    async fn set_lesson_visibility(
        &self,
        id: Uuid,
        user_id: Uuid,
        visibility: String,
    ) -> Option<Lesson>;
    // Idempotent operation: returns true if a row was inserted, false otherwise (conflict).
    async fn like_lesson(&self, like: Like) -> bool;

    // --- Favorites ---
    // Returns None on duplicate (the lesson was already saved by this user).
    async fn add_favorite(&self, user_id: Uuid, lesson_id: Uuid) -> Option<Favorite>;
    // Ownership check: a user can only remove their own favorite.
    async fn remove_favorite(&self, favorite_id: Uuid, user_id: Uuid) -> bool;
    async fn get_favorite_lessons(&self, user_id: Uuid) -> Vec<Lesson>;

    // --- Moderation ---
    async fn create_report(
        &self,
        lesson_id: Uuid,
        reporter_id: Uuid,
        reason: String,
    ) -> Option<Report>;
    async fn get_open_reports(&self) -> Vec<ReportResponse>;
    async fn ignore_report(&self, report_id: Uuid) -> bool;
    // Admin verdict on a pending lesson: 'approved' or 'rejected'.
    async fn set_review_status(&self, id: Uuid, status: String) -> Option<Lesson>;
    // Admin curation of the landing page.
    async fn set_featured(&self, id: Uuid, featured: bool) -> Option<Lesson>;
    /// Admin Override: Delete ANY lesson by ID (No ownership check).
    async fn delete_lesson_admin(&self, id: Uuid) -> bool;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    async fn create_user(&self, user: User) -> Option<User>;
    async fn update_profile(&self, user_id: Uuid, req: UpdateProfileRequest) -> Option<User>;
    // Admin listing with pagination, search and whitelisted sorting.
    async fn list_users(
        &self,
        page: i64,
        limit: i64,
        search: Option<String>,
        sort_by: String,
        sort_order: String,
    ) -> UserPage;
    async fn set_user_role(&self, id: Uuid, role: String) -> Option<User>;
    // Admin: removes the user and cascades to their lessons, likes, favorites, reports.
    async fn delete_user(&self, id: Uuid) -> bool;
    // Flips the premium flag after a verified payment.
    async fn set_premium(&self, user_id: Uuid) -> bool;

    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_public_lessons
    ///
    /// Implements flexible search/filtering using QueryBuilder for safe parameterization,
    /// adhering to the **"No SQL Injection Risk"** mandate.
    /// **Security**: Strictly enforces `visibility = 'public' AND review_status = 'approved'`
    /// in the base query so unreviewed or private lessons never leak to anonymous clients.
    async fn get_public_lessons(
        &self,
        category: Option<String>,
        search: Option<String>,
    ) -> Vec<Lesson> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {LESSON_COLS} FROM lessons \
             WHERE visibility = 'public' AND review_status = 'approved' "
        ));

        if let Some(c) = category {
            builder.push(" AND category = ");
            builder.push_bind(c);
        }

        if let Some(s) = search {
            // Case-insensitive search across title, description and creator name.
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR creator_name ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Lesson>().fetch_all(&self.pool).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("get_public_lessons error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_featured_lessons
    ///
    /// Retrieves admin-featured lessons for the landing page. Featuring is a curation
    /// flag on top of the usual visibility rules, so both are enforced here.
    async fn get_featured_lessons(&self, limit: i64) -> Vec<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLS} FROM lessons \
             WHERE is_featured = true AND visibility = 'public' AND review_status = 'approved' \
             ORDER BY updated_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_featured_lessons error: {:?}", e);
            vec![]
        })
    }

    /// get_top_contributors
    ///
    /// Ranks creators by the likes their published lessons collected. The SUM cast
    /// keeps the aggregate decodable as i64 (Postgres widens SUM(bigint) to numeric).
    async fn get_top_contributors(&self, limit: i64) -> Vec<ContributorSummary> {
        sqlx::query_as::<_, ContributorSummary>(
            "SELECT u.id AS user_id, u.name, u.photo_url, \
                    COUNT(l.id) AS lesson_count, \
                    COALESCE(SUM(l.likes_count), 0)::bigint AS total_likes \
             FROM users u \
             JOIN lessons l ON l.creator_id = u.id \
             WHERE l.visibility = 'public' AND l.review_status = 'approved' \
             GROUP BY u.id, u.name, u.photo_url \
             ORDER BY total_likes DESC, lesson_count DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_top_contributors error: {:?}", e);
            vec![]
        })
    }

    /// get_public_lesson
    ///
    /// Retrieves a lesson *only* if it is public and approved. Used by the public
    /// detail handler.
    async fn get_public_lesson(&self, id: Uuid) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLS} FROM lessons \
             WHERE id = $1 AND visibility = 'public' AND review_status = 'approved'"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_public_lesson error: {:?}", e);
            None
        })
    }

    /// record_view
    ///
    /// Increments the view counter. Intentionally lossy: a failed bump is logged and
    /// forgotten rather than failing the page load.
    async fn record_view(&self, id: Uuid) {
        if let Err(e) = sqlx::query("UPDATE lessons SET views_count = views_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            tracing::error!("record_view error: {:?}", e);
        }
    }

    /// get_lesson
    ///
    /// Simple retrieval of any lesson by ID (no visibility check). Primarily for internal
    /// use when visibility has already been determined by the calling handler (e.g., admin).
    async fn get_lesson(&self, id: Uuid) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLS} FROM lessons WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_lesson error: {:?}", e);
                None
            })
    }

    /// get_all_lessons
    ///
    /// Administrative function to retrieve all lesson records, pending reviews first.
    /// **Note**: Does *not* include the public-visibility restriction.
    async fn get_all_lessons(&self) -> Vec<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLS} FROM lessons \
             ORDER BY (review_status = 'pending') DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_all_lessons error: {:?}", e);
            vec![]
        })
    }

    /// get_my_lessons
    ///
    /// Retrieves all lessons owned by the authenticated user, including private,
    /// pending and rejected ones.
    async fn get_my_lessons(&self, user_id: Uuid) -> Vec<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLS} FROM lessons WHERE creator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_my_lessons error: {:?}", e);
            vec![]
        })
    }

    /// create_lesson
    ///
    /// Inserts a new lesson. All new lessons start as `review_status = 'pending'`,
    /// requiring administrative approval before appearing in public listings.
    async fn create_lesson(&self, req: CreateLessonRequest, creator: &User) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "INSERT INTO lessons \
                (id, creator_id, creator_name, title, description, category, emotional_tone, \
                 image, visibility, access_level, review_status, is_featured, \
                 likes_count, favorites_count, views_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', false, 0, 0, 0, NOW(), NOW()) \
             RETURNING {LESSON_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(creator.id)
        .bind(&creator.name)
        .bind(req.title)
        .bind(req.description)
        .bind(req.category)
        .bind(req.emotional_tone)
        .bind(req.image)
        .bind(req.visibility)
        .bind(req.access_level)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_lesson error: {:?}", e);
            None
        })
    }

    /// update_lesson
    ///
    /// Updates a lesson only if the provided `user_id` matches the creator.
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    /// Any content edit drops the lesson back to 'pending' for re-review.
    async fn update_lesson(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateLessonRequest,
    ) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 category = COALESCE($5, category), \
                 emotional_tone = COALESCE($6, emotional_tone), \
                 image = COALESCE($7, image), \
                 access_level = COALESCE($8, access_level), \
                 review_status = 'pending', \
                 updated_at = NOW() \
             WHERE id = $1 AND creator_id = $2 \
             RETURNING {LESSON_COLS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.category)
        .bind(req.emotional_tone)
        .bind(req.image)
        .bind(req.access_level)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_lesson error: {:?}", e);
            None
        })
    }

    /// delete_lesson
    ///
    /// Deletes a lesson only if the provided `user_id` matches the lesson creator.
    /// This is the **Owner-Only** authorization check.
    async fn delete_lesson(&self, id: Uuid, user_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM lessons WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_lesson error: {:?}", e);
                false
            }
        }
    }

    /// set_lesson_visibility
    ///
    /// Owner-only toggle between 'public' and 'private'. Value validation happens
    /// at the handler; the ownership check lives in the WHERE clause.
    async fn set_lesson_visibility(
        &self,
        id: Uuid,
        user_id: Uuid,
        visibility: String,
    ) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET visibility = $3, updated_at = NOW() \
             WHERE id = $1 AND creator_id = $2 RETURNING {LESSON_COLS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(visibility)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_lesson_visibility error: {:?}", e);
            None
        })
    }

    /// like_lesson
    ///
    /// Inserts a lesson like. Uses `ON CONFLICT DO NOTHING` to ensure **idempotency**.
    /// The function returns true only if a new row was inserted (`rows_affected > 0`),
    /// in which case the denormalized counter is bumped as well.
    async fn like_lesson(&self, like: Like) -> bool {
        let result =
            sqlx::query("INSERT INTO lesson_likes (user_id, lesson_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(like.user_id)
                .bind(like.lesson_id)
                .execute(&self.pool)
                .await;

        match result {
            Ok(res) if res.rows_affected() > 0 => {
                if let Err(e) =
                    sqlx::query("UPDATE lessons SET likes_count = likes_count + 1 WHERE id = $1")
                        .bind(like.lesson_id)
                        .execute(&self.pool)
                        .await
                {
                    tracing::error!("likes_count bump error: {:?}", e);
                }
                true
            }
            // A true conflict (double like) does not error, only database errors are caught here.
            Ok(_) => false,
            Err(e) => {
                tracing::error!("like_lesson error: {:?}", e);
                false
            }
        }
    }

    /// add_favorite
    ///
    /// Saves a lesson for later. Duplicate saves return None via the conflict clause;
    /// a fresh save also bumps the lesson's favorites counter.
    async fn add_favorite(&self, user_id: Uuid, lesson_id: Uuid) -> Option<Favorite> {
        let fav = sqlx::query_as::<_, Favorite>(
            "INSERT INTO favorites (id, user_id, lesson_id, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (user_id, lesson_id) DO NOTHING \
             RETURNING id, user_id, lesson_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("add_favorite error: {:?}", e);
            None
        });

        if fav.is_some() {
            if let Err(e) =
                sqlx::query("UPDATE lessons SET favorites_count = favorites_count + 1 WHERE id = $1")
                    .bind(lesson_id)
                    .execute(&self.pool)
                    .await
            {
                tracing::error!("favorites_count bump error: {:?}", e);
            }
        }
        fav
    }

    /// remove_favorite
    ///
    /// Deletes a favorite only if it belongs to the calling user, decrementing the
    /// lesson counter on success.
    async fn remove_favorite(&self, favorite_id: Uuid, user_id: Uuid) -> bool {
        let deleted: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM favorites WHERE id = $1 AND user_id = $2 RETURNING lesson_id",
        )
        .bind(favorite_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("remove_favorite error: {:?}", e);
            None
        });

        match deleted {
            Some(lesson_id) => {
                if let Err(e) = sqlx::query(
                    "UPDATE lessons SET favorites_count = GREATEST(favorites_count - 1, 0) WHERE id = $1",
                )
                .bind(lesson_id)
                .execute(&self.pool)
                .await
                {
                    tracing::error!("favorites_count decrement error: {:?}", e);
                }
                true
            }
            None => false,
        }
    }

    /// get_favorite_lessons
    ///
    /// Lists the lessons the user saved, newest saves first. Private or retracted
    /// lessons drop out of the list automatically via the visibility join.
    async fn get_favorite_lessons(&self, user_id: Uuid) -> Vec<Lesson> {
        sqlx::query_as::<_, Lesson>(
            "SELECT l.id, l.creator_id, l.creator_name, l.title, l.description, l.category, \
                    l.emotional_tone, l.image, l.visibility, l.access_level, l.review_status, \
                    l.is_featured, l.likes_count, l.favorites_count, l.views_count, \
                    l.created_at, l.updated_at \
             FROM favorites f \
             JOIN lessons l ON f.lesson_id = l.id \
             WHERE f.user_id = $1 AND l.visibility = 'public' AND l.review_status = 'approved' \
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_favorite_lessons error: {:?}", e);
            vec![]
        })
    }

    /// create_report
    ///
    /// Files a moderation report. Returns None if the insert fails (e.g. the lesson
    /// disappeared between page load and submit).
    async fn create_report(
        &self,
        lesson_id: Uuid,
        reporter_id: Uuid,
        reason: String,
    ) -> Option<Report> {
        sqlx::query_as::<_, Report>(
            "INSERT INTO reports (id, lesson_id, reporter_id, reason, status, created_at) \
             VALUES ($1, $2, $3, $4, 'open', NOW()) \
             RETURNING id, lesson_id, reporter_id, reason, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_report error: {:?}", e);
            None
        })
    }

    /// get_open_reports
    ///
    /// The admin moderation queue, enriched with the lesson title and reporter email
    /// the dashboard displays.
    async fn get_open_reports(&self) -> Vec<ReportResponse> {
        sqlx::query_as::<_, ReportResponse>(
            "SELECT r.id, r.lesson_id, l.title AS lesson_title, u.email AS reporter_email, \
                    r.reason, r.status, r.created_at \
             FROM reports r \
             JOIN lessons l ON r.lesson_id = l.id \
             JOIN users u ON r.reporter_id = u.id \
             WHERE r.status = 'open' \
             ORDER BY r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_open_reports error: {:?}", e);
            vec![]
        })
    }

    /// ignore_report
    ///
    /// Marks a report as dismissed without touching the lesson.
    async fn ignore_report(&self, report_id: Uuid) -> bool {
        match sqlx::query("UPDATE reports SET status = 'ignored' WHERE id = $1 AND status = 'open'")
            .bind(report_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("ignore_report error: {:?}", e);
                false
            }
        }
    }

    /// set_review_status
    ///
    /// Admin moderation verdict. Used by the review handler after role enforcement.
    async fn set_review_status(&self, id: Uuid, status: String) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET review_status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {LESSON_COLS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_review_status error: {:?}", e);
            None
        })
    }

    /// set_featured
    ///
    /// Flips the landing-page curation flag.
    async fn set_featured(&self, id: Uuid, featured: bool) -> Option<Lesson> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET is_featured = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {LESSON_COLS}"
        ))
        .bind(id)
        .bind(featured)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_featured error: {:?}", e);
            None
        })
    }

    /// delete_lesson_admin
    ///
    /// **Admin Override**: Deletes a lesson without checking ownership.
    async fn delete_lesson_admin(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_lesson_admin error: {:?}", e);
                false
            }
        }
    }

    /// get_user
    ///
    /// Retrieves the profile data (role, premium flag) needed for authentication
    /// and authorization.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    /// create_user
    ///
    /// Creates the mirroring profile record in `public.users` after the external
    /// identity provider accepted the signup.
    async fn create_user(&self, user: User) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, role, is_premium, photo_url, created_at) \
             VALUES ($1, $2, $3, $4, false, $5, NOW()) RETURNING {USER_COLS}"
        ))
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.role)
        .bind(user.photo_url)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_user error: {:?}", e);
            None
        })
    }

    /// update_profile
    ///
    /// Partial profile update with COALESCE semantics, scoped to the caller's own row.
    async fn update_profile(&self, user_id: Uuid, req: UpdateProfileRequest) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE($2, name), photo_url = COALESCE($3, photo_url) \
             WHERE id = $1 RETURNING {USER_COLS}"
        ))
        .bind(user_id)
        .bind(req.name)
        .bind(req.photo_url)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_profile error: {:?}", e);
            None
        })
    }

    /// list_users
    ///
    /// Paginated, searchable, sortable user listing for the admin dashboard.
    /// The sort column and direction pass through a whitelist — never interpolated
    /// from raw input — keeping the dynamic ORDER BY injection-safe.
    async fn list_users(
        &self,
        page: i64,
        limit: i64,
        search: Option<String>,
        sort_by: String,
        sort_order: String,
    ) -> UserPage {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let sort_col = match sort_by.as_str() {
            "name" => "name",
            "email" => "email",
            _ => "created_at",
        };
        let sort_dir = match sort_order.as_str() {
            "asc" => "ASC",
            _ => "DESC",
        };

        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLS} FROM users WHERE true "));
        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE true ");

        if let Some(s) = search {
            let pattern = format!("%{}%", s);
            for b in [&mut builder, &mut count_builder] {
                b.push(" AND (name ILIKE ");
                b.push_bind(pattern.clone());
                b.push(" OR email ILIKE ");
                b.push_bind(pattern.clone());
                b.push(")");
            }
        }

        builder.push(format!(" ORDER BY {sort_col} {sort_dir}"));
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind((page - 1) * limit);

        let users = match builder.build_query_as::<User>().fetch_all(&self.pool).await {
            Ok(u) => u,
            Err(e) => {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            }
        };

        let total: i64 = match count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("list_users count error: {:?}", e);
                0
            }
        };

        UserPage {
            users,
            total,
            page,
            limit,
        }
    }

    /// set_user_role
    ///
    /// Promotes or demotes a user. The role value is validated at the handler.
    async fn set_user_role(&self, id: Uuid, role: String) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_user_role error: {:?}", e);
            None
        })
    }

    /// delete_user
    ///
    /// Removes the user row. Likes, favorites, lessons and reports cascade via the
    /// ON DELETE CASCADE foreign keys in the schema.
    async fn delete_user(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_user error: {:?}", e);
                false
            }
        }
    }

    /// set_premium
    ///
    /// Flips the premium flag after the payment processor confirmed the session.
    async fn set_premium(&self, user_id: Uuid) -> bool {
        match sqlx::query("UPDATE users SET is_premium = true WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_premium error: {:?}", e);
                false
            }
        }
    }

    /// get_stats
    ///
    /// Compiles all necessary counters for the administrative dashboard in a single call.
    async fn get_stats(&self) -> AdminDashboardStats {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        AdminDashboardStats {
            total_users: count("SELECT COUNT(*) FROM users").await,
            total_lessons: count("SELECT COUNT(*) FROM lessons").await,
            total_likes: count("SELECT COUNT(*) FROM lesson_likes").await,
            pending_reviews: count("SELECT COUNT(*) FROM lessons WHERE review_status = 'pending'")
                .await,
            open_reports: count("SELECT COUNT(*) FROM reports WHERE status = 'open'").await,
            premium_users: count("SELECT COUNT(*) FROM users WHERE is_premium = true").await,
        }
    }
}
