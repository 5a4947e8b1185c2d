use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use gate::{GateContext, RouteTable};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use payments::{HttpPaymentClient, MockPaymentService, PaymentState};
pub use repository::{PostgresRepository, RepositoryState};

/// Prefixes the access gate treats as public in addition to its built-in allow-list.
/// These are this deployment's anonymous read surface: health probe, registration,
/// the published-lesson catalogue, the landing page widgets, and the API docs.
const PUBLIC_API_PREFIXES: [&str; 6] = [
    "/health",
    "/register",
    "/lessons",
    "/contributors",
    "/swagger-ui",
    "/api-docs",
];

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::get_lessons, handlers::get_lesson_details, handlers::get_featured_lessons,
        handlers::get_top_contributors, handlers::register_user, handlers::get_me,
        handlers::update_profile, handlers::get_my_lessons, handlers::get_my_favorites,
        handlers::create_lesson, handlers::update_lesson, handlers::delete_lesson,
        handlers::set_lesson_visibility, handlers::like_lesson, handlers::add_favorite,
        handlers::remove_favorite, handlers::report_lesson, handlers::create_checkout_session,
        handlers::verify_payment, handlers::get_admin_stats, handlers::get_admin_lessons,
        handlers::review_lesson, handlers::feature_lesson, handlers::delete_lesson_admin,
        handlers::get_reports, handlers::ignore_report, handlers::list_users,
        handlers::update_user_role, handlers::delete_user
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Lesson, models::CreateLessonRequest, models::UpdateLessonRequest,
            models::Like, models::Favorite, models::Report, models::ReportResponse,
            models::CreateReportRequest, models::ReviewLessonRequest, models::ContributorSummary,
            models::AdminDashboardStats, models::User, models::UserProfile, models::UserPage,
            models::RegisterUserRequest, models::UpdateProfileRequest, models::UpdateRoleRequest,
            models::CheckoutSessionResponse, models::VerifyPaymentRequest,
        )
    ),
    tags(
        (name = "lessons-portal", description = "Life Lessons Sharing Platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and immutable
/// container holding all essential application services and configuration.
/// The application state is shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Payment Layer: Abstracts the external checkout processor.
    pub payments: PaymentState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers to selectively pull components from the shared AppState.
// This is critical for dependency injection and adhering to the Clean Architecture boundaries.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(app_state: &AppState) -> PaymentState {
        app_state.payments.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// A middleware function that enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since `AuthUser`
/// implements `FromRequestParts`, if authentication (JWT validation, DB lookup) fails,
/// the extractor immediately rejects the request with a 401 Unauthorized status,
/// preventing execution of the handler. If successful, it allows the request to proceed.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
///
/// Middleware ordering matters here: the access gate is layered **outside** the router,
/// so the classify-and-redirect decision runs once per request before any route (or the
/// fallback) is reached. Requests the gate passes through still meet the `AuthUser`
/// extractor on protected routes, which re-verifies the same credential against the
/// database. Two layers, one credential.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Access Gate Context
    // The gate only needs the route table and the session secret, so it gets its own
    // small state slice rather than the full AppState.
    let gate_ctx = GateContext {
        table: Arc::new(RouteTable::default().with_public_prefixes(PUBLIC_API_PREFIXES)),
        jwt_secret: state.config.jwt_secret.clone(),
    };

    // 3. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        // This implements the second layer of Defense-in-Depth for these routes.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: Nested under '/admin'. The 'admin' role check is performed
        // *inside* the handlers after the request passes the authentication layer above.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Apply the Unified State to all routes.
        .with_state(state)
        // The Access Gate: classification and redirect decisions for every request,
        // including ones no route matches (those classify as protected-by-default).
        .layer(middleware::from_fn_with_state(gate_ctx, gate::access_gate));

    // 4. Observability and Correlation Layers (Applied outermost/first)
    // This section implements the Production Observability Stack.
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: Generates a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: Wraps the entire request/response lifecycle in a tracing span.
                // Uses the `trace_span_logger` to include the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: Ensures the generated x-request-id header is
                // returned to the client and injected into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (Applied last, allowing all traffic in/out after processing)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI.
///
/// *Goal*: Ensure every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // The structured log format used by the tracing macros.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
