use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use lessons_portal::{
    auth::{Claims, Role},
    gate::{self, GateContext, GateDecision, RouteClass, RouteTable},
};
use std::{sync::Arc, time::SystemTime};
use tower::ServiceExt;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn claims_with_role(role: Role) -> Claims {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    Claims {
        sub: Uuid::from_u128(1),
        email: "member@example.com".to_string(),
        role,
        iat: now,
        exp: now + 3600,
    }
}

fn create_token(role: Role, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: Uuid::from_u128(1),
        email: "member@example.com".to_string(),
        role,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

/// Builds a minimal page-shaped router wrapped in the gate middleware, so the
/// redirect behaviour can be observed end-to-end through tower's oneshot.
fn gated_app() -> Router {
    let ctx = GateContext {
        table: Arc::new(RouteTable::default()),
        jwt_secret: TEST_JWT_SECRET.to_string(),
    };

    Router::new()
        .route("/", get(|| async { "home" }))
        .route("/login", get(|| async { "login" }))
        .route("/dashboard", get(|| async { "dashboard" }))
        .route("/dashboard/my-lessons", get(|| async { "my lessons" }))
        .route("/dashboard/admin", get(|| async { "admin" }))
        .route(
            "/dashboard/admin/manage-users",
            get(|| async { "manage users" }),
        )
        .route("/add-lesson", get(|| async { "add lesson" }))
        .layer(middleware::from_fn_with_state(ctx, gate::access_gate))
}

async fn send(app: Router, path: &str, cookie: Option<&str>) -> (StatusCode, Option<String>) {
    let mut builder = Request::builder().uri(path);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    (response.status(), location)
}

// --- Classification Tests ---

#[test]
fn test_classify_public_routes() {
    let table = RouteTable::default();
    assert_eq!(table.classify("/"), RouteClass::Public);
    assert_eq!(table.classify("/login"), RouteClass::Public);
    assert_eq!(table.classify("/login/reset"), RouteClass::Public);
    assert_eq!(table.classify("/api/auth/callback"), RouteClass::Public);
}

#[test]
fn test_classify_root_is_exact_not_prefix() {
    // Every path starts with "/", so the root rule must be an exact match or the
    // entire site would be public.
    let table = RouteTable::default();
    assert_eq!(table.classify("/add-lesson"), RouteClass::OtherProtected);
    assert_eq!(table.classify("/settings"), RouteClass::OtherProtected);
}

#[test]
fn test_classify_admin_area_wins_over_user_area() {
    // "/dashboard/admin" is a sub-path of "/dashboard"; rule order decides which
    // class a deep admin path gets.
    let table = RouteTable::default();
    assert_eq!(table.classify("/dashboard/admin"), RouteClass::AdminArea);
    assert_eq!(
        table.classify("/dashboard/admin/manage-users"),
        RouteClass::AdminArea
    );
    assert_eq!(table.classify("/dashboard"), RouteClass::UserArea);
    assert_eq!(table.classify("/dashboard/my-lessons"), RouteClass::UserArea);
}

#[test]
fn test_classify_is_idempotent_and_exclusive() {
    let table = RouteTable::default();
    for path in ["/", "/login", "/dashboard", "/dashboard/admin", "/x"] {
        // Same input, same class, every time.
        assert_eq!(table.classify(path), table.classify(path));
    }
}

#[test]
fn test_public_prefix_extension() {
    let table = RouteTable::default().with_public_prefixes(["/lessons", "/health"]);
    assert_eq!(table.classify("/lessons"), RouteClass::Public);
    assert_eq!(table.classify("/lessons/abc123"), RouteClass::Public);
    assert_eq!(table.classify("/health"), RouteClass::Public);
    // Extensions widen the public set but never touch the dashboard fences.
    assert_eq!(table.classify("/dashboard/admin"), RouteClass::AdminArea);
}

// --- Decision Tests ---

#[test]
fn test_public_path_passes_without_token() {
    let table = RouteTable::default();
    assert_eq!(gate::decide(&table, "/", None), GateDecision::Continue);
    assert_eq!(gate::decide(&table, "/login", None), GateDecision::Continue);
}

#[test]
fn test_public_path_passes_with_any_token() {
    // Token state is irrelevant on public paths: checked before the session.
    let table = RouteTable::default();
    let admin = claims_with_role(Role::Admin);
    let user = claims_with_role(Role::User);
    assert_eq!(
        gate::decide(&table, "/login", Some(&admin)),
        GateDecision::Continue
    );
    assert_eq!(
        gate::decide(&table, "/", Some(&user)),
        GateDecision::Continue
    );
}

#[test]
fn test_anonymous_protected_path_redirects_to_login_with_callback() {
    let table = RouteTable::default();
    assert_eq!(
        gate::decide(&table, "/dashboard", None),
        GateDecision::Redirect("/login?callbackUrl=%2Fdashboard".to_string())
    );
    assert_eq!(
        gate::decide(&table, "/add-lesson", None),
        GateDecision::Redirect("/login?callbackUrl=%2Fadd-lesson".to_string())
    );
}

#[test]
fn test_anonymous_deep_admin_path_keeps_full_callback() {
    let table = RouteTable::default();
    assert_eq!(
        gate::decide(&table, "/dashboard/admin/manage-users", None),
        GateDecision::Redirect(
            "/login?callbackUrl=%2Fdashboard%2Fadmin%2Fmanage-users".to_string()
        )
    );
}

#[test]
fn test_callback_url_round_trips_through_escaping() {
    for path in [
        "/dashboard/admin/manage users",
        "/dashboard?tab=lessons&page=2",
        "/уроки/жизни",
    ] {
        let target = gate::login_redirect(path);
        let encoded = target.split("callbackUrl=").nth(1).unwrap();
        assert_eq!(urlencoding::decode(encoded).unwrap(), path);
    }
}

#[test]
fn test_non_admin_in_admin_area_is_bounced_to_dashboard() {
    let table = RouteTable::default();
    let user = claims_with_role(Role::User);
    assert_eq!(
        gate::decide(&table, "/dashboard/admin", Some(&user)),
        GateDecision::Redirect("/dashboard".to_string())
    );
    assert_eq!(
        gate::decide(&table, "/dashboard/admin/manage-users", Some(&user)),
        GateDecision::Redirect("/dashboard".to_string())
    );
}

#[test]
fn test_admin_in_user_area_is_steered_to_admin_dashboard() {
    let table = RouteTable::default();
    let admin = claims_with_role(Role::Admin);
    assert_eq!(
        gate::decide(&table, "/dashboard", Some(&admin)),
        GateDecision::Redirect("/dashboard/admin".to_string())
    );
    assert_eq!(
        gate::decide(&table, "/dashboard/my-lessons", Some(&admin)),
        GateDecision::Redirect("/dashboard/admin".to_string())
    );
}

#[test]
fn test_authenticated_other_protected_passes_regardless_of_role() {
    // Outside the dashboard subtree authentication alone is sufficient.
    let table = RouteTable::default();
    let user = claims_with_role(Role::User);
    let admin = claims_with_role(Role::Admin);
    assert_eq!(
        gate::decide(&table, "/add-lesson", Some(&user)),
        GateDecision::Continue
    );
    assert_eq!(
        gate::decide(&table, "/add-lesson", Some(&admin)),
        GateDecision::Continue
    );
}

#[test]
fn test_redirect_targets_never_loop() {
    // Every redirect the gate can emit must itself resolve to Continue for the
    // session that triggered it, otherwise the browser chases its tail.
    let table = RouteTable::default();
    let user = claims_with_role(Role::User);
    let admin = claims_with_role(Role::Admin);

    // Non-admin bounced out of the admin area lands on a path that passes.
    if let GateDecision::Redirect(target) = gate::decide(&table, "/dashboard/admin", Some(&user)) {
        assert_eq!(gate::decide(&table, &target, Some(&user)), GateDecision::Continue);
    } else {
        panic!("expected a redirect");
    }

    // Admin steered out of the member area lands on a path that passes.
    if let GateDecision::Redirect(target) = gate::decide(&table, "/dashboard", Some(&admin)) {
        assert_eq!(gate::decide(&table, &target, Some(&admin)), GateDecision::Continue);
    } else {
        panic!("expected a redirect");
    }

    // The anonymous redirect target is always public.
    if let GateDecision::Redirect(target) = gate::decide(&table, "/dashboard", None) {
        let path_only = target.split('?').next().unwrap();
        assert_eq!(gate::decide(&table, path_only, None), GateDecision::Continue);
    } else {
        panic!("expected a redirect");
    }
}

#[test]
fn test_asset_requests_are_skipped() {
    assert!(gate::is_asset_request("/favicon.ico"));
    assert!(gate::is_asset_request("/images/hero.png"));
    assert!(gate::is_asset_request("/styles/app.css"));
    assert!(!gate::is_asset_request("/dashboard"));
    assert!(!gate::is_asset_request("/lessons"));
}

// --- Middleware (End-to-End) Tests ---

#[tokio::test]
async fn test_gate_allows_anonymous_home_page() {
    let (status, _) = send(gated_app(), "/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_redirects_anonymous_dashboard_request() {
    let (status, location) = send(gated_app(), "/dashboard", None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/login?callbackUrl=%2Fdashboard"));
}

#[tokio::test]
async fn test_gate_accepts_session_cookie() {
    let token = create_token(Role::User, 3600);
    let cookie = format!("session={}", token);
    let (status, _) = send(gated_app(), "/dashboard/my-lessons", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_bounces_member_out_of_admin_area() {
    let token = create_token(Role::User, 3600);
    let cookie = format!("session={}", token);
    let (status, location) =
        send(gated_app(), "/dashboard/admin/manage-users", Some(&cookie)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn test_gate_steers_admin_to_admin_dashboard() {
    let token = create_token(Role::Admin, 3600);
    let cookie = format!("session={}", token);
    let (status, location) = send(gated_app(), "/dashboard", Some(&cookie)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/dashboard/admin"));
}

#[tokio::test]
async fn test_gate_admin_reaches_admin_area() {
    let token = create_token(Role::Admin, 3600);
    let cookie = format!("session={}", token);
    let (status, _) = send(gated_app(), "/dashboard/admin", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_treats_garbage_cookie_as_anonymous() {
    // Fail-closed: an unparseable token must behave exactly like no token.
    let (status, location) =
        send(gated_app(), "/dashboard", Some("session=not-a-jwt")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/login?callbackUrl=%2Fdashboard"));
}

#[tokio::test]
async fn test_gate_treats_expired_token_as_anonymous() {
    // Issued an hour ago, expired half an hour ago.
    let token = create_token(Role::Admin, -1800);
    let cookie = format!("session={}", token);
    let (status, location) = send(gated_app(), "/dashboard/admin", Some(&cookie)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location.as_deref(),
        Some("/login?callbackUrl=%2Fdashboard%2Fadmin")
    );
}

#[tokio::test]
async fn test_gate_rejects_token_signed_with_wrong_secret() {
    let claims = claims_with_role(Role::Admin);
    let key = EncodingKey::from_secret(b"a-completely-different-secret");
    let forged = encode(&Header::default(), &claims, &key).unwrap();
    let cookie = format!("session={}", forged);
    let (status, location) = send(gated_app(), "/dashboard/admin", Some(&cookie)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location.as_deref(),
        Some("/login?callbackUrl=%2Fdashboard%2Fadmin")
    );
}

#[tokio::test]
async fn test_gate_skips_asset_paths_without_token() {
    // Asset requests bypass classification entirely; this one 404s on the inner
    // router instead of being redirected to sign-in.
    let (status, location) = send(gated_app(), "/logo.png", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(location, None);
}
