use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::auth::{self, Claims, Role};

/// Path of the sign-in page. Must stay inside the public allow-list: if this path
/// were ever classified as protected, the redirect-to-login outcome would chase
/// its own tail into an infinite redirect loop.
pub const LOGIN_PATH: &str = "/login";

/// Root of the regular member dashboard area.
pub const USER_DASHBOARD: &str = "/dashboard";

/// Root of the admin dashboard area. A sub-path of USER_DASHBOARD, which is why
/// the route table must list it first.
pub const ADMIN_DASHBOARD: &str = "/dashboard/admin";

/// Query parameter carrying the originally requested path across a forced sign-in,
/// so the sign-in flow can return the visitor to their destination afterwards.
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// RouteClass
///
/// Every request path maps to exactly one of these mutually exclusive classes.
/// Classification is a pure function of the path string and never depends on the
/// session token; role checks are applied only after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable by anyone, authenticated or not. Checked before any token lookup.
    Public,
    /// The `/dashboard/admin` subtree. Admins only; everyone else is bounced
    /// back to the member dashboard.
    AdminArea,
    /// The `/dashboard` subtree outside the admin area. Admins are steered to
    /// their own area instead (a UX policy, not a security boundary).
    UserArea,
    /// Any other path the gate sees: requires authentication, carries no role
    /// constraint.
    OtherProtected,
}

/// RouteMatcher
///
/// How a single route-table rule matches a path. Kept as data (rather than a chain
/// of independent `starts_with` conditionals) so the priority ordering is auditable
/// and testable in isolation.
#[derive(Debug, Clone)]
pub enum RouteMatcher {
    Exact(String),
    Prefix(String),
}

impl RouteMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Exact(p) => path == p,
            RouteMatcher::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// A single `(matcher, class)` entry in the route table.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub matcher: RouteMatcher,
    pub class: RouteClass,
}

/// RouteTable
///
/// The ordered classification table, evaluated top-to-bottom with first-match-wins.
/// Paths matching no rule fall through to `OtherProtected`.
///
/// Ordering invariant: public rules come first, and the admin-area prefix is listed
/// before the more general dashboard prefix — `/dashboard/admin/...` is a sub-path
/// of `/dashboard`, so swapping those two rows would silently erase the admin fence.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl Default for RouteTable {
    /// The canonical table: `/` (exact), `/login` and `/api/auth` (the identity
    /// provider's own endpoints) are public; the two dashboard subtrees are the
    /// role-constrained areas.
    fn default() -> Self {
        Self {
            rules: vec![
                RouteRule {
                    matcher: RouteMatcher::Exact("/".to_string()),
                    class: RouteClass::Public,
                },
                RouteRule {
                    matcher: RouteMatcher::Prefix(LOGIN_PATH.to_string()),
                    class: RouteClass::Public,
                },
                RouteRule {
                    matcher: RouteMatcher::Prefix("/api/auth".to_string()),
                    class: RouteClass::Public,
                },
                RouteRule {
                    matcher: RouteMatcher::Prefix(ADMIN_DASHBOARD.to_string()),
                    class: RouteClass::AdminArea,
                },
                RouteRule {
                    matcher: RouteMatcher::Prefix(USER_DASHBOARD.to_string()),
                    class: RouteClass::UserArea,
                },
            ],
        }
    }
}

impl RouteTable {
    /// with_public_prefixes
    ///
    /// Extends the allow-list with deployment-specific public prefixes (e.g. the
    /// read-only API surface, swagger). The gate consumes this configuration but
    /// does not own it. Extensions are inserted ahead of the protected rules and
    /// can only widen the public set — they can never shadow the admin fence,
    /// because a path that is public simply bypasses all role logic.
    pub fn with_public_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra: Vec<RouteRule> = prefixes
            .into_iter()
            .map(|p| RouteRule {
                matcher: RouteMatcher::Prefix(p.into()),
                class: RouteClass::Public,
            })
            .collect();
        // Splice in front so public rules keep unconditional priority.
        self.rules.splice(0..0, extra);
        self
    }

    /// classify
    ///
    /// Pure classification of a request path. Idempotent, token-independent.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.class)
            .unwrap_or(RouteClass::OtherProtected)
    }
}

/// GateDecision
///
/// The outcome of evaluating a single request. The gate is a stateless, single-shot
/// decision function: nothing is cached between requests and nothing is ever raised
/// as an error — every recognized condition resolves into one of these two values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through to its destination unchanged.
    Continue,
    /// Issue a 307 redirect to the given path instead.
    Redirect(String),
}

/// login_redirect
///
/// Builds the sign-in redirect target for an unauthenticated request, preserving
/// the originally requested path (URL-escaped) in the callback parameter.
pub fn login_redirect(path: &str) -> String {
    format!(
        "{}?{}={}",
        LOGIN_PATH,
        CALLBACK_PARAM,
        urlencoding::encode(path)
    )
}

/// decide
///
/// The access decision for one request, pure in `(path, session)`.
///
/// Contract, in priority order:
/// - `Public` paths always pass, regardless of token state. This is checked before
///   the session is even inspected.
/// - No valid session on any non-public path: redirect to sign-in, carrying the
///   destination in the callback parameter. Fail-closed — the caller has already
///   normalized every token failure mode to `None`.
/// - A non-admin inside the admin area is sent to the member dashboard root;
///   an admin inside the member area is steered to the admin dashboard root.
/// - Authenticated requests to anything else pass through; authentication alone is
///   sufficient outside the dashboard subtree.
pub fn decide(table: &RouteTable, path: &str, session: Option<&Claims>) -> GateDecision {
    let class = table.classify(path);

    if class == RouteClass::Public {
        return GateDecision::Continue;
    }

    let claims = match session {
        Some(claims) => claims,
        None => return GateDecision::Redirect(login_redirect(path)),
    };

    match class {
        RouteClass::AdminArea if claims.role != Role::Admin => {
            GateDecision::Redirect(USER_DASHBOARD.to_string())
        }
        RouteClass::UserArea if claims.role == Role::Admin => {
            GateDecision::Redirect(ADMIN_DASHBOARD.to_string())
        }
        _ => GateDecision::Continue,
    }
}

/// is_asset_request
///
/// The host-level inclusion filter: static assets skip the gate entirely. This is
/// a deployment concern (don't burn a token decode on every image request) with no
/// bearing on the decision algorithm itself.
pub fn is_asset_request(path: &str) -> bool {
    if path == "/favicon.ico" {
        return true;
    }
    matches!(
        path.rsplit('.').next(),
        Some("svg" | "png" | "jpg" | "jpeg" | "gif" | "webp" | "ico" | "css" | "js")
    ) && path.contains('.')
}

/// GateContext
///
/// The slice of application state the gate middleware needs: the classification
/// table and the secret for session decoding. Handed to
/// `middleware::from_fn_with_state` so gate tests never have to stand up the
/// repository or payment collaborators.
#[derive(Clone)]
pub struct GateContext {
    pub table: Arc<RouteTable>,
    pub jwt_secret: String,
}

/// access_gate
///
/// The request-time authorization gate, run once per incoming request before
/// routing. It performs the single asynchronous-boundary step the spec allows —
/// resolving the session token — and then applies the pure decision function,
/// terminating in exactly one of the three outcomes: pass-through, redirect to
/// sign-in, or redirect between dashboard areas.
///
/// Holds no state across requests and takes no locks; concurrent invocation for
/// unrelated requests is trivially safe.
pub async fn access_gate(State(ctx): State<GateContext>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if is_asset_request(&path) {
        return next.run(req).await;
    }

    // Per-request token lookup. Decode/verification failures have already been
    // normalized to None inside resolve_session (fail-closed).
    let session = auth::resolve_session(req.headers(), &ctx.jwt_secret);

    match decide(&ctx.table, &path, session.as_ref()) {
        GateDecision::Continue => next.run(req).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(path = %path, target = %target, "access gate redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
