//! Role-based authorization gate.
//!
//! Each protected method declares an [`Access`] role set and is wrapped with
//! [`guard`]. The gate runs before the handler: it reads the bearer token,
//! verifies it, and checks the token's role against the route's role set.
//! Public methods are simply left unguarded, so their tokens are never read.
//!
//! | Outcome | Status |
//! |---|---|
//! | no token / bad token | 401 |
//! | valid token, role not allowed | 403 |
//! | allowed | handler runs with [`CurrentUser`] available |

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use serde_json::json;

use shop_core::{Role, UserId};

use crate::services::{Claims, TokenService};
use crate::state::AppState;

/// Roles allowed to call a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    roles: &'static [Role],
}

impl Access {
    #[must_use]
    pub const fn roles(roles: &'static [Role]) -> Self {
        Self { roles }
    }

    /// Strict membership: no role implies another.
    #[must_use]
    pub fn allows(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Catalog maintenance (categories and products).
pub const EMPLOYEE: Access = Access::roles(&[Role::Employee]);
/// Account administration.
pub const MANAGER: Access = Access::roles(&[Role::Manager]);

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Token failed signature or expiry checks.
    InvalidToken,
    /// Token is valid but its role is not allowed here.
    Forbidden,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action",
            ),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Authorization check for one route.
#[derive(Debug, Clone)]
pub struct Gate {
    tokens: TokenService,
    access: Access,
}

impl Gate {
    #[must_use]
    pub const fn new(tokens: TokenService, access: Access) -> Self {
        Self { tokens, access }
    }

    /// Decide whether a request with these headers may proceed.
    ///
    /// # Errors
    ///
    /// Returns the matching [`GateRejection`] when access is denied.
    pub fn check(&self, headers: &HeaderMap) -> Result<Claims, GateRejection> {
        let token = bearer_token(headers).ok_or(GateRejection::MissingToken)?;
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            GateRejection::InvalidToken
        })?;

        if !self.access.allows(claims.role) {
            tracing::debug!(
                username = %claims.username,
                role = %claims.role,
                "Role not permitted for route"
            );
            return Err(GateRejection::Forbidden);
        }

        Ok(claims)
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that applies a [`Gate`] and exposes the caller as [`CurrentUser`].
///
/// # Errors
///
/// Returns a [`GateRejection`] response instead of running the handler.
pub async fn authorize(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    let claims = gate.check(request.headers())?;
    let user = CurrentUser::from_claims(claims).ok_or(GateRejection::InvalidToken)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Wrap the methods in `route` with a gate for `access`.
///
/// Merge the result with the route's public methods:
///
/// ```rust,ignore
/// get(list).merge(guard(&state, EMPLOYEE, post(create)))
/// ```
pub fn guard(
    state: &AppState,
    access: Access,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let gate = Gate::new(state.tokens().clone(), access);
    route.route_layer(middleware::from_fn_with_state(gate, authorize))
}

/// The authenticated caller on a guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    /// `None` if the subject is not a user ID.
    fn from_claims(claims: Claims) -> Option<Self> {
        let id = claims.user_id().ok()?;
        Some(Self {
            id,
            username: claims.username,
            role: claims.role,
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(GateRejection::MissingToken)
    }
}
