//! Route guard as a router layer.
//!
//! Every protected sub-router declares its role set here. On success the
//! resolved `SessionPayload` is stored in request extensions for the
//! `CurrentSession` extractor.

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::services::auth::Role;
use crate::services::auth::route_guard::{GuardContext, GuardFailure};
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct Requirement {
    pub roles: &'static [Role],
    pub context: GuardContext,
}

/// JSON API routes: 401 / 403 on denial.
pub fn api(router: Router<AppState>, state: AppState, roles: &'static [Role]) -> Router<AppState> {
    apply(
        router,
        state,
        Requirement {
            roles,
            context: GuardContext::Api,
        },
    )
}

/// Page routes: redirect to the login page on denial.
pub fn page(router: Router<AppState>, state: AppState, roles: &'static [Role]) -> Router<AppState> {
    apply(
        router,
        state,
        Requirement {
            roles,
            context: GuardContext::Page,
        },
    )
}

fn apply(router: Router<AppState>, state: AppState, requirement: Requirement) -> Router<AppState> {
    // route_layer: unmatched paths stay 404 instead of turning into auth failures.
    router.route_layer(middleware::from_fn_with_state(
        (state, requirement),
        guard_middleware,
    ))
}

async fn guard_middleware(
    State((state, requirement)): State<(AppState, Requirement)>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, GuardFailure> {
    let session = state
        .auth
        .guard(&jar, requirement.roles, requirement.context)?;

    tracing::debug!(user_id = %session.subject_id, role = %session.role, "request authorized");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
