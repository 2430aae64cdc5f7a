use axum::Router;
use axum::routing::{get, post};
use serde::Serialize;

use usher_core::Store;

use crate::org::handlers::{invitation, member, org};
use crate::state::AppState;
use crate::verification;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok",
        service: "usher",
    })
}

/// Assemble the service router.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        // Organizations
        .route("/organization/create", post(org::handle_create_organization::<S>))
        .route("/organization/list", get(org::handle_list_organizations::<S>))
        .route("/organization/members", get(org::handle_list_members::<S>))
        .route(
            "/organization/current-member",
            get(org::handle_current_member::<S>),
        )
        .route(
            "/organization/remove-member",
            post(member::handle_remove_member::<S>),
        )
        // Invitations
        .route(
            "/organization/invite-member",
            post(invitation::handle_invite_member::<S>),
        )
        .route("/invitation/{id}", get(invitation::handle_get_invitation::<S>))
        .route(
            "/invitation/accept",
            post(invitation::handle_accept_invitation::<S>),
        )
        // Email verification
        .route("/verify-email", get(verification::handle_verify_email::<S>))
        .route("/health", get(health))
        .with_state(state)
}
