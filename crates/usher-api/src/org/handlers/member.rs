use axum::Json;
use axum::extract::State;

use usher_core::{Error, Result, Store, User};

use super::require_owner;
use crate::extractors::{CurrentSession, ValidatedJson};
use crate::org::types::{RemoveMemberRequest, SuccessResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

pub async fn remove_member_core<S: Store>(
    body: &RemoveMemberRequest,
    requester: &User,
    state: &AppState<S>,
) -> Result<SuccessResponse> {
    require_owner(state, &body.organization_id, &requester.id).await?;

    let target = state
        .store
        .get_membership_by_id(&body.membership_id)
        .await?
        .ok_or_else(|| Error::not_found("Member not found"))?;

    if target.organization_id != body.organization_id {
        return Err(Error::invalid_request("Member not in this organization"));
    }

    // An organization must never be left ownerless through this path.
    if target.role.is_owner() {
        return Err(Error::forbidden("Cannot remove organization owners"));
    }

    state.store.delete_membership(&target.id).await?;

    // Rows the removed user authored stay where they are; only the access
    // relation goes away.
    Ok(SuccessResponse { success: true })
}

// ---------------------------------------------------------------------------
// Axum handler
// ---------------------------------------------------------------------------

pub async fn handle_remove_member<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    ValidatedJson(body): ValidatedJson<RemoveMemberRequest>,
) -> Result<Json<SuccessResponse>> {
    let response = remove_member_core(&body, &user, &state).await?;
    Ok(Json(response))
}
