pub mod invitation;
pub mod member;
pub mod org;

use usher_core::{Error, Membership, Result, Store};

use crate::state::AppState;

/// Fetch the requester's membership in an organization, failing with
/// `Forbidden` if they are not a member.
pub(crate) async fn require_membership<S: Store>(
    state: &AppState<S>,
    organization_id: &str,
    user_id: &str,
) -> Result<Membership> {
    state
        .store
        .get_membership(organization_id, user_id)
        .await?
        .ok_or_else(|| Error::forbidden("Not a member of this organization"))
}

/// Like [`require_membership`], but the membership must carry the owner
/// role. Every mutation of members and invitations goes through this gate.
pub(crate) async fn require_owner<S: Store>(
    state: &AppState<S>,
    organization_id: &str,
    user_id: &str,
) -> Result<Membership> {
    let membership = require_membership(state, organization_id, user_id).await?;
    if !membership.role.is_owner() {
        return Err(Error::forbidden(
            "Only the organization owner can perform this action",
        ));
    }
    Ok(membership)
}
