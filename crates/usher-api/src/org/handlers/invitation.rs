use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;

use usher_core::{
    CreateInvitation, CreateMembership, Error, Result, Store, User,
};

use super::require_owner;
use crate::extractors::{CurrentSession, ValidatedJson};
use crate::mailer;
use crate::org::types::{
    AcceptInvitationRequest, AcceptInvitationResponse, InvitationDetailsResponse, InvitationView,
    InviteMemberRequest, InviteOutcome, InviteReceipt, InviteResponse, MemberResponse,
    OrganizationView,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

pub async fn invite_member_core<S: Store>(
    body: &InviteMemberRequest,
    requester: &User,
    state: &AppState<S>,
) -> Result<InviteReceipt> {
    let email = body.email.trim().to_lowercase();

    require_owner(state, &body.organization_id, &requester.id).await?;

    if body.role.is_owner()
        && state
            .store
            .count_organization_owners(&body.organization_id)
            .await?
            > 0
    {
        return Err(Error::invalid_request(
            "Each organization may have only one owner",
        ));
    }

    // Fast path: the address already belongs to an account, so membership is
    // granted directly and no email goes out. The user sees the organization
    // the next time they load their membership list.
    if let Some(existing_user) = state.store.get_user_by_email(&email).await? {
        if state
            .store
            .get_membership(&body.organization_id, &existing_user.id)
            .await?
            .is_some()
        {
            return Ok(InviteReceipt {
                outcome: InviteOutcome::AlreadyMember,
                email_sent: None,
                email_error: None,
            });
        }

        let create =
            CreateMembership::new(&body.organization_id, &existing_user.id, body.role);
        let outcome = match state.store.create_membership(create).await {
            Ok(membership) => InviteOutcome::MemberAdded(membership),
            // A concurrent invite won the insert; the unique index is the
            // authoritative "already a member" signal.
            Err(Error::Database(db)) if db.is_constraint_violation() => {
                InviteOutcome::AlreadyMember
            }
            Err(err) => return Err(err),
        };

        return Ok(InviteReceipt {
            outcome,
            email_sent: None,
            email_error: None,
        });
    }

    // No account yet: upsert the single invitation row for (org, email) and
    // notify. Re-inviting refreshes role, expiry, and status regardless of
    // what happened to the previous offer.
    let expires_at = Utc::now() + state.config.invitation.expires_in;

    let (invitation, updated) = match state
        .store
        .get_invitation_for_email(&body.organization_id, &email)
        .await?
    {
        Some(existing) => {
            let refreshed = state
                .store
                .refresh_invitation(&existing.id, body.role, expires_at)
                .await?;
            (refreshed, true)
        }
        None => {
            let create = CreateInvitation {
                organization_id: body.organization_id.clone(),
                email: email.clone(),
                role: body.role,
                inviter_id: requester.id.clone(),
                expires_at,
            };
            match state.store.create_invitation(create).await {
                Ok(invitation) => (invitation, false),
                // Lost a concurrent-create race; the row exists now, so
                // refresh it instead.
                Err(Error::Database(db)) if db.is_constraint_violation() => {
                    let existing = state
                        .store
                        .get_invitation_for_email(&body.organization_id, &email)
                        .await?
                        .ok_or_else(|| {
                            Error::internal("invitation vanished after unique violation")
                        })?;
                    let refreshed = state
                        .store
                        .refresh_invitation(&existing.id, body.role, expires_at)
                        .await?;
                    (refreshed, true)
                }
                Err(err) => return Err(err),
            }
        }
    };

    // The invitation row is durable whether or not the notification makes it
    // out; a failed send is reported so the owner can share the link
    // manually.
    let (email_sent, email_error) =
        match mailer::send_invitation_email(state, &email, &invitation, requester).await {
            Ok(()) => (Some(true), None),
            Err(err) => {
                tracing::warn!(
                    invitation_id = %invitation.id,
                    error = %err,
                    "invitation email delivery failed"
                );
                (Some(false), Some(err.to_string()))
            }
        };

    let outcome = if updated {
        InviteOutcome::InvitationUpdated(invitation)
    } else {
        InviteOutcome::InvitationCreated(invitation)
    };

    Ok(InviteReceipt {
        outcome,
        email_sent,
        email_error,
    })
}

pub async fn accept_invitation_core<S: Store>(
    body: &AcceptInvitationRequest,
    requester: &User,
    state: &AppState<S>,
) -> Result<AcceptInvitationResponse> {
    let invitation = state
        .store
        .get_invitation_by_id(&body.invitation_id)
        .await?
        .ok_or_else(|| Error::not_found("Invitation not found"))?;

    // Expired rows are pruned lazily, on the read that discovers them.
    if invitation.is_expired() {
        state.store.delete_invitation(&invitation.id).await?;
        return Err(Error::InvitationExpired);
    }

    if !invitation.is_pending() {
        return Err(Error::InvitationProcessed);
    }

    // The invitation id is a bearer token; matching the signed-in email is
    // the only thing keeping a forwarded link from enrolling the wrong
    // identity. Never silently reassign.
    if !invitation.email.eq_ignore_ascii_case(&requester.email) {
        return Err(Error::EmailMismatch);
    }

    let (invitation, membership) = state
        .store
        .accept_invitation(&invitation.id, &requester.id)
        .await?;

    let already_member = membership.is_none();
    let member = membership
        .map(|m| MemberResponse::from_membership_and_user(&m, requester));

    Ok(AcceptInvitationResponse {
        invitation,
        member,
        already_member,
    })
}

pub async fn get_invitation_core<S: Store>(
    invitation_id: &str,
    state: &AppState<S>,
) -> Result<InvitationDetailsResponse> {
    let invitation = state
        .store
        .get_invitation_by_id(invitation_id)
        .await?
        .ok_or_else(|| Error::not_found("Invitation not found"))?;

    if invitation.is_expired() {
        state.store.delete_invitation(&invitation.id).await?;
        return Err(Error::InvitationExpired);
    }

    if !invitation.is_pending() {
        return Err(Error::InvitationProcessed);
    }

    let organization = state
        .store
        .get_organization_by_id(&invitation.organization_id)
        .await?
        .ok_or_else(|| Error::not_found("Organization not found"))?;

    Ok(InvitationDetailsResponse {
        invitation: InvitationView::from_invitation(&invitation),
        organization: OrganizationView::from_organization(&organization),
    })
}

// ---------------------------------------------------------------------------
// Axum handlers
// ---------------------------------------------------------------------------

pub async fn handle_invite_member<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    ValidatedJson(body): ValidatedJson<InviteMemberRequest>,
) -> Result<Json<InviteResponse>> {
    let receipt = invite_member_core(&body, &user, &state).await?;
    Ok(Json(receipt.into()))
}

pub async fn handle_accept_invitation<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    ValidatedJson(body): ValidatedJson<AcceptInvitationRequest>,
) -> Result<Json<AcceptInvitationResponse>> {
    let response = accept_invitation_core(&body, &user, &state).await?;
    Ok(Json(response))
}

/// Pre-acceptance display of an invitation. Deliberately unauthenticated:
/// the recipient may not have an account yet.
pub async fn handle_get_invitation<S: Store>(
    State(state): State<AppState<S>>,
    Path(invitation_id): Path<String>,
) -> Result<Json<InvitationDetailsResponse>> {
    let response = get_invitation_core(&invitation_id, &state).await?;
    Ok(Json(response))
}
