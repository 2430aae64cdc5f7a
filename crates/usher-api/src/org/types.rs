use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use usher_core::{Invitation, InvitationStatus, Membership, Organization, Role, User};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: Role,
}

fn default_invite_role() -> Role {
    Role::Member
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveMemberRequest {
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    #[serde(rename = "membershipId")]
    #[validate(length(min = 1, message = "Membership id is required"))]
    pub membership_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[serde(rename = "invitationId")]
    #[validate(length(min = 1, message = "Invitation id is required"))]
    pub invitation_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationQuery {
    #[serde(rename = "organizationId")]
    pub organization_id: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Minimal user info embedded in member responses.
#[derive(Debug, Clone, Serialize)]
pub struct MemberUserView {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl MemberUserView {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Membership with its user projection, as the dashboard renders it.
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub id: String,
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub user: MemberUserView,
}

impl MemberResponse {
    pub fn from_membership_and_user(membership: &Membership, user: &User) -> Self {
        Self {
            id: membership.id.clone(),
            organization_id: membership.organization_id.clone(),
            user_id: membership.user_id.clone(),
            role: membership.role,
            created_at: membership.created_at,
            user: MemberUserView::from_user(user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateOrganizationResponse {
    #[serde(flatten)]
    pub organization: Organization,
    pub members: Vec<MemberResponse>,
}

#[derive(Debug, Serialize)]
pub struct ListMembersResponse {
    pub members: Vec<MemberResponse>,
    pub total: usize,
}

/// Pre-acceptance projection of an invitation and its organization.
#[derive(Debug, Serialize)]
pub struct InvitationDetailsResponse {
    pub invitation: InvitationView,
    pub organization: OrganizationView,
}

#[derive(Debug, Serialize)]
pub struct InvitationView {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl InvitationView {
    pub fn from_invitation(invitation: &Invitation) -> Self {
        Self {
            id: invitation.id.clone(),
            email: invitation.email.clone(),
            role: invitation.role,
            status: invitation.status,
            expires_at: invitation.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrganizationView {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl OrganizationView {
    pub fn from_organization(organization: &Organization) -> Self {
        Self {
            id: organization.id.clone(),
            name: organization.name.clone(),
            slug: organization.slug.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    pub invitation: Invitation,
    /// `None` when the accepting user was already a member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberResponse>,
    #[serde(rename = "alreadyMember")]
    pub already_member: bool,
}

// ---------------------------------------------------------------------------
// Invite outcome
// ---------------------------------------------------------------------------

/// What the invite operation did. The existing-user fast path mutates
/// memberships directly; the new-user path persists (or refreshes) an
/// invitation and attempts an email.
#[derive(Debug)]
pub enum InviteOutcome {
    MemberAdded(Membership),
    AlreadyMember,
    InvitationCreated(Invitation),
    InvitationUpdated(Invitation),
}

/// Invite operation result, including whether the notification email went
/// out. A failed send never rolls back the invitation write; the caller is
/// told so it can surface a "share this link manually" affordance.
#[derive(Debug)]
pub struct InviteReceipt {
    pub outcome: InviteOutcome,
    pub email_sent: Option<bool>,
    pub email_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Invitation>,
    #[serde(rename = "emailSent", skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(rename = "emailError", skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<InviteReceipt> for InviteResponse {
    fn from(receipt: InviteReceipt) -> Self {
        let (message, invitation) = match receipt.outcome {
            InviteOutcome::MemberAdded(_) => ("Member added successfully".to_string(), None),
            InviteOutcome::AlreadyMember => ("Member already exists".to_string(), None),
            InviteOutcome::InvitationCreated(inv) => ("Invitation created".to_string(), Some(inv)),
            InviteOutcome::InvitationUpdated(inv) => ("Invitation updated".to_string(), Some(inv)),
        };
        Self {
            success: true,
            message,
            invitation,
            email_sent: receipt.email_sent,
            email_error: receipt.email_error,
        }
    }
}
