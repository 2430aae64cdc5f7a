use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::identity::{CreateSession, CreateUser, CreateVerification, Session, User, Verification};
use crate::tenancy::{
    CreateInvitation, CreateMembership, CreateOrganization, Invitation, Membership, Organization,
    Role,
};

/// User persistence operations.
///
/// Users are owned by the external auth provider; apart from
/// [`set_email_verified`](UserStore::set_email_verified) this service only
/// reads them.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn create_user(&self, create: CreateUser) -> Result<User>;
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn set_email_verified(&self, user_id: &str) -> Result<User>;
}

/// Session persistence operations.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn create_session(&self, create: CreateSession) -> Result<Session>;
    async fn get_session(&self, token: &str) -> Result<Option<Session>>;
    async fn delete_session(&self, token: &str) -> Result<()>;
}

/// Verification token persistence operations.
#[async_trait]
pub trait VerificationStore: Send + Sync + 'static {
    async fn create_verification(&self, create: CreateVerification) -> Result<Verification>;
    async fn get_verification(&self, id: &str) -> Result<Option<Verification>>;
    async fn delete_verification(&self, id: &str) -> Result<()>;
}

/// Organization persistence operations.
#[async_trait]
pub trait OrganizationStore: Send + Sync + 'static {
    /// Insert an organization together with its owner membership,
    /// all-or-nothing. A failed membership insert must leave no
    /// organization row behind.
    async fn create_organization_with_owner(
        &self,
        create: CreateOrganization,
        owner_user_id: &str,
    ) -> Result<(Organization, Membership)>;

    async fn get_organization_by_id(&self, id: &str) -> Result<Option<Organization>>;

    /// Organizations the user belongs to, joined through memberships.
    async fn list_user_organizations(&self, user_id: &str) -> Result<Vec<Organization>>;
}

/// Membership persistence operations.
///
/// Inserts are guarded by a unique constraint on
/// `(user_id, organization_id)` and a partial unique constraint on
/// `(organization_id)` where role is owner; a
/// [`DatabaseError::Constraint`](crate::error::DatabaseError) from an insert
/// is the authoritative "already exists" signal.
#[async_trait]
pub trait MembershipStore: Send + Sync + 'static {
    async fn create_membership(&self, create: CreateMembership) -> Result<Membership>;
    async fn get_membership(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>>;
    async fn get_membership_by_id(&self, id: &str) -> Result<Option<Membership>>;
    async fn delete_membership(&self, id: &str) -> Result<()>;
    async fn list_organization_members(&self, organization_id: &str) -> Result<Vec<Membership>>;
    async fn count_organization_owners(&self, organization_id: &str) -> Result<usize>;
}

/// Invitation persistence operations.
#[async_trait]
pub trait InvitationStore: Send + Sync + 'static {
    async fn create_invitation(&self, create: CreateInvitation) -> Result<Invitation>;
    async fn get_invitation_by_id(&self, id: &str) -> Result<Option<Invitation>>;

    /// The invitation for `(organization_id, email)`, matched
    /// case-insensitively on email and regardless of status. At most one
    /// row exists per pair.
    async fn get_invitation_for_email(
        &self,
        organization_id: &str,
        email: &str,
    ) -> Result<Option<Invitation>>;

    /// Re-offer an existing invitation: update the role, reset the expiry,
    /// and reset status to pending.
    async fn refresh_invitation(
        &self,
        id: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation>;

    /// Accept an invitation: insert the membership (role taken from the
    /// invitation row) and mark the invitation accepted in one transaction.
    /// If the user already holds a membership in the organization, the
    /// insert is absorbed and `None` is returned for the membership; the
    /// status flip still happens.
    async fn accept_invitation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<(Invitation, Option<Membership>)>;

    async fn delete_invitation(&self, id: &str) -> Result<()>;
    async fn list_organization_invitations(&self, organization_id: &str)
    -> Result<Vec<Invitation>>;
}
