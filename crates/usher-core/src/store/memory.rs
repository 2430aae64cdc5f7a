use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DatabaseError, Error, Result};
use crate::identity::{CreateSession, CreateUser, CreateVerification, Session, User, Verification};
use crate::tenancy::{
    CreateInvitation, CreateMembership, CreateOrganization, Invitation, InvitationStatus,
    Membership, Organization, Role,
};

use super::traits::{
    InvitationStore, MembershipStore, OrganizationStore, SessionStore, UserStore,
    VerificationStore,
};

/// In-memory store for tests and local development.
///
/// A single mutex guards all tables so the composite operations
/// (organization bootstrap, invitation accept) are naturally atomic, the
/// same way a database transaction makes them atomic in [`PgStore`].
/// Uniqueness constraints and user/organization foreign keys are emulated
/// so constraint-violation code paths behave as they would on Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    /// email -> user id
    email_index: HashMap<String, String>,
    /// token -> session
    sessions: HashMap<String, Session>,
    verifications: HashMap<String, Verification>,
    organizations: HashMap<String, Organization>,
    memberships: HashMap<String, Membership>,
    invitations: HashMap<String, Invitation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// Insert a membership, enforcing the constraints the Postgres schema
    /// enforces: user and organization must exist (foreign keys), at most
    /// one membership per (user, organization), at most one owner per
    /// organization.
    fn insert_membership(&mut self, create: &CreateMembership) -> Result<Membership> {
        if !self.users.contains_key(&create.user_id) {
            return Err(Error::Database(DatabaseError::Query(format!(
                "foreign key violation: no user {}",
                create.user_id
            ))));
        }
        if !self.organizations.contains_key(&create.organization_id) {
            return Err(Error::Database(DatabaseError::Query(format!(
                "foreign key violation: no organization {}",
                create.organization_id
            ))));
        }

        let duplicate = self.memberships.values().any(|m| {
            m.organization_id == create.organization_id && m.user_id == create.user_id
        });
        if duplicate {
            return Err(Error::Database(DatabaseError::Constraint(
                "duplicate key value violates unique constraint \"idx_membership_org_user\""
                    .to_string(),
            )));
        }

        if create.role.is_owner() {
            let has_owner = self
                .memberships
                .values()
                .any(|m| m.organization_id == create.organization_id && m.role.is_owner());
            if has_owner {
                return Err(Error::Database(DatabaseError::Constraint(
                    "duplicate key value violates unique constraint \"idx_membership_single_owner\""
                        .to_string(),
                )));
            }
        }

        let membership = Membership {
            id: Uuid::new_v4().to_string(),
            organization_id: create.organization_id.clone(),
            user_id: create.user_id.clone(),
            role: create.role,
            created_at: Utc::now(),
        };
        self.memberships
            .insert(membership.id.clone(), membership.clone());
        Ok(membership)
    }
}

// ── User operations ──

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, create: CreateUser) -> Result<User> {
        let mut tables = self.tables.lock().unwrap();

        if tables.email_index.contains_key(&create.email) {
            return Err(Error::Database(DatabaseError::Constraint(
                "duplicate key value violates unique constraint \"idx_user_email\"".to_string(),
            )));
        }

        let id = create.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let user = User {
            id: id.clone(),
            email: create.email.clone(),
            name: create.name,
            email_verified: create.email_verified,
            created_at: Utc::now(),
        };

        tables.email_index.insert(create.email, id.clone());
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        let user = tables
            .email_index
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned();
        Ok(user)
    }

    async fn set_email_verified(&self, user_id: &str) -> Result<User> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| Error::not_found("User not found"))?;
        user.email_verified = true;
        Ok(user.clone())
    }
}

// ── Session operations ──

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, create: CreateSession) -> Result<Session> {
        let mut tables = self.tables.lock().unwrap();

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token: format!("session_{}", Uuid::new_v4()),
            user_id: create.user_id,
            expires_at: create.expires_at,
            created_at: Utc::now(),
        };

        tables
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.remove(token);
        Ok(())
    }
}

// ── Verification operations ──

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn create_verification(&self, create: CreateVerification) -> Result<Verification> {
        let mut tables = self.tables.lock().unwrap();

        let verification = Verification {
            id: Uuid::new_v4().to_string(),
            identifier: create.identifier,
            value: create.value,
            expires_at: create.expires_at,
            created_at: Utc::now(),
        };

        tables
            .verifications
            .insert(verification.id.clone(), verification.clone());
        Ok(verification)
    }

    async fn get_verification(&self, id: &str) -> Result<Option<Verification>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.verifications.get(id).cloned())
    }

    async fn delete_verification(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.verifications.remove(id);
        Ok(())
    }
}

// ── Organization operations ──

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization_with_owner(
        &self,
        create: CreateOrganization,
        owner_user_id: &str,
    ) -> Result<(Organization, Membership)> {
        let mut tables = self.tables.lock().unwrap();

        let id = create.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let organization = Organization {
            id: id.clone(),
            name: create.name,
            slug: create.slug,
            created_at: Utc::now(),
        };
        tables.organizations.insert(id.clone(), organization.clone());

        let owner = CreateMembership::new(&id, owner_user_id, Role::Owner);
        match tables.insert_membership(&owner) {
            Ok(membership) => Ok((organization, membership)),
            Err(err) => {
                // Roll the organization insert back, as the surrounding
                // transaction would on Postgres.
                tables.organizations.remove(&id);
                Err(err)
            }
        }
    }

    async fn get_organization_by_id(&self, id: &str) -> Result<Option<Organization>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.organizations.get(id).cloned())
    }

    async fn list_user_organizations(&self, user_id: &str) -> Result<Vec<Organization>> {
        let tables = self.tables.lock().unwrap();
        let mut orgs: Vec<Organization> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.organizations.get(&m.organization_id).cloned())
            .collect();
        orgs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orgs)
    }
}

// ── Membership operations ──

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_membership(&self, create: CreateMembership) -> Result<Membership> {
        let mut tables = self.tables.lock().unwrap();
        tables.insert_membership(&create)
    }

    async fn get_membership(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .memberships
            .values()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn get_membership_by_id(&self, id: &str) -> Result<Option<Membership>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.memberships.get(id).cloned())
    }

    async fn delete_membership(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.memberships.remove(id);
        Ok(())
    }

    async fn list_organization_members(&self, organization_id: &str) -> Result<Vec<Membership>> {
        let tables = self.tables.lock().unwrap();
        let mut members: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn count_organization_owners(&self, organization_id: &str) -> Result<usize> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .memberships
            .values()
            .filter(|m| m.organization_id == organization_id && m.role.is_owner())
            .count())
    }
}

// ── Invitation operations ──

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn create_invitation(&self, create: CreateInvitation) -> Result<Invitation> {
        let mut tables = self.tables.lock().unwrap();

        let duplicate = tables.invitations.values().any(|i| {
            i.organization_id == create.organization_id
                && i.email.eq_ignore_ascii_case(&create.email)
        });
        if duplicate {
            return Err(Error::Database(DatabaseError::Constraint(
                "duplicate key value violates unique constraint \"idx_invitation_org_email\""
                    .to_string(),
            )));
        }

        let invitation = Invitation {
            id: Uuid::new_v4().to_string(),
            organization_id: create.organization_id,
            email: create.email,
            role: create.role,
            status: InvitationStatus::Pending,
            inviter_id: create.inviter_id,
            expires_at: create.expires_at,
            created_at: Utc::now(),
        };

        tables
            .invitations
            .insert(invitation.id.clone(), invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation_by_id(&self, id: &str) -> Result<Option<Invitation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.invitations.get(id).cloned())
    }

    async fn get_invitation_for_email(
        &self,
        organization_id: &str,
        email: &str,
    ) -> Result<Option<Invitation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .invitations
            .values()
            .find(|i| i.organization_id == organization_id && i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn refresh_invitation(
        &self,
        id: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation> {
        let mut tables = self.tables.lock().unwrap();
        let invitation = tables
            .invitations
            .get_mut(id)
            .ok_or_else(|| Error::not_found("Invitation not found"))?;
        invitation.role = role;
        invitation.expires_at = expires_at;
        invitation.status = InvitationStatus::Pending;
        Ok(invitation.clone())
    }

    async fn accept_invitation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<(Invitation, Option<Membership>)> {
        let mut tables = self.tables.lock().unwrap();

        let invitation = tables
            .invitations
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("Invitation not found"))?;

        let existing = tables
            .memberships
            .values()
            .any(|m| m.organization_id == invitation.organization_id && m.user_id == user_id);

        let membership = if existing {
            None
        } else {
            let create =
                CreateMembership::new(&invitation.organization_id, user_id, invitation.role);
            Some(tables.insert_membership(&create)?)
        };

        let invitation = tables
            .invitations
            .get_mut(id)
            .expect("invitation row checked above");
        invitation.status = InvitationStatus::Accepted;
        Ok((invitation.clone(), membership))
    }

    async fn delete_invitation(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.invitations.remove(id);
        Ok(())
    }

    async fn list_organization_invitations(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Invitation>> {
        let tables = self.tables.lock().unwrap();
        let mut invitations: Vec<Invitation> = tables
            .invitations
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(invitations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser::new(email).with_name("Test"))
            .await
            .unwrap()
    }

    async fn seed_org(store: &MemoryStore, owner: &User) -> Organization {
        let (org, _) = store
            .create_organization_with_owner(
                CreateOrganization::new("Acme", "acme"),
                &owner.id,
            )
            .await
            .unwrap();
        org
    }

    #[tokio::test]
    async fn duplicate_membership_is_a_constraint_violation() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "owner@test.com").await;
        let user = seed_user(&store, "user@test.com").await;
        let org = seed_org(&store, &owner).await;

        store
            .create_membership(CreateMembership::new(&org.id, &user.id, Role::Member))
            .await
            .unwrap();
        let err = store
            .create_membership(CreateMembership::new(&org.id, &user.id, Role::Member))
            .await
            .unwrap_err();

        match err {
            Error::Database(db) => assert!(db.is_constraint_violation()),
            other => panic!("expected constraint violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_owner_is_a_constraint_violation() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "owner@test.com").await;
        let user = seed_user(&store, "user@test.com").await;
        let org = seed_org(&store, &owner).await;

        let err = store
            .create_membership(CreateMembership::new(&org.id, &user.id, Role::Owner))
            .await
            .unwrap_err();
        match err {
            Error::Database(db) => assert!(db.is_constraint_violation()),
            other => panic!("expected constraint violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_owner_insert_rolls_back_the_organization() {
        let store = MemoryStore::new();

        // Unknown owner id trips the user foreign key, so the organization
        // insert must be rolled back.
        let err = store
            .create_organization_with_owner(
                CreateOrganization {
                    id: Some("org-1".to_string()),
                    name: "Ghost Org".to_string(),
                    slug: "ghost-org".to_string(),
                },
                "no-such-user",
            )
            .await;
        assert!(err.is_err());
        assert!(
            store
                .get_organization_by_id("org-1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_invitation_is_a_constraint_violation() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "owner@test.com").await;
        let org = seed_org(&store, &owner).await;

        let create = CreateInvitation {
            organization_id: org.id.clone(),
            email: "new@test.com".to_string(),
            role: Role::Member,
            inviter_id: owner.id.clone(),
            expires_at: Utc::now() + chrono::Duration::days(7),
        };
        store.create_invitation(create.clone()).await.unwrap();

        // Same address in a different case still collides.
        let err = store
            .create_invitation(CreateInvitation {
                email: "NEW@test.com".to_string(),
                ..create
            })
            .await
            .unwrap_err();
        match err {
            Error::Database(db) => assert!(db.is_constraint_violation()),
            other => panic!("expected constraint violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accept_absorbs_existing_membership() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "owner@test.com").await;
        let org = seed_org(&store, &owner).await;

        let invitation = store
            .create_invitation(CreateInvitation {
                organization_id: org.id.clone(),
                email: "owner@test.com".to_string(),
                role: Role::Member,
                inviter_id: owner.id.clone(),
                expires_at: Utc::now() + chrono::Duration::days(7),
            })
            .await
            .unwrap();

        // The owner already has a membership; accept flips status only.
        let (accepted, membership) = store
            .accept_invitation(&invitation.id, &owner.id)
            .await
            .unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert!(membership.is_none());
    }
}
