use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::identity::{CreateSession, CreateUser, CreateVerification, Session, User, Verification};
use crate::tenancy::{
    CreateInvitation, CreateMembership, CreateOrganization, Invitation, Membership, Organization,
    Role,
};

use super::traits::{
    InvitationStore, MembershipStore, OrganizationStore, SessionStore, UserStore,
    VerificationStore,
};

/// PostgreSQL store via SQLx.
///
/// Uniqueness is enforced by the schema (see the `usher-migration` crate):
/// unique `(user_id, organization_id)` on memberships, a partial unique
/// owner index per organization, and unique `(organization_id,
/// lower(email))` on invitations. Unique violations surface as
/// `DatabaseError::Constraint` through the `From<sqlx::Error>` conversion.
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: std::time::Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: std::time::Duration::from_secs(30),
        }
    }
}

impl PgStore {
    pub async fn connect(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub async fn connect_with(
        database_url: &str,
        config: PoolConfig,
    ) -> std::result::Result<Self, sqlx::Error> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn test_connection(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ── User operations ──

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, create: CreateUser) -> Result<User> {
        let id = create.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, email_verified, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&create.email)
        .bind(&create.name)
        .bind(create.email_verified)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_email_verified(&self, user_id: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET email_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::error::Error::not_found("User not found"))?;
        Ok(user)
    }
}

// ── Session operations ──

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, create: CreateSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, token, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(format!("session_{}", Uuid::new_v4()))
        .bind(&create.user_id)
        .bind(create.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ── Verification operations ──

#[async_trait]
impl VerificationStore for PgStore {
    async fn create_verification(&self, create: CreateVerification) -> Result<Verification> {
        let verification = sqlx::query_as::<_, Verification>(
            r#"
            INSERT INTO verifications (id, identifier, value, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&create.identifier)
        .bind(&create.value)
        .bind(create.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(verification)
    }

    async fn get_verification(&self, id: &str) -> Result<Option<Verification>> {
        let verification =
            sqlx::query_as::<_, Verification>("SELECT * FROM verifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(verification)
    }

    async fn delete_verification(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM verifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ── Organization operations ──

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization_with_owner(
        &self,
        create: CreateOrganization,
        owner_user_id: &str,
    ) -> Result<(Organization, Membership)> {
        let mut tx = self.pool.begin().await?;

        let org_id = create.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, slug, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&org_id)
        .bind(&create.name)
        .bind(&create.slug)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, organization_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&org_id)
        .bind(owner_user_id)
        .bind(Role::Owner.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((organization, membership))
    }

    async fn get_organization_by_id(&self, id: &str) -> Result<Option<Organization>> {
        let organization =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(organization)
    }

    async fn list_user_organizations(&self, user_id: &str) -> Result<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.* FROM organizations o
            JOIN memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(organizations)
    }
}

// ── Membership operations ──

#[async_trait]
impl MembershipStore for PgStore {
    async fn create_membership(&self, create: CreateMembership) -> Result<Membership> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, organization_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&create.organization_id)
        .bind(&create.user_id)
        .bind(create.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn get_membership(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn get_membership_by_id(&self, id: &str) -> Result<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>("SELECT * FROM memberships WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(membership)
    }

    async fn delete_membership(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_organization_members(&self, organization_id: &str) -> Result<Vec<Membership>> {
        let members = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE organization_id = $1 ORDER BY created_at",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn count_organization_owners(&self, organization_id: &str) -> Result<usize> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memberships WHERE organization_id = $1 AND role = 'owner'",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as usize)
    }
}

// ── Invitation operations ──

#[async_trait]
impl InvitationStore for PgStore {
    async fn create_invitation(&self, create: CreateInvitation) -> Result<Invitation> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations
                (id, organization_id, email, role, status, inviter_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&create.organization_id)
        .bind(&create.email)
        .bind(create.role.as_str())
        .bind(&create.inviter_id)
        .bind(create.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(invitation)
    }

    async fn get_invitation_by_id(&self, id: &str) -> Result<Option<Invitation>> {
        let invitation = sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invitation)
    }

    async fn get_invitation_for_email(
        &self,
        organization_id: &str,
        email: &str,
    ) -> Result<Option<Invitation>> {
        let invitation = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE organization_id = $1 AND lower(email) = lower($2)",
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    async fn refresh_invitation(
        &self,
        id: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET role = $2, expires_at = $3, status = 'pending'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::error::Error::not_found("Invitation not found"))?;
        Ok(invitation)
    }

    async fn accept_invitation(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<(Invitation, Option<Membership>)> {
        let mut tx = self.pool.begin().await?;

        let invitation =
            sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| crate::error::Error::not_found("Invitation not found"))?;

        // An existing membership for (user, organization) is absorbed: the
        // unique index swallows the insert and only the status flips.
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, organization_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, organization_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&invitation.organization_id)
        .bind(user_id)
        .bind(invitation.role.as_str())
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let invitation = sqlx::query_as::<_, Invitation>(
            "UPDATE invitations SET status = 'accepted' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((invitation, membership))
    }

    async fn delete_invitation(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_organization_invitations(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Invitation>> {
        let invitations = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE organization_id = $1 ORDER BY created_at",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }
}
