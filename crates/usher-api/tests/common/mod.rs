//! Shared test harness: an [`AppState`] over the in-memory store with a
//! recording mailer, plus seeding helpers for users, organizations, and
//! invitations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use usher_api::mailer::{RecordingMailer, SentEmail};
use usher_api::org::handlers::{invitation, org};
use usher_api::org::types::{
    CreateOrganizationRequest, CreateOrganizationResponse, InviteMemberRequest, InviteReceipt,
};
use usher_api::state::AppState;
use usher_core::{
    AppConfig, CreateInvitation, CreateUser, Invitation, InvitationStore, MemoryStore, Result,
    Role, User, UserStore,
};

static EMAIL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique email address, avoiding hard-coded collisions.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}@test.com")
}

pub struct TestHarness {
    pub state: AppState<MemoryStore>,
    outbox: Arc<Mutex<Vec<SentEmail>>>,
}

#[allow(dead_code)]
impl TestHarness {
    pub fn new() -> Self {
        let mailer = RecordingMailer::new();
        let outbox = mailer.outbox();
        let state = AppState::new(
            AppConfig::new().base_url("http://localhost:3000"),
            MemoryStore::new(),
        )
        .with_mailer(Arc::new(mailer));
        Self { state, outbox }
    }

    /// Seed a verified user, standing in for the auth provider's sign-up.
    pub async fn create_user(&self, email: &str) -> User {
        self.state
            .store
            .create_user(
                CreateUser::new(email)
                    .with_name("Test User")
                    .with_email_verified(true),
            )
            .await
            .expect("user creation should succeed")
    }

    /// Create an organization owned by `creator`.
    pub async fn create_org(&self, creator: &User, name: &str) -> CreateOrganizationResponse {
        org::create_organization_core(
            &CreateOrganizationRequest { name: name.into() },
            creator,
            &self.state,
        )
        .await
        .expect("organization creation should succeed")
    }

    /// Invite `email` into the organization as `role`, as `requester`.
    pub async fn invite(
        &self,
        requester: &User,
        organization_id: &str,
        email: &str,
        role: Role,
    ) -> Result<InviteReceipt> {
        invitation::invite_member_core(
            &InviteMemberRequest {
                organization_id: organization_id.to_string(),
                email: email.to_string(),
                role,
            },
            requester,
            &self.state,
        )
        .await
    }

    /// Insert an invitation row directly, bypassing the invite operation.
    /// Used to stage expired or oddly-cased rows.
    pub async fn seed_invitation(
        &self,
        organization_id: &str,
        email: &str,
        role: Role,
        inviter: &User,
        expires_at: chrono::DateTime<Utc>,
    ) -> Invitation {
        self.state
            .store
            .create_invitation(CreateInvitation {
                organization_id: organization_id.to_string(),
                email: email.to_string(),
                role,
                inviter_id: inviter.id.clone(),
                expires_at,
            })
            .await
            .expect("invitation seed should succeed")
    }

    /// Emails the recording mailer has captured so far.
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.outbox.lock().unwrap().clone()
    }
}
