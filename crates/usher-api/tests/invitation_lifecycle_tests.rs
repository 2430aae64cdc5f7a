//! Invitation lifecycle tests: creation, re-invite upserts, acceptance
//! state machine, expiry cleanup, and the email-mismatch guard.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use common::{TestHarness, unique_email};
use usher_api::org::handlers::invitation::{
    accept_invitation_core, get_invitation_core, invite_member_core,
};
use usher_api::org::types::{AcceptInvitationRequest, InviteMemberRequest, InviteOutcome};
use usher_api::state::AppState;
use usher_core::{
    AppConfig, EmailProvider, Error, InvitationStatus, InvitationStore, MembershipStore,
    MemoryStore, Role, UserStore,
};

#[tokio::test]
async fn inviting_new_email_creates_pending_invitation_and_sends_email() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee = unique_email("new");

    let receipt = h
        .invite(&owner, &org.organization.id, &invitee, Role::Member)
        .await
        .unwrap();

    let invitation = match receipt.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };
    assert_eq!(invitation.email, invitee);
    assert_eq!(invitation.role, Role::Member);
    assert_eq!(invitation.status, InvitationStatus::Pending);

    // Expiry is reset to roughly seven days out.
    let lifetime = invitation.expires_at - Utc::now();
    assert!(lifetime > Duration::days(6) && lifetime <= Duration::days(7));

    assert_eq!(receipt.email_sent, Some(true));
    assert_eq!(receipt.email_error, None);

    let emails = h.sent_emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, invitee);
    let link = format!("http://localhost:3000/invite/{}", invitation.id);
    assert!(emails[0].html.contains(&link), "email should embed {link}");
}

#[tokio::test]
async fn invited_address_signs_up_and_accepts() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee_email = unique_email("new");

    let receipt = h
        .invite(&owner, &org.organization.id, &invitee_email, Role::Member)
        .await
        .unwrap();
    let invitation = match receipt.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };

    // The recipient signs up under the invited address and follows the link.
    let invitee = h.create_user(&invitee_email).await;
    let response = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id.clone(),
        },
        &invitee,
        &h.state,
    )
    .await
    .unwrap();

    assert_eq!(response.invitation.status, InvitationStatus::Accepted);
    assert!(!response.already_member);
    let member = response.member.expect("membership should be created");
    assert_eq!(member.user_id, invitee.id);
    assert_eq!(member.role, Role::Member);

    let membership = h
        .state
        .store
        .get_membership(&org.organization.id, &invitee.id)
        .await
        .unwrap()
        .expect("membership row should exist");
    assert_eq!(membership.role, Role::Member);
}

#[tokio::test]
async fn inviting_existing_user_adds_membership_directly() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let existing = h.create_user(&unique_email("existing")).await;
    let org = h.create_org(&owner, "Acme").await;

    let receipt = h
        .invite(&owner, &org.organization.id, &existing.email, Role::Member)
        .await
        .unwrap();

    assert!(matches!(receipt.outcome, InviteOutcome::MemberAdded(_)));
    assert!(
        h.state
            .store
            .get_membership(&org.organization.id, &existing.id)
            .await
            .unwrap()
            .is_some()
    );

    // No invitation row and no email for the fast path.
    assert!(
        h.state
            .store
            .get_invitation_for_email(&org.organization.id, &existing.email)
            .await
            .unwrap()
            .is_none()
    );
    assert!(h.sent_emails().is_empty());
}

#[tokio::test]
async fn reinviting_existing_member_is_idempotent() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let existing = h.create_user(&unique_email("existing")).await;
    let org = h.create_org(&owner, "Acme").await;

    h.invite(&owner, &org.organization.id, &existing.email, Role::Member)
        .await
        .unwrap();
    let second = h
        .invite(&owner, &org.organization.id, &existing.email, Role::Member)
        .await
        .unwrap();

    assert!(matches!(second.outcome, InviteOutcome::AlreadyMember));
    let members = h
        .state
        .store
        .list_organization_members(&org.organization.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2, "owner + the one member, no duplicates");
}

#[tokio::test]
async fn reinvite_updates_the_single_invitation_row() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee = unique_email("new");

    let first = h
        .invite(&owner, &org.organization.id, &invitee, Role::Member)
        .await
        .unwrap();
    let first_inv = match first.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };

    let second = h
        .invite(&owner, &org.organization.id, &invitee, Role::Member)
        .await
        .unwrap();
    let second_inv = match second.outcome {
        InviteOutcome::InvitationUpdated(inv) => inv,
        other => panic!("expected InvitationUpdated, got {other:?}"),
    };

    // Same row, refreshed offer.
    assert_eq!(first_inv.id, second_inv.id);
    assert!(second_inv.expires_at >= first_inv.expires_at);
    assert_eq!(second_inv.status, InvitationStatus::Pending);

    let rows = h
        .state
        .store
        .list_organization_invitations(&org.organization.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    // Both attempts emailed the recipient.
    assert_eq!(h.sent_emails().len(), 2);
}

#[tokio::test]
async fn second_owner_invite_is_rejected_with_no_row() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee = unique_email("wouldbe-owner");

    let err = h
        .invite(&owner, &org.organization.id, &invitee, Role::Owner)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    assert!(
        h.state
            .store
            .get_invitation_for_email(&org.organization.id, &invitee)
            .await
            .unwrap()
            .is_none()
    );
    assert!(h.sent_emails().is_empty());
}

#[tokio::test]
async fn non_owner_cannot_invite() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let member = h.create_user(&unique_email("member")).await;
    let outsider = h.create_user(&unique_email("outsider")).await;
    let org = h.create_org(&owner, "Acme").await;
    h.invite(&owner, &org.organization.id, &member.email, Role::Member)
        .await
        .unwrap();

    for requester in [&member, &outsider] {
        let err = h
            .invite(
                requester,
                &org.organization.id,
                &unique_email("target"),
                Role::Member,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    let rows = h
        .state
        .store
        .list_organization_invitations(&org.organization.id)
        .await
        .unwrap();
    assert!(rows.is_empty(), "rejected invites must not write rows");
}

#[tokio::test]
async fn expired_invitation_is_deleted_on_accept() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee_email = unique_email("late");
    let invitee = h.create_user(&invitee_email).await;

    let invitation = h
        .seed_invitation(
            &org.organization.id,
            &invitee_email,
            Role::Member,
            &owner,
            Utc::now() - Duration::hours(1),
        )
        .await;

    let err = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id.clone(),
        },
        &invitee,
        &h.state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvitationExpired));

    // Cleanup-on-read: the row is gone, a retry sees NotFound.
    assert!(
        h.state
            .store
            .get_invitation_by_id(&invitation.id)
            .await
            .unwrap()
            .is_none()
    );
    let err = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id,
        },
        &invitee,
        &h.state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn expired_invitation_is_deleted_on_details_lookup() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;

    let invitation = h
        .seed_invitation(
            &org.organization.id,
            &unique_email("late"),
            Role::Member,
            &owner,
            Utc::now() - Duration::minutes(5),
        )
        .await;

    let err = get_invitation_core(&invitation.id, &h.state).await.unwrap_err();
    assert!(matches!(err, Error::InvitationExpired));

    let err = get_invitation_core(&invitation.id, &h.state).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn invitation_details_project_organization_info() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme Inc").await;
    let invitee = unique_email("new");

    let receipt = h
        .invite(&owner, &org.organization.id, &invitee, Role::Member)
        .await
        .unwrap();
    let invitation = match receipt.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };

    let details = get_invitation_core(&invitation.id, &h.state).await.unwrap();
    assert_eq!(details.invitation.email, invitee);
    assert_eq!(details.organization.name, "Acme Inc");
    assert_eq!(details.organization.slug, "acme-inc");
}

#[tokio::test]
async fn mismatched_email_cannot_accept() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee_email = unique_email("intended");

    let receipt = h
        .invite(&owner, &org.organization.id, &invitee_email, Role::Member)
        .await
        .unwrap();
    let invitation = match receipt.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };

    // A different signed-in identity holding the link is refused.
    let interloper = h.create_user(&unique_email("interloper")).await;
    let err = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id.clone(),
        },
        &interloper,
        &h.state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::EmailMismatch));

    // The invitation stays pending for the intended recipient.
    let row = h
        .state
        .store
        .get_invitation_by_id(&invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, InvitationStatus::Pending);
}

#[tokio::test]
async fn email_match_is_case_insensitive() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;

    let invitee = h.create_user("casey@test.com").await;
    // Remove any membership assumptions: seed a mixed-case invitation row.
    let invitation = h
        .seed_invitation(
            &org.organization.id,
            "Casey@Test.COM",
            Role::Member,
            &owner,
            Utc::now() + Duration::days(7),
        )
        .await;

    let response = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id,
        },
        &invitee,
        &h.state,
    )
    .await
    .unwrap();
    assert!(response.member.is_some());
}

#[tokio::test]
async fn double_accept_returns_already_processed() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let invitee_email = unique_email("new");

    let receipt = h
        .invite(&owner, &org.organization.id, &invitee_email, Role::Member)
        .await
        .unwrap();
    let invitation = match receipt.outcome {
        InviteOutcome::InvitationCreated(inv) => inv,
        other => panic!("expected InvitationCreated, got {other:?}"),
    };

    let invitee = h.create_user(&invitee_email).await;
    let request = AcceptInvitationRequest {
        invitation_id: invitation.id,
    };
    accept_invitation_core(&request, &invitee, &h.state)
        .await
        .unwrap();

    let err = accept_invitation_core(&request, &invitee, &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvitationProcessed));

    let members = h
        .state
        .store
        .list_organization_members(&org.organization.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2, "no duplicate membership");
}

#[tokio::test]
async fn email_failure_is_reported_but_invitation_persists() {
    struct FailingMailer;

    #[async_trait::async_trait]
    impl EmailProvider for FailingMailer {
        async fn send(&self, _: &str, _: &str, _: &str, _: &str) -> usher_core::Result<()> {
            Err(Error::Email("domain not verified".to_string()))
        }
    }

    let state = AppState::new(
        AppConfig::new().base_url("http://localhost:3000"),
        MemoryStore::new(),
    )
    .with_mailer(Arc::new(FailingMailer));

    let owner = state
        .store
        .create_user(usher_core::CreateUser::new("owner@test.com").with_email_verified(true))
        .await
        .unwrap();
    let org = usher_api::org::handlers::org::create_organization_core(
        &usher_api::org::types::CreateOrganizationRequest {
            name: "Acme".into(),
        },
        &owner,
        &state,
    )
    .await
    .unwrap();

    let receipt = invite_member_core(
        &InviteMemberRequest {
            organization_id: org.organization.id.clone(),
            email: "new@test.com".into(),
            role: Role::Member,
        },
        &owner,
        &state,
    )
    .await
    .unwrap();

    // The write survives the failed notification; the caller learns enough
    // to surface a "share this link manually" affordance.
    assert!(matches!(receipt.outcome, InviteOutcome::InvitationCreated(_)));
    assert_eq!(receipt.email_sent, Some(false));
    assert!(receipt.email_error.unwrap().contains("domain not verified"));

    assert!(
        state
            .store
            .get_invitation_for_email(&org.organization.id, "new@test.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn accept_by_existing_member_flips_status_only() {
    let h = TestHarness::new();
    let owner = h.create_user(&unique_email("owner")).await;
    let org = h.create_org(&owner, "Acme").await;
    let user = h.create_user(&unique_email("member")).await;

    // Fast path makes them a member first.
    h.invite(&owner, &org.organization.id, &user.email, Role::Member)
        .await
        .unwrap();

    // A stale invitation for the same address still resolves cleanly.
    let invitation = h
        .seed_invitation(
            &org.organization.id,
            &user.email,
            Role::Member,
            &owner,
            Utc::now() + Duration::days(7),
        )
        .await;

    let response = accept_invitation_core(
        &AcceptInvitationRequest {
            invitation_id: invitation.id,
        },
        &user,
        &h.state,
    )
    .await
    .unwrap();

    assert!(response.already_member);
    assert!(response.member.is_none());
    assert_eq!(response.invitation.status, InvitationStatus::Accepted);
}
