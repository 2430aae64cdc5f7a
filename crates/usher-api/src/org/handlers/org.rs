use axum::Json;
use axum::extract::{Query, State};

use usher_core::{CreateOrganization, Organization, Result, Store, User, slugify};

use super::require_membership;
use crate::extractors::{CurrentSession, ValidatedJson};
use crate::org::types::{
    CreateOrganizationRequest, CreateOrganizationResponse, ListMembersResponse, MemberResponse,
    OrganizationQuery,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

pub async fn create_organization_core<S: Store>(
    body: &CreateOrganizationRequest,
    creator: &User,
    state: &AppState<S>,
) -> Result<CreateOrganizationResponse> {
    let slug = slugify(&body.name);

    // Organization and owner membership land together or not at all; an
    // organization must never exist without exactly one owner.
    let (organization, membership) = state
        .store
        .create_organization_with_owner(
            CreateOrganization {
                id: None,
                name: body.name.clone(),
                slug,
            },
            &creator.id,
        )
        .await?;

    let member = MemberResponse::from_membership_and_user(&membership, creator);

    Ok(CreateOrganizationResponse {
        organization,
        members: vec![member],
    })
}

pub async fn list_organizations_core<S: Store>(
    requester: &User,
    state: &AppState<S>,
) -> Result<Vec<Organization>> {
    state.store.list_user_organizations(&requester.id).await
}

pub async fn list_members_core<S: Store>(
    query: &OrganizationQuery,
    requester: &User,
    state: &AppState<S>,
) -> Result<ListMembersResponse> {
    require_membership(state, &query.organization_id, &requester.id).await?;

    let memberships = state
        .store
        .list_organization_members(&query.organization_id)
        .await?;
    let total = memberships.len();

    let mut members = Vec::with_capacity(total);
    for membership in &memberships {
        if let Some(user) = state.store.get_user_by_id(&membership.user_id).await? {
            members.push(MemberResponse::from_membership_and_user(membership, &user));
        }
    }

    Ok(ListMembersResponse { members, total })
}

pub async fn current_member_core<S: Store>(
    query: &OrganizationQuery,
    requester: &User,
    state: &AppState<S>,
) -> Result<MemberResponse> {
    let membership = require_membership(state, &query.organization_id, &requester.id).await?;
    Ok(MemberResponse::from_membership_and_user(
        &membership,
        requester,
    ))
}

// ---------------------------------------------------------------------------
// Axum handlers
// ---------------------------------------------------------------------------

pub async fn handle_create_organization<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    ValidatedJson(body): ValidatedJson<CreateOrganizationRequest>,
) -> Result<Json<CreateOrganizationResponse>> {
    let response = create_organization_core(&body, &user, &state).await?;
    Ok(Json(response))
}

pub async fn handle_list_organizations<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
) -> Result<Json<Vec<Organization>>> {
    let organizations = list_organizations_core(&user, &state).await?;
    Ok(Json(organizations))
}

pub async fn handle_list_members<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<ListMembersResponse>> {
    let response = list_members_core(&query, &user, &state).await?;
    Ok(Json(response))
}

pub async fn handle_current_member<S: Store>(
    State(state): State<AppState<S>>,
    CurrentSession { user, .. }: CurrentSession,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<MemberResponse>> {
    let response = current_member_core(&query, &user, &state).await?;
    Ok(Json(response))
}
