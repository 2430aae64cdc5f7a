//! Email-verification token consumption.
//!
//! Tokens are minted at sign-up by the auth provider; this flow consumes
//! them exactly once. The token row is deleted whether it was used
//! successfully, found expired, or hit an already-verified account.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use usher_core::{Error, Result, Store};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "alreadyVerified", skip_serializing_if = "Option::is_none")]
    pub already_verified: Option<bool>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

pub async fn verify_email_core<S: Store>(
    token: &str,
    state: &AppState<S>,
) -> Result<VerifyEmailResponse> {
    if token.is_empty() {
        return Err(Error::invalid_request("Verification token is required"));
    }

    let verification = state
        .store
        .get_verification(token)
        .await?
        .ok_or_else(|| Error::invalid_request("Invalid or expired verification token"))?;

    if verification.is_expired() {
        state.store.delete_verification(&verification.id).await?;
        return Err(Error::invalid_request(
            "Verification token has expired. Please request a new one.",
        ));
    }

    let user = state
        .store
        .get_user_by_email(&verification.identifier)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    if user.email_verified {
        state.store.delete_verification(&verification.id).await?;
        return Ok(VerifyEmailResponse {
            success: true,
            message: "Email is already verified".to_string(),
            already_verified: Some(true),
        });
    }

    state.store.set_email_verified(&user.id).await?;
    state.store.delete_verification(&verification.id).await?;

    state
        .config
        .logger
        .info(&format!("email verified for user {}", user.id));

    Ok(VerifyEmailResponse {
        success: true,
        message: "Email verified successfully".to_string(),
        already_verified: None,
    })
}

// ---------------------------------------------------------------------------
// Axum handler
// ---------------------------------------------------------------------------

pub async fn handle_verify_email<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<VerifyEmailResponse>> {
    let response = verify_email_core(&query.token, &state).await?;
    Ok(Json(response))
}
