//! # usher-api
//!
//! Operation cores and HTTP surface for the usher membership service:
//! the invitation lifecycle, organization bootstrap, membership rules,
//! and the email-verification token flow.

pub mod extractors;
pub mod mailer;
pub mod org;
pub mod router;
pub mod state;
pub mod verification;

pub use extractors::{CurrentSession, ValidatedJson};
pub use mailer::{RecordingMailer, ResendMailer};
pub use router::router;
pub use state::AppState;
