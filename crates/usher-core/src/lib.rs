//! # usher-core
//!
//! Core abstractions for the usher organization membership service:
//! domain types, error taxonomy, configuration, and the persistence
//! store traits with in-memory and Postgres adapters.

pub mod config;
pub mod email;
pub mod error;
pub mod identity;
pub mod logger;
pub mod session;
pub mod store;
pub mod tenancy;

pub use config::{AppConfig, InvitationConfig, SessionConfig};
pub use email::{ConsoleEmailProvider, EmailProvider};
pub use error::{DatabaseError, Error, Result};
pub use identity::{CreateSession, CreateUser, CreateVerification, Session, User, Verification};
pub use logger::{Logger, TracingLogger};
pub use session::SessionLookup;
pub use store::{
    InvitationStore, MembershipStore, MemoryStore, OrganizationStore, SessionStore, Store,
    UserStore, VerificationStore,
};
#[cfg(feature = "postgres")]
pub use store::{PgStore, PoolConfig};
pub use tenancy::{
    CreateInvitation, CreateMembership, CreateOrganization, Invitation, InvitationStatus,
    Membership, Organization, Role, slugify,
};
