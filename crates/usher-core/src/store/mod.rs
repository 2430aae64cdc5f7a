mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod traits;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PoolConfig};
pub use traits::{
    InvitationStore, MembershipStore, OrganizationStore, SessionStore, UserStore,
    VerificationStore,
};

/// Combined persistence trait.
///
/// Any type implementing all entity-specific store traits implements `Store`
/// via the blanket impl. Use the sub-traits directly when an operation only
/// needs a subset.
pub trait Store:
    UserStore
    + SessionStore
    + VerificationStore
    + OrganizationStore
    + MembershipStore
    + InvitationStore
{
}

impl<T> Store for T where
    T: UserStore
        + SessionStore
        + VerificationStore
        + OrganizationStore
        + MembershipStore
        + InvitationStore
{
}
