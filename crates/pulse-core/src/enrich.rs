//! Display-identity resolution shared by the services.

use pulse_types::{ActorIdentity, UserId};
use tracing::warn;

use crate::repo::IdentityRepo;

/// Resolve a user's display identity, degrading to the placeholder.
///
/// A missing account or a resolver failure must never abort the parent
/// operation -- the caller gets the "unknown" identity instead.
pub(crate) async fn display_identity(identities: &dyn IdentityRepo, id: UserId) -> ActorIdentity {
    match identities.identity_of(id).await {
        Ok(Some(identity)) => identity,
        Ok(None) => ActorIdentity::unknown(id),
        Err(e) => {
            warn!(user = %id, error = %e, "identity resolution failed, using placeholder");
            ActorIdentity::unknown(id)
        }
    }
}
