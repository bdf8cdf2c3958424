//! Account lifecycle: registration, credential verification, profiles.
//!
//! Password hashing sits behind the [`CredentialHasher`] seam -- this
//! layer never sees hash parameters, only opaque hash strings. Token
//! issuance (the session cookie) is the API boundary's concern, not
//! this service's.

use std::sync::Arc;

use pulse_types::{User, UserId};
use tracing::info;

use crate::error::CoreError;
use crate::repo::{IdentityRepo, ProfilePatch};

/// The credential hashing boundary.
///
/// Implementations wrap a real password hash (the server uses Argon2id);
/// tests may substitute a transparent fake. Verification failures are a
/// plain `false` -- the distinction between "wrong password" and
/// "malformed hash" is deliberately not surfaced.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into an opaque, self-describing string.
    fn hash(&self, password: &str) -> Result<String, CoreError>;

    /// Verify a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// The account service: registration, login verification, and profile
/// reads/updates over the identity store.
#[derive(Clone)]
pub struct AccountService {
    identities: Arc<dyn IdentityRepo>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    /// Build the service over its store and hasher.
    pub fn new(identities: Arc<dyn IdentityRepo>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { identities, hasher }
    }

    /// Register a new account. All three fields are required; the email
    /// must not already be registered.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, CoreError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(CoreError::Validation("All fields are required".to_owned()));
        }
        if self.identities.find_by_email(email).await?.is_some() {
            return Err(CoreError::Validation("Email already in use".to_owned()));
        }

        let password_hash = self.hasher.hash(password)?;
        let user = User::new(username.trim().to_owned(), email.trim().to_owned(), password_hash);
        let id = user.id;
        self.identities.insert_user(&user).await?;
        info!(user = %id, "account created");
        Ok(id)
    }

    /// Verify login credentials, returning the account on success.
    ///
    /// A missing account and a wrong password produce the same error so
    /// the response never confirms whether an email is registered.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, CoreError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "Email and password are required".to_owned(),
            ));
        }

        let invalid = || CoreError::Unauthenticated("Invalid email or password".to_owned());
        let user = self
            .identities
            .find_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if self.hasher.verify(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(invalid())
        }
    }

    /// Fetch a profile by id.
    pub async fn profile(&self, id: UserId) -> Result<User, CoreError> {
        self.identities
            .fetch_user(id)
            .await?
            .ok_or_else(|| CoreError::NotFound("User not found".to_owned()))
    }

    /// Apply a partial profile update and return the updated record.
    pub async fn edit_profile(&self, id: UserId, patch: ProfilePatch) -> Result<User, CoreError> {
        self.identities
            .update_profile(id, patch)
            .await?
            .ok_or_else(|| CoreError::NotFound("User not found".to_owned()))
    }

    /// Every account except the requester's, for the suggestion rail.
    pub async fn suggested(&self, requester: UserId) -> Result<Vec<User>, CoreError> {
        self.identities.suggested_users(requester).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
