//! Sign-in with optional auto-registration of unknown usernames.

use super::credentials::{hash_password, verify_password, CredentialError};
use crate::store::{BookingStore, StoreError};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignInPolicy {
    /// Unknown usernames get an account on their first sign-in.
    pub auto_register: bool,
}

impl Default for SignInPolicy {
    fn default() -> Self {
        SignInPolicy { auto_register: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn { user_id: i64 },
    Registered { user_id: i64 },
    Rejected,
}

#[derive(Error, Debug)]
pub enum SignInError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Authenticate `username`, creating the account when it is unknown and the policy allows it.
/// Hashing runs on the blocking pool.
pub async fn find_or_create_user(
    store: &dyn BookingStore,
    policy: SignInPolicy,
    username: &str,
    password: &str,
) -> Result<SignInOutcome, SignInError> {
    if let Some(user) = store.find_user(username).await? {
        let (supplied, stored) = (password.to_string(), user.password);
        let ok = tokio::task::spawn_blocking(move || verify_password(&supplied, &stored)).await??;
        return Ok(if ok {
            SignInOutcome::SignedIn { user_id: user.id }
        } else {
            SignInOutcome::Rejected
        });
    }

    if !policy.auto_register {
        return Ok(SignInOutcome::Rejected);
    }

    let supplied = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&supplied)).await??;
    let user_id = store.create_user(username, &hash).await?;
    tracing::info!(user_id, "registered new user");
    Ok(SignInOutcome::Registered { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn unknown_user_is_registered_with_hashed_password() {
        let store = MemoryStore::new();
        let outcome = find_or_create_user(&store, SignInPolicy::default(), "alice", "pw").await.unwrap();
        assert!(matches!(outcome, SignInOutcome::Registered { .. }));
        let users = store.users();
        assert_eq!(users.len(), 1);
        assert_ne!(users[0].password, "pw");
    }

    #[tokio::test]
    async fn known_user_signs_in_or_is_rejected() {
        let store = MemoryStore::new();
        find_or_create_user(&store, SignInPolicy::default(), "alice", "pw").await.unwrap();
        let ok = find_or_create_user(&store, SignInPolicy::default(), "alice", "pw").await.unwrap();
        assert!(matches!(ok, SignInOutcome::SignedIn { .. }));
        let bad = find_or_create_user(&store, SignInPolicy::default(), "alice", "nope").await.unwrap();
        assert_eq!(bad, SignInOutcome::Rejected);
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn registration_can_be_switched_off() {
        let store = MemoryStore::new();
        let policy = SignInPolicy { auto_register: false };
        let outcome = find_or_create_user(&store, policy, "mallory", "pw").await.unwrap();
        assert_eq!(outcome, SignInOutcome::Rejected);
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn legacy_cleartext_account_signs_in() {
        let store = MemoryStore::new();
        store.create_user("bob", "plain").await.unwrap();
        let outcome = find_or_create_user(&store, SignInPolicy::default(), "bob", "plain").await.unwrap();
        assert!(matches!(outcome, SignInOutcome::SignedIn { .. }));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_an_error_not_a_rejection() {
        let store = MemoryStore::new();
        store.create_user("carol", "$argon2id$v=x$m=19456,t=2,p=1$!!!!$!!!!").await.unwrap();
        let err = find_or_create_user(&store, SignInPolicy::default(), "carol", "pw").await.unwrap_err();
        assert!(matches!(err, SignInError::Credential(_)));
    }
}
