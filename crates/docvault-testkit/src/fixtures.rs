//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: users with real RSA keypairs
//! and a vault over an in-memory store.

use rsa::RsaPrivateKey;

use docvault::{Vault, VaultConfig};
use docvault_core::{Signature, UserName, UserPublicKey};
use docvault_seal::{export_public_key, sign_content, ServerKeyPair};
use docvault_store::MemoryStore;

// 1024-bit keys: test-only, keygen cost dominates the suite otherwise.
const TEST_KEY_BITS: usize = 1024;

/// A test user with an RSA keypair for signing uploads.
pub struct TestUser {
    /// The user's identity.
    pub name: UserName,
    private_key: RsaPrivateKey,
}

impl TestUser {
    /// Create a user with a fresh keypair.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: UserName::new(name),
            private_key: RsaPrivateKey::new(&mut rand::thread_rng(), TEST_KEY_BITS)
                .expect("test key generation failed"),
        }
    }

    /// The registry record of the user's public key.
    pub fn public_key(&self) -> UserPublicKey {
        export_public_key(&self.private_key.to_public_key())
    }

    /// Sign content the way an uploader's client would.
    pub fn sign(&self, content: &[u8]) -> Signature {
        sign_content(&self.private_key, content)
    }
}

/// A vault over an in-memory store, plus the users registered in it.
pub struct VaultFixture {
    /// The vault under test.
    pub vault: Vault<MemoryStore>,
}

impl VaultFixture {
    /// Create a fixture with a fresh server keypair and empty store.
    pub fn new() -> Self {
        let server_keys =
            ServerKeyPair::generate_with_bits(TEST_KEY_BITS).expect("test key generation failed");
        Self {
            vault: Vault::new(server_keys, MemoryStore::new(), VaultConfig::default()),
        }
    }

    /// Register a user's public key with the vault.
    pub async fn register(&self, user: &TestUser) {
        self.vault
            .register_user(&user.name, &user.public_key())
            .await
            .expect("user registration failed");
    }

    /// Create a fixture and register all given users.
    pub async fn with_users(users: &[&TestUser]) -> Self {
        let fixture = Self::new();
        for user in users {
            fixture.register(user).await;
        }
        fixture
    }
}

impl Default for VaultFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create several distinct test users for multi-party tests.
pub fn test_users(count: usize) -> Vec<TestUser> {
    (0..count).map(|i| TestUser::new(format!("user-{}", i))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::{DocumentName, SecurityFlag, SecurityFlags};
    use docvault_seal::verify_content;

    #[test]
    fn test_user_signs_verifiably() {
        let user = TestUser::new("alice");
        let signature = user.sign(b"payload");

        assert!(verify_content(&user.public_key(), b"payload", &signature).unwrap());
        assert!(!verify_content(&user.public_key(), b"tampered", &signature).unwrap());
    }

    #[tokio::test]
    async fn test_fixture_supports_integrity_uploads() {
        let alice = TestUser::new("alice");
        let fixture = VaultFixture::with_users(&[&alice]).await;
        let name = DocumentName::new("doc");

        fixture
            .vault
            .upload(
                &alice.name,
                &name,
                b"body",
                SecurityFlags::from(SecurityFlag::Integrity),
                Some(alice.sign(b"body")),
            )
            .await
            .unwrap();

        let download = fixture.vault.download(&alice.name, &name).await.unwrap();
        assert_eq!(download.content.as_ref(), b"body");
    }

    #[test]
    fn test_multi_party_users_are_distinct() {
        let users = test_users(3);
        assert_eq!(users.len(), 3);
        assert_ne!(users[0].name, users[1].name);
        assert_ne!(users[1].name, users[2].name);
    }
}
