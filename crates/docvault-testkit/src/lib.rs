//! # docvault Testkit
//!
//! Testing utilities for docvault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: test users with real RSA keypairs and a vault over an
//!   in-memory store
//! - **Generators**: proptest strategies for permissions, flags, names, and
//!   grant rows
//!
//! ## Fixtures
//!
//! ```rust,no_run
//! use docvault_testkit::{TestUser, VaultFixture};
//!
//! async fn example() {
//!     let alice = TestUser::new("alice");
//!     let fixture = VaultFixture::with_users(&[&alice]).await;
//!     // fixture.vault is ready for uploads
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docvault_testkit::generators::arb_grant;
//!
//! proptest! {
//!     #[test]
//!     fn expired_grants_confer_nothing(grant in arb_grant()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{test_users, TestUser, VaultFixture};
pub use generators::{
    arb_document_name, arb_grant, arb_grantee, arb_permission, arb_permission_set,
    arb_security_flags, arb_user_name,
};
