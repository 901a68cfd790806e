//! # docvault Permissions
//!
//! The permission lattice and delegation engine.
//!
//! ## Overview
//!
//! Access to a document is the union of its currently valid grant rows.
//! A grant binds a [`Permission`] to a (document, grantee) pair, optionally
//! expiring and optionally re-delegable. The engine decides three things:
//!
//! - what an actor may currently do ([`engine::effective_permissions`])
//! - whether an actor may hand a permission down
//!   ([`engine::valid_permissions_to_propagate`], [`engine::can_delegate`])
//! - how long a delegation may last ([`engine::max_delegation_time`],
//!   [`engine::effective_expiry`])
//!
//! ## The lattice
//!
//! `Owner` dominates everything; the historical `Both` variant subsumes
//! `Read` and `Write`. The propagation rule is not a table: it is the up-set
//! of the requested permission under dominance, so adding a variant to the
//! lattice extends delegation automatically.
//!
//! All engine functions are pure over grant rows fetched by the caller;
//! authorization state is never cached here.

pub mod engine;
pub mod error;
pub mod grant;

pub use engine::{
    can_delegate, effective_expiry, effective_permissions, max_delegation_time,
    valid_permissions_to_propagate,
};
pub use error::{PermsError, Result};
pub use grant::{Grant, Permission, PermissionSet};
