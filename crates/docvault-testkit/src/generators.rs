//! Proptest strategies for docvault value types.
//!
//! Use these to property-test permission and flag handling without writing
//! bespoke generators in every crate.

use proptest::prelude::*;

use docvault_core::{DocumentName, Grantee, SecurityFlag, SecurityFlags, UserName};
use docvault_perms::{Grant, Permission, PermissionSet};

/// Any single permission.
pub fn arb_permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(Permission::ALL.to_vec())
}

/// Any permission set, including the empty one.
pub fn arb_permission_set() -> impl Strategy<Value = PermissionSet> {
    prop::collection::vec(arb_permission(), 0..4)
        .prop_map(|perms| perms.into_iter().collect())
}

/// Any flag combination.
pub fn arb_security_flags() -> impl Strategy<Value = SecurityFlags> {
    prop::collection::vec(
        prop::sample::select(vec![SecurityFlag::Confidentiality, SecurityFlag::Integrity]),
        0..3,
    )
    .prop_map(|flags| flags.into_iter().collect())
}

/// Printable document names.
pub fn arb_document_name() -> impl Strategy<Value = DocumentName> {
    "[a-z][a-z0-9_.-]{0,24}".prop_map(DocumentName::new)
}

/// Printable user names, never the wildcard key.
pub fn arb_user_name() -> impl Strategy<Value = UserName> {
    "[a-z][a-z0-9]{0,16}".prop_map(UserName::new)
}

/// A named or wildcard grantee.
pub fn arb_grantee() -> impl Strategy<Value = Grantee> {
    prop_oneof![
        4 => arb_user_name().prop_map(Grantee::User),
        1 => Just(Grantee::AllUsers),
    ]
}

/// A grant row with an arbitrary expiry and propagation flag.
pub fn arb_grant() -> impl Strategy<Value = Grant> {
    (
        arb_document_name(),
        arb_grantee(),
        arb_permission(),
        prop::option::of(0i64..2_000_000_000_000),
        any::<bool>(),
    )
        .prop_map(|(document, grantee, permission, expires_at, can_propagate)| Grant {
            document,
            grantee,
            permission,
            expires_at,
            can_propagate,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_perms::{effective_permissions, valid_permissions_to_propagate};

    proptest! {
        // Validity only ever decays: a grant valid at a later instant was
        // valid at every earlier one.
        #[test]
        fn grant_validity_is_monotone(grant in arb_grant(), t1 in 0i64..1_000_000, dt in 0i64..1_000_000) {
            let t2 = t1 + dt;
            if grant.is_valid(t2) {
                prop_assert!(grant.is_valid(t1));
            }
        }

        // Whatever a grant set confers, it confers through some member that
        // dominates the conferred right.
        #[test]
        fn effective_permissions_backed_by_a_grant(
            grants in prop::collection::vec(arb_grant(), 0..8),
            now in 0i64..1_000_000,
        ) {
            let perms = effective_permissions(&grants, now);
            if perms.implies_read() {
                prop_assert!(grants.iter().any(|g| g.is_valid(now) && g.permission.implies_read()));
            }
            if perms.implies_write() {
                prop_assert!(grants.iter().any(|g| g.is_valid(now) && g.permission.implies_write()));
            }
        }

        // The propagation rule is exactly the dominance up-set.
        #[test]
        fn propagation_set_matches_dominance(requested in arb_permission(), holder in arb_permission()) {
            let valid_set = valid_permissions_to_propagate(requested);
            prop_assert_eq!(valid_set.contains(holder), holder.dominates(requested));
        }

        // Grantee storage keys decode back to the same grantee.
        #[test]
        fn grantee_key_roundtrip(grantee in arb_grantee()) {
            prop_assert_eq!(Grantee::from_key(grantee.as_key()), grantee);
        }
    }
}
