//! The permission engine: effective rights, delegation validity, and
//! time-limit propagation.
//!
//! Every function here is pure over grant rows the caller has just fetched
//! for one (document, actor) pairing. Effective rights are computed over
//! the actor's rows plus any wildcard rows; delegation authority is
//! computed over whatever rows the caller deems delegation-eligible.
//! Nothing is cached; authorization state lives in the store and is
//! re-queried per operation.

use crate::error::{PermsError, Result};
use crate::grant::{Grant, Permission, PermissionSet};

/// Union of the permissions conferred by all grants valid at `now`.
pub fn effective_permissions(grants: &[Grant], now: i64) -> PermissionSet {
    grants
        .iter()
        .filter(|g| g.is_valid(now))
        .map(|g| g.permission)
        .collect()
}

/// The set of permissions that may propagate `requested` further.
///
/// Derived as the up-set of `requested` under the dominance relation: an
/// actor may hand a permission down iff they hold one that dominates it.
pub fn valid_permissions_to_propagate(requested: Permission) -> PermissionSet {
    Permission::ALL
        .into_iter()
        .filter(|p| p.dominates(requested))
        .collect()
}

/// Whether the actor may delegate using these grants.
///
/// Requires a currently valid grant whose permission is in `valid_set` and
/// whose `can_propagate` flag is set. A grant that merely authorizes use
/// never authorizes re-delegation.
pub fn can_delegate(grants: &[Grant], valid_set: PermissionSet, now: i64) -> bool {
    grants
        .iter()
        .any(|g| g.can_propagate && g.is_valid(now) && valid_set.contains(g.permission))
}

/// The ceiling on how long the actor may delegate for, in milliseconds.
///
/// Over the actor's qualifying grants (permission in `valid_set`, valid at
/// `now`): a permanent grant lifts the ceiling entirely (`None`); otherwise
/// the ceiling is the remaining lifetime of the soonest-expiring grant.
/// No qualifying grant at all is `NoQualifyingGrant`.
pub fn max_delegation_time(
    grants: &[Grant],
    valid_set: PermissionSet,
    now: i64,
) -> Result<Option<i64>> {
    let mut soonest: Option<i64> = None;
    let mut qualified = false;

    for grant in grants
        .iter()
        .filter(|g| g.is_valid(now) && valid_set.contains(g.permission))
    {
        qualified = true;
        match grant.expires_at {
            // A permanent qualifying grant means no limit at all.
            None => return Ok(None),
            Some(expiry) => {
                soonest = Some(match soonest {
                    None => expiry,
                    Some(current) => current.min(expiry),
                });
            }
        }
    }

    match (qualified, soonest) {
        (false, _) => Err(PermsError::NoQualifyingGrant),
        (true, Some(expiry)) => Ok(Some(expiry - now)),
        // Unreachable: a qualifying grant either returned early or set `soonest`.
        (true, None) => Ok(None),
    }
}

/// The expiry to persist for a new delegation.
///
/// The system-computed ceiling always dominates the caller-supplied value:
/// the effective lifetime is `min(requested, system_max)` with absent bounds
/// dropping out. Both absent means a permanent grant.
pub fn effective_expiry(
    requested_millis: Option<i64>,
    system_max_millis: Option<i64>,
    now: i64,
) -> Option<i64> {
    let lifetime = match (requested_millis, system_max_millis) {
        (None, None) => return None,
        (Some(requested), None) => requested,
        (None, Some(max)) => max,
        (Some(requested), Some(max)) => requested.min(max),
    };
    Some(now + lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::{DocumentName, Grantee, UserName};

    fn grant(permission: Permission, expires_at: Option<i64>, can_propagate: bool) -> Grant {
        Grant {
            document: DocumentName::new("doc"),
            grantee: Grantee::User(UserName::new("alice")),
            permission,
            expires_at,
            can_propagate,
        }
    }

    #[test]
    fn test_effective_permissions_union() {
        let grants = vec![
            grant(Permission::Read, None, false),
            grant(Permission::Write, Some(2_000), true),
        ];

        let perms = effective_permissions(&grants, 1_000);
        assert!(perms.implies_read());
        assert!(perms.implies_write());

        // The timed write grant has lapsed
        let perms = effective_permissions(&grants, 3_000);
        assert!(perms.implies_read());
        assert!(!perms.implies_write());
    }

    #[test]
    fn test_propagation_set_is_dominance_up_set() {
        let read = valid_permissions_to_propagate(Permission::Read);
        assert!(read.contains(Permission::Read));
        assert!(read.contains(Permission::Both));
        assert!(read.contains(Permission::Owner));
        assert!(!read.contains(Permission::Write));

        let write = valid_permissions_to_propagate(Permission::Write);
        assert!(write.contains(Permission::Write));
        assert!(write.contains(Permission::Both));
        assert!(write.contains(Permission::Owner));
        assert!(!write.contains(Permission::Read));

        let owner = valid_permissions_to_propagate(Permission::Owner);
        assert_eq!(owner.iter().collect::<Vec<_>>(), vec![Permission::Owner]);
    }

    #[test]
    fn test_can_delegate_requires_propagate_flag() {
        let valid_set = valid_permissions_to_propagate(Permission::Read);

        let usable_only = vec![grant(Permission::Read, None, false)];
        assert!(!can_delegate(&usable_only, valid_set, 0));

        let delegable = vec![grant(Permission::Read, None, true)];
        assert!(can_delegate(&delegable, valid_set, 0));
    }

    #[test]
    fn test_can_delegate_ignores_expired_grants() {
        let valid_set = valid_permissions_to_propagate(Permission::Read);
        let grants = vec![grant(Permission::Owner, Some(500), true)];

        assert!(can_delegate(&grants, valid_set, 499));
        assert!(!can_delegate(&grants, valid_set, 500));
    }

    #[test]
    fn test_max_delegation_time_permanent_wins() {
        let valid_set = valid_permissions_to_propagate(Permission::Read);
        let grants = vec![
            grant(Permission::Read, Some(5_000), true),
            grant(Permission::Owner, None, true),
        ];

        assert_eq!(max_delegation_time(&grants, valid_set, 1_000).unwrap(), None);
    }

    #[test]
    fn test_max_delegation_time_soonest_expiry() {
        let valid_set = valid_permissions_to_propagate(Permission::Read);
        let grants = vec![
            grant(Permission::Read, Some(9_000), true),
            grant(Permission::Both, Some(4_000), true),
        ];

        assert_eq!(
            max_delegation_time(&grants, valid_set, 1_000).unwrap(),
            Some(3_000)
        );
    }

    #[test]
    fn test_max_delegation_time_no_qualifying_grant() {
        let valid_set = valid_permissions_to_propagate(Permission::Write);
        let grants = vec![grant(Permission::Read, None, true)];

        assert!(matches!(
            max_delegation_time(&grants, valid_set, 0),
            Err(PermsError::NoQualifyingGrant)
        ));
    }

    #[test]
    fn test_effective_expiry_system_ceiling_dominates() {
        // Caller asks for longer than the system allows: clamped.
        assert_eq!(effective_expiry(Some(10_000), Some(2_000), 100), Some(2_100));

        // Caller asks for less: honored.
        assert_eq!(effective_expiry(Some(1_000), Some(2_000), 100), Some(1_100));

        // No system ceiling: caller value stands.
        assert_eq!(effective_expiry(Some(1_000), None, 100), Some(1_100));

        // No caller request: system ceiling applies.
        assert_eq!(effective_expiry(None, Some(2_000), 100), Some(2_100));

        // Neither bound: permanent.
        assert_eq!(effective_expiry(None, None, 100), None);
    }

    mod properties {
        use proptest::prelude::*;

        use crate::engine::{effective_expiry, max_delegation_time, valid_permissions_to_propagate};
        use crate::grant::{Grant, Permission};
        use docvault_core::{DocumentName, Grantee, UserName};

        fn arb_permission() -> impl Strategy<Value = Permission> {
            prop::sample::select(Permission::ALL.to_vec())
        }

        proptest! {
            // Dominance is transitive, so propagation sets compose: anyone
            // allowed to propagate p is allowed to propagate anything p
            // dominates.
            #[test]
            fn propagation_respects_dominance(a in arb_permission(), b in arb_permission()) {
                if a.dominates(b) {
                    let set_b = valid_permissions_to_propagate(b);
                    prop_assert!(set_b.contains(a));
                }
            }

            // The ceiling never exceeds any qualifying grant's remaining time.
            #[test]
            fn ceiling_bounded_by_every_qualifying_grant(
                expiries in prop::collection::vec(1_000i64..1_000_000, 1..8),
                now in 0i64..999,
            ) {
                let grants: Vec<Grant> = expiries
                    .iter()
                    .map(|&e| Grant {
                        document: DocumentName::new("doc"),
                        grantee: Grantee::User(UserName::new("alice")),
                        permission: Permission::Read,
                        expires_at: Some(e),
                        can_propagate: true,
                    })
                    .collect();

                let valid_set = valid_permissions_to_propagate(Permission::Read);
                let ceiling = max_delegation_time(&grants, valid_set, now)
                    .unwrap()
                    .expect("all grants are timed");

                for grant in &grants {
                    prop_assert!(ceiling <= grant.remaining_millis(now).unwrap());
                }
            }

            // A delegation expiry never lands past the system ceiling.
            #[test]
            fn expiry_never_exceeds_system_ceiling(
                requested in prop::option::of(0i64..1_000_000),
                max in 0i64..1_000_000,
                now in 0i64..1_000_000,
            ) {
                let expiry = effective_expiry(requested, Some(max), now)
                    .expect("system ceiling present");
                prop_assert!(expiry <= now + max);
            }
        }
    }
}
