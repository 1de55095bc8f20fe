//! Property-based tests for the membership ledger
//!
//! Random join/leave/close sequences against the in-memory store. The
//! owner is part of the pool and must never get out.

use std::sync::Arc;

use proptest::prelude::*;
use studyhub::backend::ledger::MembershipLedger;
use studyhub::backend::storage::MemoryStorage;
use studyhub::backend::error::BackendError;
use studyhub::shared::{CoreError, GroupAttrs, GroupKind, GroupStatus};

#[derive(Debug, Clone)]
enum Op {
    Join(u8),
    Leave(u8),
    OwnerLeave,
    Close,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12).prop_map(Op::Join),
        4 => (0u8..12).prop_map(Op::Leave),
        1 => Just(Op::OwnerLeave),
        1 => Just(Op::Close),
    ]
}

fn ledger() -> MembershipLedger {
    MembershipLedger::new(Arc::new(MemoryStorage::new()))
}

fn attrs() -> GroupAttrs {
    GroupAttrs {
        title: "Reading Group".into(),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn test_capacity_and_owner_hold_under_any_sequence(capacity in 1i64..8, ops in prop::collection::vec(op(), 0..60)) {
        tokio_test::block_on(async {
            let ledger = ledger();
            let group = ledger.create("owner", GroupKind::Project, capacity, attrs()).await.unwrap();

            for op in ops {
                match op {
                    Op::Join(u) => {
                        let _ = ledger.join(group.id, &format!("u{u}")).await;
                    }
                    Op::Leave(u) => {
                        let _ = ledger.leave(group.id, &format!("u{u}")).await;
                    }
                    Op::OwnerLeave => {
                        let refused = matches!(
                            ledger.leave(group.id, "owner").await,
                            Err(BackendError::Core(CoreError::OwnerCannotLeave { .. }))
                        );
                        prop_assert!(refused);
                    }
                    Op::Close => {
                        let _ = ledger.set_status(group.id, "owner", GroupStatus::Completed).await;
                    }
                }
                let current = ledger.get(group.id).await.unwrap();
                prop_assert!((current.members.len() as i64) <= capacity);
                prop_assert_eq!(current.members[0].user_id.as_str(), "owner");

                let mut ids = current.member_ids();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), current.members.len());
            }
            Ok(())
        })?;
    }

    #[test]
    fn test_join_then_leave_restores_members(users in prop::collection::btree_set(0u8..20, 0..5), newcomer in 20u8..40) {
        tokio_test::block_on(async {
            let ledger = ledger();
            let group = ledger.create("owner", GroupKind::ChatGroup, 32, attrs()).await.unwrap();
            for u in &users {
                ledger.join(group.id, &format!("u{u}")).await.unwrap();
            }
            let before = ledger.get(group.id).await.unwrap().member_ids().join(",");

            let newcomer = format!("u{newcomer}");
            ledger.join(group.id, &newcomer).await.unwrap();
            ledger.leave(group.id, &newcomer).await.unwrap();

            let after = ledger.get(group.id).await.unwrap().member_ids().join(",");
            prop_assert_eq!(before, after);
            Ok(())
        })?;
    }
}
