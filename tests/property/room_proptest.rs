//! Property-based tests for room keys
//!
//! Uses proptest to generate random user ids and context keys

use proptest::prelude::*;
use studyhub::shared::{direct_room_id, RoomKey, RoomKind};

fn user_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.@-]{1,24}"
}

proptest! {
    #[test]
    fn test_direct_room_is_commutative(a in user_id(), b in user_id()) {
        prop_assume!(a != b);
        prop_assert_eq!(direct_room_id(&a, &b).unwrap(), direct_room_id(&b, &a).unwrap());
    }

    #[test]
    fn test_distinct_pairs_get_distinct_rooms(a in user_id(), b in user_id(), c in user_id()) {
        prop_assume!(a != b && a != c && b != c);
        prop_assert_ne!(direct_room_id(&a, &b).unwrap(), direct_room_id(&a, &c).unwrap());
    }

    #[test]
    fn test_key_spaces_never_collide(a in user_id(), b in user_id(), topic in "[a-z0-9:-]{1,32}") {
        prop_assume!(a != b);
        let direct = RoomKey::direct(&a, &b).unwrap();
        let contextual = RoomKey::contextual(&topic).unwrap();
        prop_assert_eq!(direct.kind(), RoomKind::Direct);
        prop_assert_ne!(direct.room_id(), contextual.room_id());
    }
}
