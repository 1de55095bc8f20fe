//! Property-based tests

mod ledger_proptest;
mod room_proptest;
