//! Real-time integration tests

mod session_test;
mod socket_test;
