//! API integration tests
//!
//! Integration tests for all API endpoints

mod auth_test;
mod groups_test;
mod messages_test;
mod rooms_test;
