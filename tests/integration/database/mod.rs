//! SQLite storage integration tests

mod sqlite_test;
