//! Custom assertion macros
//!
//! Provides assertion macros for better test output on the JSON error
//! bodies the server returns.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert a response status and error code: `assert_error!(resp, 409, "group_full")`
#[macro_export]
macro_rules! assert_error {
    ($response:expr, $status:expr, $code:expr) => {{
        let response = &$response;
        assert_eq!(response.status.as_u16(), $status, "unexpected status, body: {}", response.body);
        assert_eq!(
            response.body["code"], $code,
            "unexpected error code, body: {}",
            response.body
        );
        assert_eq!(response.body["status"], $status);
    }};
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
