//! Custom assertion macros

/// Assert an HTTP status, showing the response body on mismatch
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {{
        let (status, body) = $response;
        assert_eq!(status, $expected, "unexpected status; body: {}", body);
        body
    }};
}

/// Assert that a string contains a substring
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
