/// Shared helpers for integration and end-to-end tests
pub mod archives;
pub mod mocks;
