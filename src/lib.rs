// This module is shared between the herald binary and the integration tests
pub mod manifest;
