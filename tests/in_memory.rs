//! In-memory integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `pipeline_tests`: Task mutations flowing through the broker into
//!   notifications
//! - `gateway_tests`: Gateway calls against wired and missing services

mod in_memory {
    pub mod helpers;

    mod gateway_tests;
    mod pipeline_tests;
}
