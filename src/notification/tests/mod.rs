//! Unit tests for the notification module.

mod consumer_tests;
mod service_tests;
