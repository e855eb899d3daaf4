//! Unit tests for the gateway client.
