//! Unit tests for broker envelopes and the in-memory transport.
