//! Shared utilities.
