//! Library integration tests: building programs and running their bundles.

mod bundle_tests;
mod incremental_tests;
