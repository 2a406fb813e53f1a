//! Test suites for the render service.

mod run_entry;
mod support;
