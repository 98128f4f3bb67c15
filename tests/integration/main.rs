//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host with no real
//! backlight or light sensor required.

mod daemon_tests;
mod mock_hw;
mod service_tests;
