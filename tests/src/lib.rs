//! # Genesis Distribution Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Temp data directories, crash-injecting stores
//! └── integration/
//!     ├── crash_resume.rs   # Process death at every checkpoint write
//!     └── flows.rs          # End-to-end runs over the file adapters
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p genesis-tests
//! cargo test -p genesis-tests integration::crash_resume::
//! ```

pub mod harness;
pub mod integration;
