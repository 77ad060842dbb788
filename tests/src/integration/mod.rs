//! Cross-adapter scenarios.

pub mod crash_resume;
pub mod flows;
