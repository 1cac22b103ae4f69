//! Persistence of day records and settings.
//!  - Everything lives in a single application directory.
//!  - Day records are stored as one JSON object keyed by date, settings as another JSON file.
//!  - Files are loaded and saved whole. Every access holds an fs4 lock so concurrent
//!    invocations don't interleave writes.

pub mod entities;
pub mod json_store;
