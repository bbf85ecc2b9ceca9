//! View layer
//!
//! Pure rendering of session snapshots; nothing here mutates the session.

pub mod thumbs;
