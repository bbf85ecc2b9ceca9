//! Capture session for a document digitization workflow.
//!
//! Photographed pages are kept as an ordered set of image records with a single
//! selection. Cameras and the image fixer are collaborators that only ever hand
//! finished results to the session.

pub mod capture;
pub mod state;
