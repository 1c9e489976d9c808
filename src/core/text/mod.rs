//! ANSI-aware text measurement and fitting.
//!
//! Everything here is string in, string out, so both the renderer and
//! application views can use it.

pub mod ansi;
pub mod fit;
pub mod width;
