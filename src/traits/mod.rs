//! Trait definitions for extensible components
//!
//! These traits allow users to provide their own delivery channels next to
//! the built-in transports.

pub mod transport;
