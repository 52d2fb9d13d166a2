//! Job trigger dispatch
//!
//! One best-effort POST per qualifying alert. A failed notification is
//! reported to the caller and never blocks the watermark.

pub mod client;

pub use client::{DispatchClient, DispatchError};
