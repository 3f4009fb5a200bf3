//! Tatami's core data structures.
//!
//! This module exports the window arena and its orderings
//! ([`ClientRegistry`]), the managed window type ([`Window`]), monitors
//! and their tag state ([`Monitor`]), tag masks ([`TagMask`]), and the
//! [`Ring`] sequence type that backs the orderings.

pub mod monitor;
pub mod registry;
pub mod ring;
pub mod tags;
pub mod types;
pub mod window;

#[doc(inline)]
pub use monitor::{Monitor, MonitorId};
#[doc(inline)]
pub use registry::ClientRegistry;
#[doc(inline)]
pub use ring::Ring;
#[doc(inline)]
pub use tags::{TagMask, TAG_COUNT};
#[doc(inline)]
pub use window::{Window, WindowId};
