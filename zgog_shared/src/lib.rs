//! `zgog_shared`
//!
//! Libraries shared by the client and its tests.
//!
//! Design goals:
//! - Deterministic, allocation-light math.
//! - One normalized view of every wire payload, whatever revision sent it.
//! - Traits at the seams the client does not own (rendering).
//! - No `unsafe`.

pub mod config;
pub mod map;
pub mod math;
pub mod net;
pub mod render;
