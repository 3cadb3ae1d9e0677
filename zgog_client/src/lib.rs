//! `zgog_client`
//!
//! Client-side motion synchronization:
//! - Entity state and interpolation bookkeeping
//! - Pointer steering and edge-triggered actions
//! - Local simulation against the walkability map, with throttled reports
//! - Interpolation of remote characters between snapshot batches
//! - The driver tying both to the network feed, and the session task that
//!   owns it

pub mod driver;
pub mod entity;
pub mod input;
pub mod interp;
pub mod motion;
pub mod session;
pub mod transport;
pub mod ui;

pub use driver::SyncDriver;
