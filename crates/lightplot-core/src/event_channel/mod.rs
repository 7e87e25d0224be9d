//! # Event Channel Module
//!
//! A minimal publish/subscribe primitive. Every element and behavior owns
//! one channel and exposes it to collaborators (property panels, inventory
//! views, other behaviors).
//!
//! ## Overview
//!
//! - Listeners register for one event kind, or for every kind
//! - One-shot listeners are removed before they run
//! - Emission is synchronous and fans out in registration order
//! - A panicking listener is caught and logged; the remaining listeners
//!   still run
//! - [`Subscription`] guards remove their listener when dropped
//!
//! ## Usage
//!
//! ```rust
//! use lightplot_core::event_channel::{Event, EventChannel};
//!
//! #[derive(Debug)]
//! enum Ping {
//!     Hello(u32),
//! }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum PingKind {
//!     Hello,
//! }
//!
//! impl Event for Ping {
//!     type Kind = PingKind;
//!     fn kind(&self) -> PingKind {
//!         PingKind::Hello
//!     }
//! }
//!
//! let channel = EventChannel::<Ping>::new("ping");
//! let guard = channel.scoped(PingKind::Hello, |event| {
//!     let Ping::Hello(n) = event;
//!     assert_eq!(*n, 3);
//! });
//! assert_eq!(channel.emit(&Ping::Hello(3)), 1);
//! drop(guard);
//! assert_eq!(channel.listener_count(), 0);
//! ```

mod channel;
mod subscription;

pub use channel::*;
pub use subscription::*;
