//! The indexed message handler builder (§4.3): compiles a fixed set of
//! `(matcher, action)` callbacks into a per-field lookup so that dispatch
//! costs O(#indexed fields + #candidates) instead of O(#callbacks).

mod builder;
mod dispatch;

pub use builder::IndexedHandlerBuilder;
pub use dispatch::IndexedHandler;
