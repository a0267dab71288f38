//! Inbound adapters translating external requests into port calls.
//!
//! Only HTTP exists today; see [`http`].

pub mod http;
