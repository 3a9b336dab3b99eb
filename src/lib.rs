//! Pacer: time-windowed invocation scheduling
//!
//! A library for pacing a high-frequency stream of invocation requests
//! through one configurable policy: settle-then-fire (debounce) or
//! rate-capped (throttle), with leading/trailing edge control and
//! cancel/flush semantics.

pub mod scheduler;
pub mod time;
