//! Cross-cutting request middleware.

pub mod interceptor;

pub use interceptor::{track_golden_signals, Outcome, RequestContext};
