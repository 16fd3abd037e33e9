//! The rate propagation engine and its boundary with display fields.
//!
//! - **context** — the non-reentrant propagation latch
//! - **propagation** — one edit in, every other amount out
//! - **input** — field text parsing and formatting
//! - **display** — the sink trait for display fields and an in-memory board
//! - **rate_board** — cross-rate summary of the current rate set

pub mod context;
pub mod display;
pub mod input;
pub mod propagation;
pub mod rate_board;
