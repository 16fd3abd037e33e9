//! Randomized edit streams for exercising the engine.

pub mod edit_stream;
