//! Topology resolution and grouping engine.

pub mod aggregate;
pub mod builder;
pub mod pipeline;
pub mod resolver;
