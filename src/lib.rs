//! Mission Index - organizations, missions and votes over a Neo4j graph.
//!
//! Visitors register organizations under missions, rate how well an
//! organization fulfills its mission, and browse how missions contribute to
//! each other.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod graph;
pub mod marker;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
