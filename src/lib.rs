//! Rust2D - fixed-timestep 2D engine
//!
//! Library half of the binary: configuration, the winit window system and
//! the demo state, kept here so integration tests can reach them.

pub mod config;
pub mod demo;
pub mod systems;
