//! 2D Mathematics Library
//!
//! This crate provides the vector, matrix and color types shared by the
//! Rust2D engine crates.
//!
//! ## Core Types
//!
//! - [`Vec2`] - 2D vector with x, y components
//! - [`Mat4`] - 4x4 column-major matrix used for model, view and projection transforms
//! - [`Color`] - RGBA color with named constants

mod vec2;
mod color;
pub mod mat4;

pub use vec2::Vec2;
pub use color::Color;
pub use mat4::Mat4;
