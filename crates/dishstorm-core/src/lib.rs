//! Dishstorm Core - Shared primitives for the Dishstorm arena
//!
//! This crate provides the small set of types every other crate agrees on:
//! - 2D math (re-exported from glam)
//! - Colors and axis-aligned arena bounds
//! - The frame clock that turns raw frame deltas into simulation deltas

pub mod time;
pub mod types;

pub use glam::Vec2;
pub use time::{ClockConfig, FrameClock};
pub use types::{Bounds, Color};
