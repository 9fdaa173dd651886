//! Hardware-independent core library for roombuddy
//!
//! This crate contains the platform-agnostic logic of the roombuddy weather
//! station: per-channel sensor stabilization, tolerance-based change
//! detection, bounded reading buffers, the sensor registry that owns them, and
//! the sampling loop that feeds it from [`sensors::Sensor`] implementations.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! microcontroller targets (Pico W) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod config;
pub mod controls;
pub mod filter;
pub mod history;
pub mod metrics;
pub mod registry;
pub mod sampling;
pub mod sensors;
pub mod storage;
