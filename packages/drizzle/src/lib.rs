//! A small real-time rain animation pipeline built from closable channels.
//!
//! A jittered timer produces new droplets into a bounded, drop-oldest [`Channel`]. A chunker
//! batches that channel into one frame's worth of droplets at a time. Each batch is filtered,
//! merged where droplets overlap, advanced one physics step, handed to a [`Renderer`], and put back
//! into the droplet channel for the next frame.
//!
//! [`Renderer`]: crate::pipeline::Renderer

#[macro_use]
extern crate tracing;

mod channel;
pub mod util;
pub mod timer;
pub mod window;
pub mod chunk;
pub mod droplet;
pub mod config;
pub mod pipeline;

pub use crate::channel::api::*;

/// Error types
pub mod error {
    pub use crate::channel::error::*;
    pub use crate::config::ConfigError;
}

/// Future types
pub mod future {
    pub use crate::channel::api::future::*;
}
