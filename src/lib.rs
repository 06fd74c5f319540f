//! This library sends a command to a "Yudetamago config" Bluetooth LE peripheral and waits for
//! the peripheral to report the result.
//!
//! The host stack is abstracted behind [`Central`] and [`Connection`]; [`btle`] provides the
//! implementation on top of [`btleplug`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]

mod core;
mod error;
#[cfg(test)]
mod fake;

pub mod btle;
pub mod config;
pub mod executor;
pub mod filter;
pub mod profile;
pub mod session;
pub mod supervisor;
pub mod transport;

pub use btleplug;

pub use self::{
    config::{COMMAND, Config, PollPolicy, RESPONSE_MARKER, TARGET_NAME},
    core::{Disconnected, Link, LinkState, StateSignal},
    error::{Error, Phase, Result, SessionError},
    session::run,
    transport::{Central, Connection},
};
