//! The host stack this crate drives.
//!
//! Everything that touches the radio goes through these two traits. [`crate::btle`] implements
//! them on top of [`btleplug`].

use std::future::Future;

use btleplug::api::Characteristic;

use crate::{Result, core::Disconnected, filter::NameFilter, profile::Profile};

/// The scanning and connecting side of a host stack.
pub trait Central: Send + Sync {
    /// The connection type produced by [`Central::scan`].
    type Connection: Connection + 'static;

    /// Scan until an advertisement matches `filter`, then connect to that peripheral.
    ///
    /// This does not time out by itself; callers bound it.
    fn scan(&self, filter: &NameFilter) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Stop an abandoned scan. Best effort.
    fn stop_scan(&self) -> impl Future<Output = ()> + Send;
}

/// An established link to one peripheral.
pub trait Connection: Send + Sync {
    /// The peer address, for display.
    fn address(&self) -> String;

    /// Request an ATT MTU and return the negotiated one, which may be smaller.
    fn exchange_mtu(&self, requested: u16) -> impl Future<Output = Result<u16>> + Send;

    /// Discover services, and their characteristics when `full` is set.
    fn discover_profile(&self, full: bool) -> impl Future<Output = Result<Profile>> + Send;

    /// Write `payload`, asking the peer to acknowledge only when `want_ack` is set.
    fn write_characteristic(
        &self,
        characteristic: &Characteristic,
        payload: &[u8],
        want_ack: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read the current value of `characteristic`.
    fn read_characteristic(
        &self,
        characteristic: &Characteristic,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// The one-shot signal that fires when the link closes for any reason.
    fn disconnected(&self) -> Disconnected;

    /// Request local teardown. Idempotent, and does not wait for [`Connection::disconnected`].
    fn cancel_connection(&self) -> impl Future<Output = ()> + Send;
}
