//! One run of the command, from scanning to disconnecting.

use std::future::Future;

use btleplug::api::CharPropFlags;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    config::{COMMAND, Config, TARGET_NAME},
    error::{Phase, SessionError},
    executor,
    filter::NameFilter,
    supervisor,
    transport::{Central, Connection},
};

/// Connect to the target peripheral, send [`COMMAND`] and wait for its result.
///
/// `cancel` aborts the scan, e.g. on Ctrl-C. Once connected, the link is always torn down before
/// this returns, whether the command went through or not. On success the completing response
/// is returned.
pub async fn run<C: Central>(
    central: &C,
    config: &Config,
    cancel: impl Future<Output = ()>,
) -> Result<String, SessionError> {
    match config.scan_duration {
        Some(duration) => info!("Scanning for {}...", humantime::format_duration(duration)),
        None => info!("Scanning until interrupted..."),
    }

    let connection = supervisor::connect(
        central,
        &NameFilter::new(TARGET_NAME),
        config.scan_duration,
        cancel,
    )
    .await
    .map_err(SessionError::at(Phase::Connect))?;

    // Started before any traffic, so a peer disconnect mid-command is reported.
    let watcher = supervisor::watch_disconnection(&connection);

    let result = command(&connection, config).await;

    teardown(&connection, watcher).await;

    result
}

async fn command<C: Connection>(connection: &C, config: &Config) -> Result<String, SessionError> {
    let mtu = connection
        .exchange_mtu(config.mtu)
        .await
        .map_err(SessionError::at(Phase::ExchangeMtu))?;
    info!("exchange MTU : {mtu}");

    info!("Discovering profile...");
    let profile = connection
        .discover_profile(true)
        .await
        .map_err(SessionError::at(Phase::DiscoverProfile))?;

    let read = profile
        .select_characteristic(CharPropFlags::NOTIFY)
        .map_err(SessionError::at(Phase::SelectCharacteristic))?;
    let write = profile
        .select_characteristic(CharPropFlags::WRITE)
        .map_err(SessionError::at(Phase::SelectCharacteristic))?;

    executor::execute(connection, COMMAND, write, read, &config.poll).await
}

/// Cancel `connection` and wait until `watcher` has seen it close.
pub async fn teardown<C: Connection>(connection: &C, watcher: JoinHandle<()>) {
    info!(
        "Disconnecting [ {} ]... (this might take up to few seconds on OS X)",
        connection.address()
    );
    connection.cancel_connection().await;

    if let Err(e) = watcher.await {
        warn!("disconnection watcher failed: {e}");
    }
}
