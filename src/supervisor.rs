//! Bringing the link up and watching it go down.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    Error, Result,
    filter::NameFilter,
    transport::{Central, Connection},
};

/// Scan for and connect to the peripheral matching `filter`.
///
/// Gives up with [`Error::NotFound`] when `scan_duration` elapses or `cancel` completes,
/// whichever comes first. A `scan_duration` of `None` only stops on `cancel`.
pub async fn connect<C: Central>(
    central: &C,
    filter: &NameFilter,
    scan_duration: Option<Duration>,
    cancel: impl Future<Output = ()>,
) -> Result<C::Connection> {
    let deadline = async {
        match scan_duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        connection = central.scan(filter) => {
            let connection = connection?;
            info!("connected to [ {} ]", connection.address());
            Ok(connection)
        }
        () = deadline => {
            debug!("scan deadline elapsed");
            central.stop_scan().await;
            Err(Error::NotFound)
        }
        () = cancel => {
            debug!("scan cancelled");
            central.stop_scan().await;
            Err(Error::NotFound)
        }
    }
}

/// Spawn the task that reports when `connection` closes.
///
/// The task is the only consumer of the disconnection signal. It finishes right after
/// reporting, so awaiting its handle confirms the link is down.
pub fn watch_disconnection<C: Connection>(connection: &C) -> JoinHandle<()> {
    let disconnected = connection.disconnected();
    let address = connection.address();

    tokio::spawn(async move {
        disconnected.fired().await;
        info!("[ {address} ] is disconnected");
    })
}
