//! [`Central`] and [`Connection`] on top of [`btleplug`].

use std::{convert::Infallible, future::Future, str::FromStr};

use btleplug::{
    api::{
        Central as _, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter,
        WriteType,
    },
    platform::{Adapter, Manager, Peripheral},
};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::{
    Error, Result,
    core::{Disconnected, Link, LinkState, PeripheralExt},
    filter::NameFilter,
    profile::Profile,
    transport::{Central, Connection},
};

/// Largest ATT MTU allowed by the Bluetooth core specification.
pub const MAX_ATT_MTU: u16 = 517;

/// Which Bluetooth adapter to drive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AdapterSelector {
    /// The first adapter the platform reports.
    #[default]
    Default,
    /// The adapter at this position in the platform's list.
    Index(usize),
    /// The first adapter whose description contains this text, e.g. `hci0`.
    Named(String),
}

impl FromStr for AdapterSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "" | "default" => Self::Default,
            s => match s.parse() {
                Ok(index) => Self::Index(index),
                Err(_) => Self::Named(s.to_owned()),
            },
        })
    }
}

impl std::fmt::Display for AdapterSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterSelector::Default => f.write_str("default"),
            AdapterSelector::Index(index) => write!(f, "{index}"),
            AdapterSelector::Named(name) => f.write_str(name),
        }
    }
}

/// A [`Central`] backed by one [`btleplug::platform::Adapter`].
#[derive(Debug, Clone)]
pub struct BtleCentral {
    adapter: Adapter,
}

impl BtleCentral {
    /// Open the adapter picked by `selector`.
    pub async fn new(selector: &AdapterSelector) -> Result<Self> {
        let manager = Manager::new().await?;
        let mut adapters = manager.adapters().await?;
        debug!("found {} adapters", adapters.len());

        let index = match selector {
            AdapterSelector::Default => (!adapters.is_empty()).then_some(0),
            AdapterSelector::Index(index) => (*index < adapters.len()).then_some(*index),
            AdapterSelector::Named(name) => {
                let mut found = None;
                for (index, adapter) in adapters.iter().enumerate() {
                    let info = adapter.adapter_info().await?;
                    debug!(index, %info, "adapter");
                    if info.contains(name.as_str()) {
                        found = Some(index);
                        break;
                    }
                }
                found
            }
        };

        let index = index.ok_or_else(|| Error::NoAdapter(selector.to_string()))?;

        Ok(Self::from(adapters.swap_remove(index)))
    }
}

impl From<Adapter> for BtleCentral {
    fn from(adapter: Adapter) -> Self {
        Self { adapter }
    }
}

impl Central for BtleCentral {
    type Connection = BtleConnection;

    async fn scan(&self, filter: &NameFilter) -> Result<BtleConnection> {
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;

        // The caller may drop this future at any await once the scan is running.
        let scanning = OnDrop::new({
            let adapter = self.adapter.clone();
            async move {
                if let Err(e) = adapter.stop_scan().await {
                    warn!("failed to stop scanning: {e}");
                }
            }
        });

        let peripheral = 'peripheral: {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event
                {
                    let peripheral = self.adapter.peripheral(&id).await?;
                    let Some(advertisement) = peripheral.advertisement().await? else {
                        continue;
                    };
                    debug!(?advertisement);
                    if filter.matches(&advertisement) {
                        break 'peripheral peripheral;
                    }
                }
            }

            return Err(Error::NotFound);
        };

        scanning.disarm();
        self.adapter.stop_scan().await?;

        let connecting = OnDrop::new({
            let peripheral = peripheral.clone();
            async move {
                if let Err(e) = peripheral.disconnect().await {
                    warn!("failed to disconnect {}: {e}", peripheral.address());
                }
            }
        });

        debug!("connecting to {}", peripheral.address());
        peripheral.connect().await?;
        let connection = BtleConnection::open(&self.adapter, peripheral).await?;
        connecting.disarm();

        Ok(connection)
    }

    async fn stop_scan(&self) {
        if let Err(e) = self.adapter.stop_scan().await {
            warn!("failed to stop scanning: {e}");
        }
    }
}

/// Runs a cleanup task when dropped without being disarmed.
struct OnDrop<F: Future<Output = ()> + Send + 'static> {
    cleanup: Option<F>,
}

impl<F: Future<Output = ()> + Send + 'static> OnDrop<F> {
    fn new(cleanup: F) -> Self {
        Self {
            cleanup: Some(cleanup),
        }
    }

    fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: Future<Output = ()> + Send + 'static> Drop for OnDrop<F> {
    fn drop(&mut self) {
        let Some(cleanup) = self.cleanup.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(cleanup);
            }
            Err(_) => warn!("no runtime left to clean up an abandoned connection attempt"),
        }
    }
}

/// A [`Connection`] to a [`btleplug::platform::Peripheral`].
#[derive(Debug)]
pub struct BtleConnection {
    peripheral: Peripheral,
    link: Link,
}

impl BtleConnection {
    async fn open(adapter: &Adapter, peripheral: Peripheral) -> Result<Self> {
        let link = Link::open();

        // The peer can drop the link at any time; the adapter reports it as an event.
        let mut events = adapter.events().await?;
        let id = peripheral.id();
        let closed = link.disconnected();
        let watch = link.clone();
        tokio::spawn(async move {
            let peer_dropped = async {
                while let Some(event) = events.next().await {
                    if matches!(event, CentralEvent::DeviceDisconnected(ref d) if *d == id) {
                        return true;
                    }
                }
                false
            };

            tokio::select! {
                dropped = peer_dropped => {
                    if dropped && watch.close() {
                        debug!("peer closed the link");
                    }
                }
                () = closed.fired() => {}
            }
        });

        Ok(Self { peripheral, link })
    }
}

impl Connection for BtleConnection {
    fn address(&self) -> String {
        self.peripheral.address().to_string()
    }

    async fn exchange_mtu(&self, requested: u16) -> Result<u16> {
        // The platform stack negotiates the MTU while connecting; there is no request to send.
        if !self.peripheral.is_connected().await? {
            return Err(btleplug::Error::NotConnected.into());
        }

        Ok(requested.min(MAX_ATT_MTU))
    }

    async fn discover_profile(&self, full: bool) -> Result<Profile> {
        debug!("discovering services");
        self.peripheral.discover_services().await?;

        let mut profile = Profile::from(self.peripheral.services());
        if !full {
            profile = Profile::new(
                profile
                    .services()
                    .iter()
                    .cloned()
                    .map(|mut service| {
                        service.characteristics.clear();
                        service
                    })
                    .collect(),
            );
        }

        Ok(profile)
    }

    async fn write_characteristic(
        &self,
        characteristic: &Characteristic,
        payload: &[u8],
        want_ack: bool,
    ) -> Result<()> {
        let write_type = if want_ack {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral
            .write(characteristic, payload, write_type)
            .await?;

        Ok(())
    }

    async fn read_characteristic(&self, characteristic: &Characteristic) -> Result<Vec<u8>> {
        Ok(self.peripheral.read(characteristic).await?)
    }

    fn disconnected(&self) -> Disconnected {
        self.link.disconnected()
    }

    async fn cancel_connection(&self) {
        if self.link.state() == LinkState::Closed {
            return;
        }

        if let Err(e) = self.peripheral.disconnect().await {
            warn!("failed to disconnect {}: {e}", self.peripheral.address());
        }
        self.link.close();
    }
}
