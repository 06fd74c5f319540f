//! A scripted host stack for tests.

use std::{
    collections::{BTreeSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use btleplug::api::{CharPropFlags, Characteristic};
use uuid::{Uuid, uuid};

use crate::{
    Error, Result,
    core::{Disconnected, Link},
    filter::{Advertisement, NameFilter},
    profile::{Profile, Service},
    transport::{Central, Connection},
};

const SERVICE: Uuid = uuid!("6e400001-b5a3-f393-e0a9-e50e24dcca9e");
const WRITE: Uuid = uuid!("6e400002-b5a3-f393-e0a9-e50e24dcca9e");
const NOTIFY: Uuid = uuid!("6e400003-b5a3-f393-e0a9-e50e24dcca9e");

fn transport_error() -> Error {
    btleplug::Error::RuntimeError("scripted failure".into()).into()
}

#[derive(Debug)]
struct Script {
    write_properties: CharPropFlags,
    read_properties: CharPropFlags,
    // `None` is a failed read.
    responses: VecDeque<Option<Vec<u8>>>,
    fail_write: bool,
    fail_mtu: bool,
    fail_discovery: bool,
    drop_link_on_read: Option<usize>,
    disconnect_delay: Duration,
}

#[derive(Debug)]
struct Inner {
    link: Link,
    script: Mutex<Script>,
    // Payload and whether an acknowledgment was requested.
    writes: Mutex<Vec<(Vec<u8>, bool)>>,
    reads: AtomicUsize,
    cancels: AtomicUsize,
}

/// A connection that answers from a script. Reads past the end of the script return `busy`.
#[derive(Clone, Debug)]
pub(crate) struct FakeConnection {
    inner: Arc<Inner>,
}

impl FakeConnection {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                link: Link::open(),
                script: Mutex::new(Script {
                    write_properties: CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE,
                    read_properties: CharPropFlags::NOTIFY | CharPropFlags::READ,
                    responses: VecDeque::new(),
                    fail_write: false,
                    fail_mtu: false,
                    fail_discovery: false,
                    drop_link_on_read: None,
                    disconnect_delay: Duration::ZERO,
                }),
                writes: Mutex::default(),
                reads: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
            }),
        }
    }

    fn script(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.inner.script.lock().unwrap());
        self
    }

    pub(crate) fn respond<const N: usize>(self, responses: [&str; N]) -> Self {
        self.script(|s| {
            s.responses
                .extend(responses.map(|r| Some(r.as_bytes().to_vec())))
        })
    }

    pub(crate) fn respond_bytes(self, response: Vec<u8>) -> Self {
        self.script(|s| s.responses.push_back(Some(response)))
    }

    pub(crate) fn fail_read(self) -> Self {
        self.script(|s| s.responses.push_back(None))
    }

    pub(crate) fn fail_write(self) -> Self {
        self.script(|s| s.fail_write = true)
    }

    pub(crate) fn fail_mtu(self) -> Self {
        self.script(|s| s.fail_mtu = true)
    }

    pub(crate) fn fail_discovery(self) -> Self {
        self.script(|s| s.fail_discovery = true)
    }

    pub(crate) fn with_properties(self, write: CharPropFlags, read: CharPropFlags) -> Self {
        self.script(|s| {
            s.write_properties = write;
            s.read_properties = read;
        })
    }

    /// The peer goes away while serving read number `n`.
    pub(crate) fn drop_link_on_read(self, n: usize) -> Self {
        self.script(|s| s.drop_link_on_read = Some(n))
    }

    /// The link only reports closed this long after a cancel.
    pub(crate) fn slow_disconnect(self, delay: Duration) -> Self {
        self.script(|s| s.disconnect_delay = delay)
    }

    pub(crate) fn drop_link(&self) {
        self.inner.link.close();
    }

    pub(crate) fn profile(&self) -> Profile {
        let script = self.inner.script.lock().unwrap();
        let characteristic = |uuid, properties| Characteristic {
            uuid,
            service_uuid: SERVICE,
            properties,
            descriptors: BTreeSet::new(),
        };

        Profile::new(vec![Service {
            uuid: SERVICE,
            primary: true,
            characteristics: vec![
                characteristic(NOTIFY, script.read_properties),
                characteristic(WRITE, script.write_properties),
            ],
        }])
    }

    /// The default write and notify characteristics.
    pub(crate) fn characteristics(&self) -> (Characteristic, Characteristic) {
        let profile = self.profile();
        let characteristics = &profile.services()[0].characteristics;
        (characteristics[1].clone(), characteristics[0].clone())
    }

    pub(crate) fn writes(&self) -> Vec<(Vec<u8>, bool)> {
        self.inner.writes.lock().unwrap().clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn cancels(&self) -> usize {
        self.inner.cancels.load(Ordering::SeqCst)
    }
}

impl Connection for FakeConnection {
    fn address(&self) -> String {
        "C0:FF:EE:00:00:01".into()
    }

    async fn exchange_mtu(&self, requested: u16) -> Result<u16> {
        if self.inner.script.lock().unwrap().fail_mtu {
            return Err(transport_error());
        }
        Ok(requested.min(247))
    }

    async fn discover_profile(&self, _full: bool) -> Result<Profile> {
        if self.inner.script.lock().unwrap().fail_discovery {
            return Err(transport_error());
        }
        Ok(self.profile())
    }

    async fn write_characteristic(
        &self,
        _characteristic: &Characteristic,
        payload: &[u8],
        want_ack: bool,
    ) -> Result<()> {
        if self.inner.script.lock().unwrap().fail_write {
            return Err(transport_error());
        }
        self.inner
            .writes
            .lock()
            .unwrap()
            .push((payload.to_vec(), want_ack));
        Ok(())
    }

    async fn read_characteristic(&self, _characteristic: &Characteristic) -> Result<Vec<u8>> {
        let n = self.inner.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let mut script = self.inner.script.lock().unwrap();

        if script.drop_link_on_read == Some(n) {
            self.inner.link.close();
            return Err(btleplug::Error::NotConnected.into());
        }

        match script.responses.pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(transport_error()),
            None => Ok(b"busy".to_vec()),
        }
    }

    fn disconnected(&self) -> Disconnected {
        self.inner.link.disconnected()
    }

    async fn cancel_connection(&self) {
        self.inner.cancels.fetch_add(1, Ordering::SeqCst);

        let delay = self.inner.script.lock().unwrap().disconnect_delay;
        let link = self.inner.link.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            link.close();
        });
    }
}

/// A central that connects to its one [`FakeConnection`] when an advertisement matches, and
/// otherwise scans forever.
#[derive(Debug)]
pub(crate) struct FakeCentral {
    connection: FakeConnection,
    advertisements: Vec<Advertisement>,
    fail_connect: bool,
    stopped_scans: AtomicUsize,
}

impl FakeCentral {
    pub(crate) fn new(connection: FakeConnection) -> Self {
        Self {
            connection,
            advertisements: Vec::new(),
            fail_connect: false,
            stopped_scans: AtomicUsize::new(0),
        }
    }

    pub(crate) fn advertise(mut self, local_name: &str) -> Self {
        self.advertisements.push(Advertisement {
            local_name: Some(local_name.into()),
            rssi: Some(-60),
            ..Default::default()
        });
        self
    }

    pub(crate) fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub(crate) fn stopped_scans(&self) -> usize {
        self.stopped_scans.load(Ordering::SeqCst)
    }
}

impl Central for FakeCentral {
    type Connection = FakeConnection;

    async fn scan(&self, filter: &NameFilter) -> Result<FakeConnection> {
        if !self.advertisements.iter().any(|a| filter.matches(a)) {
            std::future::pending::<()>().await;
        }
        if self.fail_connect {
            return Err(transport_error());
        }
        Ok(self.connection.clone())
    }

    async fn stop_scan(&self) {
        self.stopped_scans.fetch_add(1, Ordering::SeqCst);
    }
}
