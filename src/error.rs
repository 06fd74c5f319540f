use btleplug::api::CharPropFlags;

/// The result type returned by this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by this library.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// No Bluetooth adapter matched the selector.
    NoAdapter(String),
    /// No matching peripheral connected before the scan deadline or cancellation.
    NotFound,
    /// The profile has no characteristic exposing the required property.
    CharacteristicNotFound(CharPropFlags),
    /// The response marker was not seen within the configured number of reads.
    Timeout {
        /// Number of reads performed.
        attempts: u32,
    },
    /// An error returned by [`btleplug`].
    Btleplug(btleplug::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoAdapter(selector) => write!(f, "no bluetooth adapter matching '{selector}'"),
            Error::NotFound => write!(f, "no matching peripheral found"),
            Error::CharacteristicNotFound(property) => {
                write!(f, "not found {} Characteristic", property_name(*property))
            }
            Error::Timeout { attempts } => {
                write!(f, "no complete response after {attempts} reads")
            }
            Error::Btleplug(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Btleplug(e) => Some(e),
            _ => None,
        }
    }
}

impl From<btleplug::Error> for Error {
    fn from(e: btleplug::Error) -> Self {
        Self::Btleplug(e)
    }
}

fn property_name(property: CharPropFlags) -> String {
    const NAMES: [(CharPropFlags, &str); 5] = [
        (CharPropFlags::NOTIFY, "Notify"),
        (CharPropFlags::WRITE, "Write"),
        (CharPropFlags::READ, "Read"),
        (CharPropFlags::WRITE_WITHOUT_RESPONSE, "WriteWithoutResponse"),
        (CharPropFlags::INDICATE, "Indicate"),
    ];

    NAMES
        .iter()
        .find(|(flag, _)| *flag == property)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| format!("{property:?}"))
}

/// The step of a session that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Scanning for and connecting to the peripheral.
    Connect,
    /// Exchanging the ATT MTU.
    ExchangeMtu,
    /// Discovering services and characteristics.
    DiscoverProfile,
    /// Selecting the write or notify characteristic.
    SelectCharacteristic,
    /// Writing the command.
    Write,
    /// Reading the response.
    Read,
    /// Waiting for a response that carries the marker.
    Poll,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Connect => "can't connect",
            Phase::ExchangeMtu => "can't exchange MTU",
            Phase::DiscoverProfile => "can't discover profile",
            Phase::SelectCharacteristic => "can't resolve characteristic",
            Phase::Write => "can't write command",
            Phase::Read => "ReadCharacteristic() returns fails",
            Phase::Poll => "no result from peripheral",
        })
    }
}

/// An [`Error`] tagged with the [`Phase`] of the session it ended.
#[derive(Debug)]
pub struct SessionError {
    /// The failing step.
    pub phase: Phase,
    /// What went wrong.
    pub source: Error,
}

impl SessionError {
    pub(crate) fn at(phase: Phase) -> impl FnOnce(Error) -> Self {
        move |source| Self { phase, source }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.phase, self.source)
    }
}

// `Display` already includes the source.
impl std::error::Error for SessionError {}
