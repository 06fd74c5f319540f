mod peripheral;
mod state;

trait Sealed {}

pub(crate) use self::peripheral::PeripheralExt;
pub use self::state::{Disconnected, Link, LinkState, StateSignal};
