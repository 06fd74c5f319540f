use std::pin::Pin;

use futures_signals::signal::{Mutable, MutableSignal, Signal, SignalExt};

/// A reactive [`Signal`] whose value can also be read out directly.
///
/// [`Signal`]: https://docs.rs/futures-signals/latest/futures_signals/tutorial/index.html#signal-1
#[allow(private_bounds)]
pub trait StateSignal<T>: Signal<Item = T> + super::Sealed {
    /// Get the current value.
    fn get(&self) -> T;
}

/// Whether the link to the peripheral is still up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// The link is established.
    Open,
    /// The link was cancelled locally or dropped by the peer.
    Closed,
}

/// Owner side of the one-shot disconnection signal of a connection.
///
/// The state only ever moves from [`LinkState::Open`] to [`LinkState::Closed`].
#[derive(Clone, Debug)]
pub struct Link {
    state: Mutable<LinkState>,
}

impl Link {
    /// Create a link in the [`LinkState::Open`] state.
    pub fn open() -> Self {
        Self {
            state: Mutable::new(LinkState::Open),
        }
    }

    /// Mark the link closed. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock_mut();
        if *state == LinkState::Closed {
            return false;
        }
        *state = LinkState::Closed;
        true
    }

    /// The current state.
    pub fn state(&self) -> LinkState {
        self.state.get()
    }

    /// A watcher for the moment the link closes.
    pub fn disconnected(&self) -> Disconnected {
        Disconnected {
            state: self.state.clone(),
            signal: self.state.signal(),
        }
    }
}

/// Watcher side of the one-shot disconnection signal.
///
/// Any number of these can observe the same [`Link`]; every one of them sees the close.
pub struct Disconnected {
    state: Mutable<LinkState>,
    signal: MutableSignal<LinkState>,
}

impl Disconnected {
    /// Wait until the link is closed. Returns immediately if it already is.
    pub async fn fired(self) {
        self.wait_for(LinkState::Closed).await;
    }
}

impl std::fmt::Debug for Disconnected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Disconnected").field(&self.state.get()).finish()
    }
}

impl super::Sealed for Disconnected {}

impl StateSignal<LinkState> for Disconnected {
    fn get(&self) -> LinkState {
        self.state.get()
    }
}

impl Signal for Disconnected {
    type Item = LinkState;

    fn poll_change(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.get_mut().signal.poll_change_unpin(cx)
    }
}
