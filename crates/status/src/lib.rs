//! Latest-value channels for the external feeds the deposit resolver consumes.
//!
//! Each feed (source chain finality, bridge job state, bridge stage timings) is updated
//! independently by whoever polls it. Consumers either read the latest value or subscribe and get
//! woken up whenever a feed changes materially.

use std::sync::Arc;

use minter_primitives::prelude::*;
use tokio::sync::watch;
use tracing::*;

/// Shared handle to the three feed channels.
///
/// Cloning is cheap, every clone talks to the same channels.
#[derive(Clone, Debug)]
pub struct FeedChannel {
    sender: Arc<FeedSender>,
    receiver: Arc<FeedReceiver>,
}

impl FeedChannel {
    /// Creates a new `FeedChannel` with no finality or bridge state yet and empty timings.
    pub fn new() -> Self {
        let (fin_tx, fin_rx) = watch::channel(None);
        let (bridge_tx, bridge_rx) = watch::channel(None);
        let (timings_tx, timings_rx) = watch::channel(TimingsExtension::default());

        let sender = Arc::new(FeedSender {
            eth_finality: fin_tx,
            bridge_state: bridge_tx,
            bridge_timings: timings_tx,
        });
        let receiver = Arc::new(FeedReceiver {
            eth_finality: fin_rx,
            bridge_state: bridge_rx,
            bridge_timings: timings_rx,
        });

        Self { sender, receiver }
    }

    // Receiver methods

    /// Gets the latest [`EthFinalityState`], if any was published.
    pub fn get_eth_finality(&self) -> Option<EthFinalityState> {
        *self.receiver.eth_finality.borrow()
    }

    /// Gets the latest [`BridgeJobState`], if any was published.
    pub fn get_bridge_state(&self) -> Option<BridgeJobState> {
        self.receiver.bridge_state.borrow().clone()
    }

    /// Gets the latest [`TimingsExtension`].
    pub fn get_bridge_timings(&self) -> TimingsExtension {
        self.receiver.bridge_timings.borrow().clone()
    }

    // Subscription functions.

    pub fn subscribe_eth_finality(&self) -> watch::Receiver<Option<EthFinalityState>> {
        self.sender.eth_finality.subscribe()
    }

    pub fn subscribe_bridge_state(&self) -> watch::Receiver<Option<BridgeJobState>> {
        self.sender.bridge_state.subscribe()
    }

    pub fn subscribe_bridge_timings(&self) -> watch::Receiver<TimingsExtension> {
        self.sender.bridge_timings.subscribe()
    }

    // Sender methods

    /// Publishes a new finality state. Subscribers are only notified if the value differs from
    /// the current one. Returns whether it did.
    pub fn update_eth_finality(&self, state: EthFinalityState) -> bool {
        let changed = send_if_changed(&self.sender.eth_finality, Some(state));
        if changed {
            trace!(block = %state.latest_finality_block_number, slot = %state.latest_finality_slot, "eth finality updated");
        }
        changed
    }

    /// Publishes a new bridge job state, notifying subscribers on material change only.
    pub fn update_bridge_state(&self, state: BridgeJobState) -> bool {
        let changed = send_if_changed(&self.sender.bridge_state, Some(state));
        if changed {
            trace!("bridge state updated");
        }
        changed
    }

    /// Publishes new bridge stage timings, notifying subscribers on material change only.
    pub fn update_bridge_timings(&self, timings: TimingsExtension) -> bool {
        let changed = send_if_changed(&self.sender.bridge_timings, timings);
        if changed {
            trace!("bridge timings updated");
        }
        changed
    }
}

impl Default for FeedChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn send_if_changed<T: PartialEq>(tx: &watch::Sender<T>, value: T) -> bool {
    tx.send_if_modified(|cur| {
        if *cur == value {
            return false;
        }
        *cur = value;
        true
    })
}

/// Wrapper for watch feed receivers
#[derive(Debug)]
struct FeedReceiver {
    eth_finality: watch::Receiver<Option<EthFinalityState>>,
    bridge_state: watch::Receiver<Option<BridgeJobState>>,
    bridge_timings: watch::Receiver<TimingsExtension>,
}

/// Wrapper for watch feed senders
#[derive(Debug)]
struct FeedSender {
    eth_finality: watch::Sender<Option<EthFinalityState>>,
    bridge_state: watch::Sender<Option<BridgeJobState>>,
    bridge_timings: watch::Sender<TimingsExtension>,
}
