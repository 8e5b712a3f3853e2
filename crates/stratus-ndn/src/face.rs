//! The face: the core's window onto the NDN forwarder.
//!
//! [`Face`] is the interface the catalog consumes: register interest
//! filters under a prefix, receive the Interests routed to them, emit
//! Data. [`ChannelFace`] is the in-process implementation: filters are
//! mpsc channels keyed by prefix with longest-prefix-match dispatch, and
//! outbound Data fans out on a broadcast channel a transport (or a test)
//! subscribes to.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::name::Name;
use crate::packet::{Data, Interest};

/// Depth of each filter's interest channel.
const INTEREST_CHANNEL_DEPTH: usize = 256;
/// Depth of the outbound data channel.
const OUTBOUND_CHANNEL_DEPTH: usize = 1024;

pub type FilterId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FaceError {
    #[error("face is shut down")]
    Closed,
    #[error("no interest filter with id {0}")]
    UnknownFilter(FilterId),
}

/// A registered interest filter: its id (for unregistration) and the
/// stream of Interests routed to it.
pub struct FilterHandle {
    pub id: FilterId,
    pub interests: mpsc::Receiver<Interest>,
}

/// What the core needs from an NDN forwarder connection.
#[async_trait]
pub trait Face: Send + Sync {
    /// Ask for Interests under `prefix` to be delivered to the returned
    /// handle.
    async fn register_filter(&self, prefix: Name) -> Result<FilterHandle, FaceError>;

    /// Stop delivery for a previously registered filter.
    async fn unregister_filter(&self, id: FilterId) -> Result<(), FaceError>;

    /// Emit a Data packet toward the network.
    async fn put(&self, data: Data) -> Result<(), FaceError>;
}

struct FilterEntry {
    id: FilterId,
    prefix: Name,
    interests: mpsc::Sender<Interest>,
}

/// In-process face backed by tokio channels.
pub struct ChannelFace {
    filters: RwLock<Vec<FilterEntry>>,
    outbound: broadcast::Sender<Data>,
    next_filter_id: AtomicU64,
}

impl ChannelFace {
    pub fn new() -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CHANNEL_DEPTH);
        Self {
            filters: RwLock::new(Vec::new()),
            outbound,
            next_filter_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to everything the core emits.
    pub fn subscribe(&self) -> broadcast::Receiver<Data> {
        self.outbound.subscribe()
    }

    /// Route an incoming Interest to the longest-prefix matching filter.
    /// Returns false when no filter matches.
    pub async fn deliver(&self, interest: Interest) -> bool {
        let filters = self.filters.read().await;
        let best = filters
            .iter()
            .filter(|entry| entry.prefix.is_prefix_of(interest.name()))
            .max_by_key(|entry| entry.prefix.len());
        match best {
            Some(entry) => entry.interests.send(interest).await.is_ok(),
            None => {
                tracing::trace!("no filter for {}", interest.name());
                false
            }
        }
    }

    pub async fn filter_count(&self) -> usize {
        self.filters.read().await.len()
    }
}

impl Default for ChannelFace {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Face for ChannelFace {
    async fn register_filter(&self, prefix: Name) -> Result<FilterHandle, FaceError> {
        let (tx, rx) = mpsc::channel(INTEREST_CHANNEL_DEPTH);
        let id = self.next_filter_id.fetch_add(1, Ordering::Relaxed);
        let mut filters = self.filters.write().await;
        filters.push(FilterEntry {
            id,
            prefix,
            interests: tx,
        });
        Ok(FilterHandle { id, interests: rx })
    }

    async fn unregister_filter(&self, id: FilterId) -> Result<(), FaceError> {
        let mut filters = self.filters.write().await;
        let before = filters.len();
        filters.retain(|entry| entry.id != id);
        if filters.len() == before {
            return Err(FaceError::UnknownFilter(id));
        }
        Ok(())
    }

    async fn put(&self, data: Data) -> Result<(), FaceError> {
        // A send error only means nobody is subscribed right now.
        let _ = self.outbound.send(data);
        Ok(())
    }
}
