//! Neighbor liveness tracking: a one-shot timer per neighbor, plus the
//! "last advertisement heard" cache the distance-vector death path doesn't
//! currently consume — kept for a future full recomputation handler, not
//! wired into `on_neighbor_death`.

use std::{collections::HashMap, sync::Mutex};

use rover_proto::{AdvertisementFrame, PrivateAddress, PublicAddress, DEAD_INTERVAL};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::env::Environment;

/// Event sent back into the engine's event channel. Timer firing is
/// delivered as a message rather than a direct callback, so it can never
/// interleave its routing-table mutation with an in-flight advertisement
/// being processed by the same channel consumer.
#[derive(Debug, Clone)]
pub enum NeighborEvent {
    /// A neighbor's heartbeat timer expired without being refreshed.
    Dead {
        /// The dead neighbor's private address.
        private: PrivateAddress,
        /// The dead neighbor's public address.
        public: PublicAddress,
    },
}

/// Mapping `PrivateAddress -> (last advertisement, public address)`.
///
/// Populated on every received advertisement. Not consumed by the death path
/// in this implementation: `DistanceVectorEngine::on_neighbor_death`
/// uses the simpler "poison anything routed via the dead next-hop" rule
/// instead of recomputing routes from cached neighbor tables.
#[derive(Default)]
pub struct NeighborCache {
    entries: Mutex<HashMap<PrivateAddress, (AdvertisementFrame, PublicAddress)>>,
}

impl NeighborCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the most recent advertisement heard from `neighbor`.
    pub fn record(&self, neighbor: PrivateAddress, public: PublicAddress, frame: AdvertisementFrame) {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.entries.lock().unwrap().insert(neighbor, (frame, public));
    }

    /// The last cached advertisement from `neighbor`, if any.
    #[must_use]
    pub fn last(&self, neighbor: PrivateAddress) -> Option<(AdvertisementFrame, PublicAddress)> {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.entries.lock().unwrap().get(&neighbor).cloned()
    }
}

/// One-shot, cancelable death timer per neighbor.
pub struct NeighborTimers<E: Environment> {
    env: E,
    tx: mpsc::Sender<NeighborEvent>,
    handles: Mutex<HashMap<PrivateAddress, JoinHandle<()>>>,
}

impl<E: Environment> NeighborTimers<E> {
    /// Build a timer set that reports deaths on `tx`.
    #[must_use]
    pub fn new(env: E, tx: mpsc::Sender<NeighborEvent>) -> Self {
        Self { env, tx, handles: Mutex::new(HashMap::new()) }
    }

    /// Cancel any existing timer for `neighbor` and arm a fresh one with the
    /// 7-second dead-interval. Called on every heartbeat.
    pub fn touch(&self, neighbor: PrivateAddress, public: PublicAddress) {
        self.cancel(neighbor);

        let env = self.env.clone();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            env.sleep(DEAD_INTERVAL).await;
            // The receiver may already be gone if the engine task shut down;
            // nothing to do in that case.
            let _ = tx.send(NeighborEvent::Dead { private: neighbor, public }).await;
        });

        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.handles.lock().unwrap().insert(neighbor, handle);
    }

    /// Disarm the timer for `neighbor`, if any.
    pub fn cancel(&self, neighbor: PrivateAddress) {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        if let Some(handle) = self.handles.lock().unwrap().remove(&neighbor) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rover_proto::Command;
    use tokio::sync::mpsc;

    use super::*;
    use crate::test_env::ManualEnv;

    fn addr(id: u8) -> PrivateAddress {
        PrivateAddress::for_rover(id)
    }

    fn public(last: u8) -> PublicAddress {
        PublicAddress::new(std::net::Ipv4Addr::new(192, 168, 1, last))
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_dead_interval() {
        let env = ManualEnv::new();
        let (tx, mut rx) = mpsc::channel(8);
        let timers = NeighborTimers::new(env, tx);

        timers.touch(addr(2), public(2));

        tokio::time::advance(DEAD_INTERVAL + Duration::from_millis(1)).await;

        let event = rx.recv().await.expect("timer should have fired");
        match event {
            NeighborEvent::Dead { private, public: pub_addr } => {
                assert_eq!(private, addr(2));
                assert_eq!(pub_addr, public(2));
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn touch_resets_the_timer() {
        let env = ManualEnv::new();
        let (tx, mut rx) = mpsc::channel(8);
        let timers = NeighborTimers::new(env, tx);

        timers.touch(addr(2), public(2));
        tokio::time::advance(Duration::from_secs(5)).await;
        timers.touch(addr(2), public(2)); // heartbeat refresh before it would fire

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "timer should not have fired yet");

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_timer() {
        let env = ManualEnv::new();
        let (tx, mut rx) = mpsc::channel(8);
        let timers = NeighborTimers::new(env, tx);

        timers.touch(addr(2), public(2));
        timers.cancel(addr(2));

        tokio::time::advance(DEAD_INTERVAL * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn neighbor_cache_records_last_advertisement() {
        let cache = NeighborCache::new();
        let frame = AdvertisementFrame::new(Command::Update, 2, vec![]);
        cache.record(addr(2), public(2), frame.clone());

        let (cached_frame, cached_public) = cache.last(addr(2)).unwrap();
        assert_eq!(cached_frame, frame);
        assert_eq!(cached_public, public(2));
    }
}
