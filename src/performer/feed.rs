#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use super::PerformerSnapshot;

/// Anything the engine can pull the latest snapshot batch from.
///
/// Called once per scheduler poll. Returns `None` when nothing new arrived,
/// in which case the engine keeps using the previous batch.
pub trait SnapshotSource: Send {
    fn latest(&mut self) -> Option<Vec<PerformerSnapshot>>;
}

/// Create a lock-free parameter feed.
///
/// The sender lives with the (slow, jittery) tracking loop, the receiver with
/// the scheduler. Only the newest batch matters, so the receiver drains
/// everything queued and keeps the last one.
#[cfg(feature = "rtrb")]
pub fn parameter_feed(capacity: usize) -> (FeedSender, FeedReceiver) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    (FeedSender { tx }, FeedReceiver { rx })
}

#[cfg(feature = "rtrb")]
pub struct FeedSender {
    tx: Producer<Vec<PerformerSnapshot>>,
}

#[cfg(feature = "rtrb")]
impl FeedSender {
    /// Publish one tick's snapshots. Returns false if the scheduler has fallen
    /// so far behind that the ring is full; the batch is dropped and the next
    /// tick supersedes it anyway.
    pub fn publish(&mut self, batch: Vec<PerformerSnapshot>) -> bool {
        match self.tx.push(batch) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("parameter feed full, dropping snapshot batch");
                false
            }
        }
    }
}

#[cfg(feature = "rtrb")]
pub struct FeedReceiver {
    rx: Consumer<Vec<PerformerSnapshot>>,
}

#[cfg(feature = "rtrb")]
impl SnapshotSource for FeedReceiver {
    fn latest(&mut self) -> Option<Vec<PerformerSnapshot>> {
        let mut newest = None;
        while let Ok(batch) = self.rx.pop() {
            newest = Some(batch);
        }
        newest
    }
}
