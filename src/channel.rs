//! Job and result channels with delivery counters
//!
//! Thin wrappers around `flume` that count sends and receives, so a pool can
//! report how many jobs it dispatched and how many results it collected.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache line size for padding (typically 64 bytes on x86-64)
const CACHE_LINE_SIZE: usize = 64;

/// Delivery counters shared by both halves of a channel
#[repr(align(64))] // Align to cache line
#[derive(Debug)]
pub struct ChannelStats {
    /// Number of messages sent
    pub messages_sent: AtomicU64,

    /// Number of messages received
    pub messages_received: AtomicU64,

    /// Number of failed sends
    pub send_errors: AtomicU64,

    _padding: [u8; CACHE_LINE_SIZE - 24],
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - 24],
        }
    }
}

impl ChannelStats {
    /// Get the number of messages sent
    pub fn sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Get the number of messages received
    pub fn received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Get the number of failed sends
    pub fn send_errors(&self) -> u64 {
        self.send_errors.load(Ordering::Relaxed)
    }
}

/// Sender half of a channel
pub struct Sender<T> {
    inner: flume::Sender<T>,
    stats: Arc<ChannelStats>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> Sender<T> {
    /// Send a message through the channel
    pub fn send(&self, msg: T) -> Result<()> {
        match self.inner.send(msg) {
            Ok(()) => {
                self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors.fetch_add(1, Ordering::Relaxed);
                Err(Error::from(e))
            }
        }
    }

    /// Get channel statistics
    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }
}

/// Receiver half of a channel
pub struct Receiver<T> {
    inner: flume::Receiver<T>,
    stats: Arc<ChannelStats>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> Receiver<T> {
    /// Block until a message arrives or every sender is gone
    pub fn recv(&self) -> Result<T> {
        let msg = self.inner.recv()?;
        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);
        Ok(msg)
    }

    /// Create an iterator that ends once every sender is gone
    pub fn iter(&self) -> ReceiverIterator<'_, T> {
        ReceiverIterator { receiver: self }
    }

    /// Get channel statistics
    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }
}

/// Iterator for receiving messages
pub struct ReceiverIterator<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<'a, T> Iterator for ReceiverIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

/// Channel factory
pub struct Channel;

impl Channel {
    fn wrap<T>((tx, rx): (flume::Sender<T>, flume::Receiver<T>)) -> (Sender<T>, Receiver<T>) {
        let stats = Arc::new(ChannelStats::default());
        (
            Sender {
                inner: tx,
                stats: Arc::clone(&stats),
            },
            Receiver { inner: rx, stats },
        )
    }

    /// Create a bounded channel, shareable by many producers and consumers
    pub fn mpmc<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
        Self::wrap(flume::bounded(capacity))
    }

    /// Create an unbounded channel
    pub fn unbounded<T>() -> (Sender<T>, Receiver<T>) {
        Self::wrap(flume::unbounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_stats() {
        let (tx, rx) = Channel::mpmc::<i32>(10);

        for i in 0..5 {
            tx.send(i).unwrap();
        }

        for _ in 0..5 {
            rx.recv().unwrap();
        }

        assert_eq!(tx.stats().sent(), 5);
        assert_eq!(rx.stats().received(), 5);
    }

    #[test]
    fn test_iter_ends_when_senders_drop() {
        let (tx, rx) = Channel::unbounded::<i32>();
        let tx2 = tx.clone();

        tx.send(1).unwrap();
        tx2.send(2).unwrap();
        drop(tx);
        drop(tx2);

        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(rx.stats().received(), 2);
    }

    #[test]
    fn test_send_after_receiver_drop_is_counted() {
        let (tx, rx) = Channel::unbounded::<i32>();
        drop(rx);

        assert!(matches!(tx.send(1), Err(Error::SendError(_))));
        assert_eq!(tx.stats().send_errors(), 1);
        assert_eq!(tx.stats().sent(), 0);
    }
}
