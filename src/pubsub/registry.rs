//! Channel Registry
//!
//! Maps each channel name to the ordered list of subscriber registrations
//! that receive its messages.
//!
//! ## Rules
//!
//! - Insertion order is delivery order.
//! - Subscribing twice to the same channel registers twice, and every
//!   publish then delivers the message twice.
//! - A channel entry appears on the first subscribe or publish and stays
//!   until the registry is flushed, even when its list becomes empty.
//! - Registrations hold weak references. Registrations of dropped
//!   subscribers are pruned on the next publish to their channel.

use crate::pubsub::subscriber::{Inbox, Subscriber, SubscriberId};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;
use tracing::{debug, trace};

/// One subscriber's entry in a channel's delivery list.
#[derive(Debug, Clone)]
struct Registration {
    id: SubscriberId,
    inbox: Weak<Inbox>,
}

/// Channel name -> ordered registrations.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: Mutex<HashMap<Bytes, Vec<Registration>>>,

    /// Statistics: total messages appended to inboxes
    delivered_count: AtomicU64,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber` on every channel in `channels`, in order.
    ///
    /// # Returns
    ///
    /// The number of channels subscribed (duplicates included).
    pub fn subscribe(&self, subscriber: &Subscriber, channels: &[Bytes]) -> usize {
        let mut registry = self.channels.lock();
        for channel in channels {
            registry
                .entry(channel.clone())
                .or_default()
                .push(Registration {
                    id: subscriber.id(),
                    inbox: subscriber.downgrade(),
                });
            debug!(subscriber = %subscriber.id(), channel = ?channel, "Subscribed");
        }
        channels.len()
    }

    /// Removes the first registration of `subscriber` from each channel.
    ///
    /// Channels the subscriber never joined are skipped silently; their
    /// entries (if any) are left in place.
    ///
    /// # Returns
    ///
    /// The number of registrations actually removed.
    pub fn unsubscribe(&self, subscriber: &Subscriber, channels: &[Bytes]) -> usize {
        let mut registry = self.channels.lock();
        let mut removed = 0;
        for channel in channels {
            let Some(registrations) = registry.get_mut(channel) else {
                continue;
            };
            if let Some(pos) = registrations.iter().position(|r| r.id == subscriber.id()) {
                registrations.remove(pos);
                removed += 1;
                debug!(subscriber = %subscriber.id(), channel = ?channel, "Unsubscribed");
            }
        }
        removed
    }

    /// Delivers `message` to every live registration on `channel`.
    ///
    /// The message is in each inbox by the time this returns, so a
    /// subsequent pop on the same subscriber observes it.
    ///
    /// # Returns
    ///
    /// The number of registrations the message was delivered to.
    pub fn publish(&self, channel: Bytes, message: Bytes) -> usize {
        let mut registry = self.channels.lock();
        let registrations = registry.entry(channel).or_default();

        registrations.retain(|r| r.inbox.strong_count() > 0);

        let mut delivered = 0;
        for registration in registrations.iter() {
            if let Some(inbox) = registration.inbox.upgrade() {
                inbox.push(message.clone());
                delivered += 1;
                trace!(subscriber = %registration.id, "Delivered message");
            }
        }

        self.delivered_count
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    /// Returns the names of all known channels, sorted.
    pub fn channels(&self) -> Vec<Bytes> {
        let mut names: Vec<Bytes> = self.channels.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns true if the channel has an entry (possibly empty).
    pub fn contains(&self, channel: &[u8]) -> bool {
        self.channels.lock().contains_key(channel)
    }

    /// Returns the number of live registrations on a channel, which is
    /// what a publish to it would report right now.
    pub fn subscriber_count(&self, channel: &[u8]) -> usize {
        self.channels
            .lock()
            .get(channel)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| r.inbox.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns the total number of messages delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// Removes every channel entry.
    pub fn flush(&self) {
        self.channels.lock().clear();
    }
}
