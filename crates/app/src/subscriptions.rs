//! Subscription table: live subscriptions keyed by target and attribute.
//!
//! The table is an arena of plain records. The scheduler only ever holds
//! keys; it looks entries up again when it needs them, so removing an entry
//! never has to chase references held elsewhere.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use owbridge_domain::channel::Channel;
use owbridge_domain::subscription::SubscriptionKey;
use tokio::sync::Notify;
use tokio::time::Instant;

/// A live periodic read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub key: SubscriptionKey,
    pub interval: Duration,
    /// Next time the scheduler fires this entry.
    pub deadline: Instant,
    /// Channel the device last answered on. Always `None` for family targets.
    pub channel: Option<Channel>,
    /// Set once the read that follows the acknowledgement has been published.
    /// Unprimed entries are never fired by the scheduler.
    pub primed: bool,
    /// A scheduled read for this entry has not finished yet. At most one
    /// read per key is outstanding; the entry is not fired again until
    /// [`SubscriptionTable::finish`] is called.
    pub in_flight: bool,
}

impl Subscription {
    fn is_idle(&self) -> bool {
        self.primed && !self.in_flight
    }
}

/// Result of [`SubscriptionTable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    Updated,
}

/// Shared subscription table.
///
/// Every mutation wakes the scheduler so it can recompute its next deadline.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: Mutex<BTreeMap<SubscriptionKey, Subscription>>,
    changed: Notify,
}

impl SubscriptionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SubscriptionKey, Subscription>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an entry, or update the interval of an existing one.
    ///
    /// Either way the next deadline becomes `now + interval`.
    pub fn subscribe(&self, key: SubscriptionKey, interval: Duration, now: Instant) -> SubscribeOutcome {
        let outcome = {
            let mut entries = self.lock();
            if let Some(existing) = entries.get_mut(&key) {
                existing.interval = interval;
                existing.deadline = now + interval;
                SubscribeOutcome::Updated
            } else {
                entries.insert(
                    key,
                    Subscription {
                        key,
                        interval,
                        deadline: now + interval,
                        channel: None,
                        primed: false,
                        in_flight: false,
                    },
                );
                SubscribeOutcome::Created
            }
        };
        self.changed.notify_one();
        outcome
    }

    /// Allow the scheduler to fire `key`. No-op if it was removed meanwhile.
    pub fn prime(&self, key: SubscriptionKey) {
        if let Some(entry) = self.lock().get_mut(&key) {
            entry.primed = true;
        }
        self.changed.notify_one();
    }

    /// Remove an entry. Returns whether it existed.
    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        let removed = self.lock().remove(&key).is_some();
        if removed {
            self.changed.notify_one();
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
        self.changed.notify_one();
    }

    /// Collect idle primed entries whose deadline has elapsed, mark each in
    /// flight and reschedule it to `now + interval`.
    pub fn take_due(&self, now: Instant) -> Vec<SubscriptionKey> {
        let mut entries = self.lock();
        entries
            .values_mut()
            .filter(|entry| entry.is_idle() && entry.deadline <= now)
            .map(|entry| {
                entry.deadline = now + entry.interval;
                entry.in_flight = true;
                entry.key
            })
            .collect()
    }

    /// Mark the read started by [`take_due`](Self::take_due) as done.
    /// No-op if the entry was removed meanwhile.
    pub fn finish(&self, key: SubscriptionKey) {
        if let Some(entry) = self.lock().get_mut(&key) {
            entry.in_flight = false;
        }
        self.changed.notify_one();
    }

    /// Earliest deadline among entries the scheduler may fire.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock()
            .values()
            .filter(|entry| entry.is_idle())
            .map(|entry| entry.deadline)
            .min()
    }

    /// Remember the channel a subscribed device answered on.
    pub fn record_channel(&self, key: SubscriptionKey, channel: Channel) {
        if let Some(entry) = self.lock().get_mut(&key) {
            entry.channel = Some(channel);
        }
    }

    #[must_use]
    pub fn get(&self, key: SubscriptionKey) -> Option<Subscription> {
        self.lock().get(&key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until the table changes.
    ///
    /// A change that happened since the last wait completes immediately.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ds18b20;
    use owbridge_domain::attribute::Attribute;
    use owbridge_domain::family::FamilyCode;
    use owbridge_domain::request::Target;

    fn key() -> SubscriptionKey {
        SubscriptionKey::new(Target::Device(ds18b20()), Attribute::Temperature)
    }

    fn family_key() -> SubscriptionKey {
        SubscriptionKey::new(Target::Family(FamilyCode::DS18B20), Attribute::Temperature)
    }

    #[test]
    fn should_create_unprimed_entry_with_deadline() {
        let table = SubscriptionTable::new();
        let now = Instant::now();

        let outcome = table.subscribe(key(), Duration::from_secs(1), now);

        assert_eq!(outcome, SubscribeOutcome::Created);
        let entry = table.get(key()).unwrap();
        assert_eq!(entry.deadline, now + Duration::from_secs(1));
        assert!(!entry.primed);
        assert_eq!(entry.channel, None);
    }

    #[test]
    fn should_keep_single_entry_with_latest_interval() {
        let table = SubscriptionTable::new();
        let now = Instant::now();

        table.subscribe(key(), Duration::from_secs(1), now);
        table.subscribe(key(), Duration::from_secs(2), now);
        let outcome = table.subscribe(key(), Duration::from_secs(5), now);

        assert_eq!(outcome, SubscribeOutcome::Updated);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(key()).unwrap().interval, Duration::from_secs(5));
    }

    #[test]
    fn should_distinguish_device_and_family_keys() {
        let table = SubscriptionTable::new();
        let now = Instant::now();

        table.subscribe(key(), Duration::from_secs(1), now);
        table.subscribe(family_key(), Duration::from_secs(1), now);

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn should_report_missing_entry_on_unsubscribe() {
        let table = SubscriptionTable::new();
        assert!(!table.unsubscribe(key()));
        assert!(table.is_empty());
    }

    #[test]
    fn should_skip_unprimed_entries() {
        let table = SubscriptionTable::new();
        let now = Instant::now();
        table.subscribe(key(), Duration::from_secs(1), now);

        let later = now + Duration::from_secs(3);
        assert!(table.take_due(later).is_empty());
        assert_eq!(table.next_deadline(), None);

        table.prime(key());
        assert_eq!(table.take_due(later), vec![key()]);
    }

    #[test]
    fn should_reschedule_from_firing_time() {
        let table = SubscriptionTable::new();
        let now = Instant::now();
        table.subscribe(key(), Duration::from_secs(1), now);
        table.prime(key());

        let fired_at = now + Duration::from_millis(1200);
        table.take_due(fired_at);

        assert_eq!(table.next_deadline(), Some(fired_at + Duration::from_secs(1)));
        assert!(table.take_due(fired_at).is_empty());
    }

    #[test]
    fn should_not_fire_entry_again_until_finished() {
        let table = SubscriptionTable::new();
        let now = Instant::now();
        table.subscribe(key(), Duration::from_millis(100), now);
        table.prime(key());

        let first = now + Duration::from_millis(100);
        assert_eq!(table.take_due(first), vec![key()]);
        assert!(table.get(key()).unwrap().in_flight);

        let later = now + Duration::from_secs(2);
        assert!(table.take_due(later).is_empty());
        assert_eq!(table.next_deadline(), None);

        table.finish(key());
        assert_eq!(table.next_deadline(), Some(first + Duration::from_millis(100)));
        assert_eq!(table.take_due(later), vec![key()]);
    }

    #[test]
    fn should_ignore_finish_after_removal() {
        let table = SubscriptionTable::new();
        let now = Instant::now();
        table.subscribe(key(), Duration::from_secs(1), now);
        table.prime(key());
        table.take_due(now + Duration::from_secs(1));
        table.unsubscribe(key());

        table.finish(key());

        assert!(table.is_empty());
    }

    #[test]
    fn should_ignore_prime_after_removal() {
        let table = SubscriptionTable::new();
        table.subscribe(key(), Duration::from_secs(1), Instant::now());
        table.unsubscribe(key());

        table.prime(key());

        assert!(table.is_empty());
    }

    #[test]
    fn should_record_channel() {
        let table = SubscriptionTable::new();
        table.subscribe(key(), Duration::from_secs(1), Instant::now());

        table.record_channel(key(), Channel(3));

        assert_eq!(table.get(key()).unwrap().channel, Some(Channel(3)));
    }

    #[tokio::test]
    async fn should_wake_waiter_on_change() {
        let table = SubscriptionTable::new();
        table.subscribe(key(), Duration::from_secs(1), Instant::now());
        // the stored permit completes the wait
        table.changed().await;
    }
}
