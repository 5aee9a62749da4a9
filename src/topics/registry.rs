//! # Topic registry - topic records and their subscriber lists.
//!
//! The registry owns every [`TopicRecord`]; it is not synchronized itself, the
//! [`Mediator`](crate::Mediator) keeps it behind one mutex and calls in here only
//! while holding it.
//!
//! ## Architecture
//! ```text
//! TopicRegistry
//!   ├─► TopicRecord { (User, <unnamed>) } ─► [entry#1, entry#4]
//!   ├─► TopicRecord { (User, "admin")   } ─► [entry#2]
//!   └─► TopicRecord { (dyn Named, ...)  } ─► [entry#3]
//!
//! subscribe    ─► add(key, entry)                       exact key, create lazily
//! unsubscribe  ─► remove_where(key, pred)               exact key, record stays
//! publish      ─► snapshot_and_prune(name, lineage)     assignable types, exact name
//! unsub all    ─► remove_subscriber_everywhere(sub)     every record
//! ```
//!
//! ## Rules
//! - At most one record per [`TopicKey`]; records keep creation order (traversal order).
//! - Records are removed only when pruning dead subscribers empties them.
//! - Removed entries are handed back to the caller so they are dropped outside the lock.

use std::sync::Arc;

use crate::subscribers::entry::AnySubscriber;
use crate::subscribers::SubscriberEntry;
use crate::topics::hierarchy::Lineage;
use crate::topics::{TopicKey, TopicName, TopicType};

/// Subscribers registered for one exact topic key.
#[derive(Debug)]
pub struct TopicRecord {
    key: TopicKey,
    subscribers: Vec<SubscriberEntry>,
}

impl TopicRecord {
    fn new(key: TopicKey) -> Self {
        Self {
            key,
            subscribers: Vec::new(),
        }
    }

    /// Topic key.
    pub fn key(&self) -> &TopicKey {
        &self.key
    }

    fn matches(&self, name: &TopicName, lineage: &Lineage) -> bool {
        self.key.name() == name && lineage.contains(self.key.ty())
    }
}

/// Entry found alive by a publish scan, with the strong reference taken for the call.
pub(crate) struct LiveTarget {
    pub(crate) record_type: TopicType,
    pub(crate) entry: SubscriberEntry,
    pub(crate) subscriber: AnySubscriber,
}

/// Result of the serialized scan phase of one publish.
#[derive(Default)]
pub(crate) struct Scan {
    pub(crate) topics: usize,
    pub(crate) live: Vec<LiveTarget>,
    pub(crate) pruned: Vec<SubscriberEntry>,
    pub(crate) removed_topics: Vec<TopicKey>,
}

/// Ordered collection of topic records.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    records: Vec<TopicRecord>,
    next_id: u64,
}

impl TopicRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a unique entry id.
    pub(crate) fn next_entry_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Appends `entry` to the record for `key`, creating the record if absent.
    pub fn add(&mut self, key: TopicKey, entry: SubscriberEntry) {
        match self.records.iter_mut().find(|r| r.key == key) {
            Some(record) => record.subscribers.push(entry),
            None => {
                let mut record = TopicRecord::new(key);
                record.subscribers.push(entry);
                self.records.push(record);
            }
        }
    }

    /// Removes the entries of `key` matching `pred`; the record itself is kept.
    pub fn remove_where<P>(&mut self, key: &TopicKey, mut pred: P) -> Vec<SubscriberEntry>
    where
        P: FnMut(&SubscriberEntry) -> bool,
    {
        let Some(record) = self.records.iter_mut().find(|r| &r.key == key) else {
            return Vec::new();
        };
        drain_where(&mut record.subscribers, &mut pred)
    }

    /// Records whose name equals `name` and whose type is in `lineage`, in traversal order.
    pub(crate) fn find_matching<'a>(
        &'a self,
        name: &'a TopicName,
        lineage: &'a Lineage,
    ) -> impl Iterator<Item = &'a TopicRecord> + 'a {
        self.records.iter().filter(move |r| r.matches(name, lineage))
    }

    /// Removes every live entry of `subscriber` from every record.
    ///
    /// Dead entries are left alone; the next publish on their topic prunes them.
    pub fn remove_subscriber_everywhere<S: ?Sized>(
        &mut self,
        subscriber: &Arc<S>,
    ) -> Vec<SubscriberEntry> {
        let mut removed = Vec::new();
        for record in &mut self.records {
            removed.extend(drain_where(&mut record.subscribers, &mut |e: &SubscriberEntry| {
                e.subscriber.points_to(subscriber)
            }));
        }
        removed
    }

    /// Scan phase of publish: snapshot live entries of matching records, prune dead ones,
    /// and drop records that pruning left empty.
    pub(crate) fn snapshot_and_prune(&mut self, name: &TopicName, lineage: &Lineage) -> Scan {
        let mut scan = Scan::default();
        let mut emptied = Vec::new();

        for (idx, record) in self.records.iter_mut().enumerate() {
            if !record.matches(name, lineage) {
                continue;
            }
            scan.topics += 1;

            let before = scan.pruned.len();
            let mut kept = Vec::with_capacity(record.subscribers.len());
            for entry in record.subscribers.drain(..) {
                match entry.subscriber.upgrade() {
                    Some(subscriber) => {
                        scan.live.push(LiveTarget {
                            record_type: record.key.ty(),
                            entry: entry.clone(),
                            subscriber,
                        });
                        kept.push(entry);
                    }
                    None => scan.pruned.push(entry),
                }
            }
            record.subscribers = kept;

            if scan.pruned.len() > before && record.subscribers.is_empty() {
                emptied.push(idx);
            }
        }

        for idx in emptied.into_iter().rev() {
            let record = self.records.remove(idx);
            scan.removed_topics.push(record.key);
        }
        scan.removed_topics.reverse();
        scan
    }

    /// Keys of all records, in traversal order.
    pub fn keys(&self) -> Vec<TopicKey> {
        self.records.iter().map(|r| r.key.clone()).collect()
    }

    /// Number of entries (live or not yet pruned) registered under `key`.
    pub fn subscriber_count(&self, key: &TopicKey) -> usize {
        self.records
            .iter()
            .find(|r| &r.key == key)
            .map_or(0, |r| r.subscribers.len())
    }

    /// Number of topic records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Removes every record and returns them.
    pub fn clear(&mut self) -> Vec<TopicRecord> {
        std::mem::take(&mut self.records)
    }
}

fn drain_where<P>(entries: &mut Vec<SubscriberEntry>, pred: &mut P) -> Vec<SubscriberEntry>
where
    P: FnMut(&SubscriberEntry) -> bool,
{
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        if pred(&entry) {
            removed.push(entry);
        } else {
            kept.push(entry);
        }
    }
    *entries = kept;
    removed
}
