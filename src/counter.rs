//! Shared click counter with push updates and optional JSON-lines snapshots.

use crate::render::counter_label;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub const VIDEO_HUB_FIELD: &str = "video_hub_clicks";

const SNAPSHOT_INTERVAL_SECS: u64 = 60;

type Subscriber = Arc<dyn Fn(u64) + Send + Sync>;

#[derive(Clone)]
pub struct ClickCounter {
    shared: Arc<CounterShared>,
}

struct CounterShared {
    inner: RwLock<CounterData>,
    subscribers: RwLock<Vec<(u64, Subscriber)>>,
    next_subscriber: AtomicU64,
    persistence: CounterPersistence,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CounterData {
    #[serde(default)]
    fields: BTreeMap<String, u64>,
}

impl ClickCounter {
    /// Counter restored from, and periodically appended to, `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = restore(&path).unwrap_or_default();
        Self::with_state(data, Some(path))
    }

    pub fn ephemeral() -> Self {
        Self::with_state(CounterData::default(), None)
    }

    fn with_state(data: CounterData, path: Option<PathBuf>) -> Self {
        Self {
            shared: Arc::new(CounterShared {
                inner: RwLock::new(data),
                subscribers: RwLock::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
                persistence: CounterPersistence::new(path),
            }),
        }
    }

    /// Best-effort `+1` on the video hub field. Returns the new value.
    pub fn increment(&self) -> u64 {
        self.increment_field(VIDEO_HUB_FIELD)
    }

    pub fn increment_field(&self, field: &str) -> u64 {
        let mut guard = self.shared.inner.write();
        let slot = guard.fields.entry(field.to_string()).or_default();
        *slot = slot.saturating_add(1);
        let value = *slot;
        let snapshot = self
            .shared
            .persistence
            .should_snapshot()
            .then(|| guard.clone());
        drop(guard);
        if let Some(snapshot) = snapshot {
            self.shared.persistence.write_snapshot(&snapshot);
        }
        if field == VIDEO_HUB_FIELD {
            self.notify(value);
        }
        value
    }

    /// Current video hub count, `0` until the first click.
    pub fn count(&self) -> u64 {
        self.field(VIDEO_HUB_FIELD)
    }

    pub fn field(&self, field: &str) -> u64 {
        self.shared.inner.read().fields.get(field).copied().unwrap_or(0)
    }

    pub fn label(&self) -> String {
        counter_label(self.count())
    }

    /// Register for every new value. The callback also runs once right away
    /// with the current value, and stays registered until the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let callback: Subscriber = Arc::new(callback);
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.shared
            .subscribers
            .write()
            .push((id, Arc::clone(&callback)));
        callback(self.count());
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.read().len()
    }

    fn notify(&self, value: u64) {
        let subscribers: Vec<Subscriber> = self
            .shared
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(value);
        }
    }

    /// Write a snapshot now regardless of the interval.
    pub fn flush(&self) {
        let snapshot = self.shared.inner.read().clone();
        self.shared.persistence.write_snapshot(&snapshot);
    }
}

/// Handle returned by [`ClickCounter::subscribe`].
pub struct Subscription {
    shared: Weak<CounterShared>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.subscribers.write().retain(|(id, _)| *id != self.id);
        }
    }
}

struct CounterPersistence {
    path: Option<PathBuf>,
    last_flush: AtomicU64,
}

impl CounterPersistence {
    fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            last_flush: AtomicU64::new(0),
        }
    }

    fn should_snapshot(&self) -> bool {
        if self.path.is_none() {
            return false;
        }
        let last = self.last_flush.load(Ordering::Relaxed);
        now_ts().saturating_sub(last) >= SNAPSHOT_INTERVAL_SECS
    }

    fn write_snapshot(&self, data: &CounterData) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(error = %err, "failed to create counter directory");
                return;
            }
        }
        let snapshot = CounterSnapshot {
            captured_at: now_ts(),
            fields: data.fields.clone(),
        };
        let mut line = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to serialize counter snapshot");
                return;
            }
        };
        line.push(b'\n');
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(mut file) => {
                if let Err(err) = file.write_all(&line) {
                    warn!(error = %err, "failed to write counter snapshot");
                    return;
                }
                self.last_flush.store(now_ts(), Ordering::Release);
            }
            Err(err) => warn!(error = %err, "failed to open counter snapshot file"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CounterSnapshot {
    captured_at: u64,
    fields: BTreeMap<String, u64>,
}

/// Last complete snapshot line wins; unreadable files start from zero.
fn restore(path: &Path) -> Option<CounterData> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(error = %err, path = %path.display(), "failed to read counter snapshots");
            return None;
        }
    };
    text.lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .find_map(|line| serde_json::from_str::<CounterSnapshot>(line).ok())
        .map(|snapshot| CounterData {
            fields: snapshot.fields,
        })
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "playbook-counter-{name}-{}-{nanos}.jsonl",
            std::process::id()
        ))
    }

    #[test]
    fn starts_at_zero_and_counts_up() {
        let counter = ClickCounter::ephemeral();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.label(), "Total Clicks: 0");
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.label(), "Total Clicks: 2");
        assert_eq!(counter.field("other"), 0);
    }

    #[test]
    fn subscribers_see_current_and_new_values() {
        let counter = ClickCounter::ephemeral();
        counter.increment();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = counter.subscribe(move |value| sink.lock().push(value));
        counter.increment();
        counter.increment_field("unrelated");
        counter.increment();
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(counter.subscriber_count(), 1);
        drop(subscription);
        counter.increment();
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(counter.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let counter = ClickCounter::ephemeral();
        let other = counter.clone();
        other.increment();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn persistent_counter_restores_last_snapshot() {
        let path = scratch_path("restore");
        {
            let counter = ClickCounter::persistent(&path);
            counter.increment();
            counter.increment();
            counter.increment();
            counter.flush();
        }
        let restored = ClickCounter::persistent(&path);
        assert_eq!(restored.count(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_snapshot_lines_are_skipped() {
        let path = scratch_path("corrupt");
        fs::write(
            &path,
            "{\"captured_at\":1,\"fields\":{\"video_hub_clicks\":7}}\nnot json\n",
        )
        .unwrap();
        assert_eq!(ClickCounter::persistent(&path).count(), 7);
        let _ = fs::remove_file(&path);
    }
}
