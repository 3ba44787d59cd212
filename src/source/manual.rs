use std::sync::{Arc, Mutex, MutexGuard};

use super::{PositionSource, SubscriptionId, WatchOptions};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    active: Option<SubscriptionId>,
    options: Option<WatchOptions>,
    cancelled: Vec<SubscriptionId>,
}

/// Source whose events are pushed by the caller. Clones share state, so a
/// handle kept outside the controller can inspect the subscription.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    inner: Arc<Mutex<Inner>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn active(&self) -> Option<SubscriptionId> {
        self.lock().active
    }

    pub fn last_options(&self) -> Option<WatchOptions> {
        self.lock().options.clone()
    }

    pub fn cancelled(&self) -> Vec<SubscriptionId> {
        self.lock().cancelled.clone()
    }
}

impl PositionSource for ManualSource {
    fn subscribe(&mut self, options: &WatchOptions) -> SubscriptionId {
        let mut locked = self.lock();
        locked.next_id += 1;
        let id = SubscriptionId(locked.next_id);
        locked.active = Some(id);
        locked.options = Some(options.clone());
        id
    }

    fn cancel(&mut self, subscription: SubscriptionId) {
        let mut locked = self.lock();
        if locked.active == Some(subscription) {
            locked.active = None;
        }
        locked.cancelled.push(subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resubscribe_replaces_active() {
        let handle = ManualSource::new();
        let mut source = handle.clone();
        let first = source.subscribe(&WatchOptions::default());
        let second = source.subscribe(&WatchOptions::default());
        assert_ne!(first, second);
        assert_eq!(handle.active(), Some(second));

        source.cancel(first);
        assert_eq!(handle.active(), Some(second));
        source.cancel(second);
        assert_eq!(handle.active(), None);
        assert_eq!(handle.cancelled(), vec![first, second]);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let handle = ManualSource::new();
        let mut source = handle.clone();
        let shared = handle.inner.clone();
        let join = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("panic while holding the source");
        });
        assert!(join.join().is_err());

        let id = source.subscribe(&WatchOptions::default());
        assert_eq!(handle.active(), Some(id));
    }
}
