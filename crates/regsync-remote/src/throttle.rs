use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use regsync_config::throttle::CallClassSettings;
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    time::Instant,
};

/// The four classes of remote call, each throttled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    Cli,
    Api,
    Asset,
    Feed,
}

impl CallClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallClass::Cli => "cli",
            CallClass::Api => "api",
            CallClass::Asset => "asset",
            CallClass::Feed => "feed",
        }
    }
}

/// Bounds both the rate and the concurrency of one call class.
///
/// `acquire` first waits for one of `max_concurrent` slots, then for the next time slot of
/// the leaky bucket (one permit per `min_interval`). The returned token holds the slot
/// until dropped.
#[derive(Debug)]
pub struct Throttle {
    class: CallClass,
    min_interval: Duration,
    slots: Arc<Semaphore>,
    next_permit: Mutex<Instant>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Capability for one in-flight operation. Releases its slot on drop.
#[derive(Debug)]
pub struct ThrottleToken {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ThrottleToken {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Throttle {
    pub fn new(class: CallClass, min_interval: Duration, max_concurrent: usize) -> Self {
        Self {
            class,
            min_interval,
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            next_permit: Mutex::new(Instant::now()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_settings(class: CallClass, settings: &CallClassSettings) -> Self {
        Self::new(class, settings.min_interval(), settings.max_concurrent)
    }

    pub fn class(&self) -> CallClass {
        self.class
    }

    pub async fn acquire(&self) -> ThrottleToken {
        // The semaphore is owned by `self` and never closed.
        let permit = match self.slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("throttle semaphore closed"),
        };

        let wait_until = {
            let mut next = self
                .next_permit
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = (*next).max(Instant::now());
            *next = slot + self.min_interval;
            slot
        };
        tokio::time::sleep_until(wait_until).await;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        ThrottleToken {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Operations of this class currently holding a token.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held tokens seen so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
