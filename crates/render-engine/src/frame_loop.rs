//! Per-frame callback registry.
//!
//! The host drives a [`FrameLoop`] by calling [`FrameLoop::tick`] once per
//! rendered frame. Subscribers hold a [`FrameSubscription`]; dropping it
//! unsubscribes synchronously, so no callback fires after teardown.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Data passed to every frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Monotonic frame counter, starting at 0.
    pub index: u64,
    /// Host monotonic time in seconds.
    pub now_secs: f64,
}

type Callback = Rc<RefCell<dyn FnMut(FrameTick)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    frame_index: u64,
    callbacks: Vec<(u64, Callback)>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.callbacks.iter().any(|(cb_id, _)| *cb_id == id)
    }
}

/// A frame-driven callback loop.
#[derive(Clone, Default)]
pub struct FrameLoop {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("FrameLoop")
            .field("frame_index", &registry.frame_index)
            .field("subscribers", &registry.callbacks.len())
            .finish()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run on every tick until the returned
    /// subscription is dropped.
    pub fn subscribe<F>(&self, callback: F) -> FrameSubscription
    where
        F: FnMut(FrameTick) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let callback: Callback = Rc::new(RefCell::new(callback));
        registry.callbacks.push((id, callback));
        FrameSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Run one frame. Returns the number of callbacks invoked.
    ///
    /// Callbacks unsubscribed by an earlier callback in the same frame are
    /// skipped. Callbacks registered during the frame first run on the next.
    pub fn tick(&self, now_secs: f64) -> usize {
        let (index, snapshot) = {
            let mut registry = self.registry.borrow_mut();
            let index = registry.frame_index;
            registry.frame_index += 1;
            let snapshot: Vec<(u64, Callback)> = registry
                .callbacks
                .iter()
                .map(|(id, cb)| (*id, Rc::clone(cb)))
                .collect();
            (index, snapshot)
        };

        let tick = FrameTick { index, now_secs };
        let mut invoked = 0;
        for (id, callback) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            // A callback that re-enters `tick` would find itself borrowed.
            let Ok(mut callback) = callback.try_borrow_mut() else {
                tracing::warn!(subscriber = id, "Skipping re-entrant frame callback");
                continue;
            };
            (&mut *callback)(tick);
            invoked += 1;
        }
        invoked
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().callbacks.len()
    }

    /// Frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.registry.borrow().frame_index
    }
}

/// Keeps a frame callback registered. Dropping it unsubscribes.
#[derive(Debug)]
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct FrameSubscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl FrameSubscription {
    /// Unsubscribe now. Equivalent to dropping.
    pub fn cancel(self) {}

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().contains(self.id))
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = match registry.try_borrow_mut() {
            Ok(mut registry) => registry
                .callbacks
                .iter()
                .position(|(id, _)| *id == self.id)
                .map(|index| registry.callbacks.remove(index)),
            Err(_) => {
                tracing::warn!(
                    subscriber = self.id,
                    "Frame registry busy, callback left registered"
                );
                None
            }
        };
        // The callback may own further subscriptions; release it only after
        // the registry borrow has ended.
        drop(removed);
    }
}
