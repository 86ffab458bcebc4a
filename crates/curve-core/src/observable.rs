//! Observer registry and begin/end update propagation.
//!
//! Every curve embeds an [`UpdateNotifier`]. A mutation of a leaf calls
//! `begin_update(interval)` before touching its data and
//! `end_update(interval)` afterwards. Each derived curve registers an
//! [`Observer`] on its inputs whose callbacks translate the interval and
//! call `begin_update` / `end_update` on the derived curve's own notifier,
//! so a single mutation walks the whole dependency graph synchronously.
//!
//! A curve reached along several paths (a diamond) receives one
//! begin/end pair per path. The notifier counts pending begins and only
//! fans out to its own observers on the first begin and the last end of a
//! pass, with the union of every interval seen in between.
//!
//! Callbacks are cloned out of the registry before they run, so a callback
//! may register or remove observers without deadlocking on the `RefCell`.

use crate::errors::{Error, Result};
use crate::interval::Interval;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// A begin or end callback.
pub type Callback = Rc<dyn Fn(&Interval) -> Result<()>>;

/// Identifies one registration on one notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(u64);

/// Identifies the owner of a group of registrations.
///
/// Owners remove all of their registrations at once with
/// [`UpdateNotifier::remove_owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate a fresh, process-unique owner id.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// A registration request: callbacks plus routing options.
#[derive(Clone, Default)]
pub struct Observer {
    begin: Option<Callback>,
    end: Option<Callback>,
    owner: Option<OwnerId>,
    filter: Option<Interval>,
    prioritize: bool,
}

impl Observer {
    /// An observer with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback fired on the first `begin_update` of a pass.
    pub fn on_begin<F>(mut self, f: F) -> Self
    where
        F: Fn(&Interval) -> Result<()> + 'static,
    {
        self.begin = Some(Rc::new(f));
        self
    }

    /// Callback fired on the last `end_update` of a pass.
    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&Interval) -> Result<()> + 'static,
    {
        self.end = Some(Rc::new(f));
        self
    }

    /// Tag the registration with an owner.
    pub fn owned_by(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Only fire when the notified interval intersects `domain`.
    pub fn filtered(mut self, domain: Interval) -> Self {
        self.filter = Some(domain);
        self
    }

    /// Insert at the front of the call order.
    pub fn prioritized(mut self) -> Self {
        self.prioritize = true;
        self
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("begin", &self.begin.is_some())
            .field("end", &self.end.is_some())
            .field("owner", &self.owner)
            .field("filter", &self.filter)
            .field("prioritize", &self.prioritize)
            .finish()
    }
}

struct Entry {
    token: ObserverToken,
    owner: Option<OwnerId>,
    filter: Option<Interval>,
    begin: Option<Callback>,
    end: Option<Callback>,
}

impl Entry {
    fn accepts(&self, interval: &Interval) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.intersects(interval))
    }
}

#[derive(Clone, Copy, Debug)]
enum Phase {
    Begin,
    End,
}

// ── UpdateNotifier ────────────────────────────────────────────────────────────

/// Observer registry plus the per-curve update state machine.
///
/// The state is `Idle` while the pending-begin counter is zero and
/// `Updating` otherwise.
#[derive(Default)]
pub struct UpdateNotifier {
    entries: RefCell<Vec<Entry>>,
    next_token: Cell<u64>,
    pending: Cell<usize>,
    accumulated: Cell<Interval>,
}

impl UpdateNotifier {
    /// Create an idle notifier with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer and return its token.
    pub fn add(&self, observer: Observer) -> ObserverToken {
        let token = ObserverToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        let entry = Entry {
            token,
            owner: observer.owner,
            filter: observer.filter,
            begin: observer.begin,
            end: observer.end,
        };
        let mut entries = self.entries.borrow_mut();
        if observer.prioritize {
            entries.insert(0, entry);
        } else {
            entries.push(entry);
        }
        token
    }

    /// Remove a registration. Unknown tokens are ignored.
    pub fn remove(&self, token: ObserverToken) {
        self.entries.borrow_mut().retain(|e| e.token != token);
    }

    /// Remove every registration tagged with `owner`.
    pub fn remove_owner(&self, owner: OwnerId) {
        self.entries
            .borrow_mut()
            .retain(|e| e.owner != Some(owner));
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// `true` between the first `begin_update` and the last `end_update`.
    pub fn is_updating(&self) -> bool {
        self.pending.get() > 0
    }

    /// Number of begins still waiting for their end.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Announce that the data over `interval` is about to change.
    ///
    /// Only the first begin of a pass reaches the observers.
    pub fn begin_update(&self, interval: &Interval) -> Result<()> {
        let depth = self.pending.get();
        let accumulated = self.accumulated.get().hull(interval);
        self.pending.set(depth + 1);
        self.accumulated.set(accumulated);
        if depth > 0 {
            trace!(%interval, depth = depth + 1, "coalesced begin_update");
            return Ok(());
        }
        debug!(%accumulated, observers = self.len(), "begin_update");
        self.fire(Phase::Begin, &accumulated)
    }

    /// Announce that the data over `interval` has changed.
    ///
    /// Only the end that balances the first begin reaches the observers,
    /// with the union of every interval seen during the pass.
    pub fn end_update(&self, interval: &Interval) -> Result<()> {
        let depth = self.pending.get();
        if depth == 0 {
            return Err(Error::UnbalancedUpdate);
        }
        let accumulated = self.accumulated.get().hull(interval);
        if depth > 1 {
            self.pending.set(depth - 1);
            self.accumulated.set(accumulated);
            trace!(%interval, depth = depth - 1, "coalesced end_update");
            return Ok(());
        }
        self.pending.set(0);
        self.accumulated.set(Interval::empty());
        debug!(%accumulated, observers = self.len(), "end_update");
        self.fire(Phase::End, &accumulated)
    }

    fn fire(&self, phase: Phase, interval: &Interval) -> Result<()> {
        let callbacks: Vec<Callback> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.accepts(interval))
            .filter_map(|e| match phase {
                Phase::Begin => e.begin.clone(),
                Phase::End => e.end.clone(),
            })
            .collect();
        for callback in callbacks {
            if let Err(err) = callback(interval) {
                warn!(?phase, %interval, error = %err, "observer callback failed");
                return Err(err.into_propagation());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("observers", &self.len())
            .field("pending", &self.pending.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Observer {
        let begin_log = Rc::clone(log);
        let end_log = Rc::clone(log);
        Observer::new()
            .on_begin(move |i| {
                begin_log.borrow_mut().push(format!("{name}:begin {i}"));
                Ok(())
            })
            .on_end(move |i| {
                end_log.borrow_mut().push(format!("{name}:end {i}"));
                Ok(())
            })
    }

    #[test]
    fn begin_end_round_trip() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let n = UpdateNotifier::new();
        n.add(recorder(&log, "a"));
        assert!(!n.is_updating());
        n.begin_update(&Interval::closed(0.0, 1.0)).unwrap();
        assert!(n.is_updating());
        n.end_update(&Interval::closed(0.0, 1.0)).unwrap();
        assert!(!n.is_updating());
        assert_eq!(*log.borrow(), vec!["a:begin [0, 1]", "a:end [0, 1]"]);
    }

    #[test]
    fn nested_passes_coalesce() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let n = UpdateNotifier::new();
        n.add(recorder(&log, "a"));
        n.begin_update(&Interval::closed(0.0, 1.0)).unwrap();
        n.begin_update(&Interval::closed(2.0, 3.0)).unwrap();
        n.end_update(&Interval::closed(0.0, 1.0)).unwrap();
        assert!(n.is_updating());
        n.end_update(&Interval::closed(2.0, 3.0)).unwrap();
        assert_eq!(*log.borrow(), vec!["a:begin [0, 1]", "a:end [0, 3]"]);
    }

    #[test]
    fn unbalanced_end_is_rejected() {
        let n = UpdateNotifier::new();
        assert_eq!(
            n.end_update(&Interval::point(0.0)),
            Err(Error::UnbalancedUpdate)
        );
    }

    #[test]
    fn prioritized_observers_run_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let n = UpdateNotifier::new();
        n.add(recorder(&log, "late"));
        n.add(recorder(&log, "early").prioritized());
        n.begin_update(&Interval::point(0.0)).unwrap();
        assert_eq!(log.borrow()[0], "early:begin [0, 0]");
    }

    #[test]
    fn filters_and_removal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let n = UpdateNotifier::new();
        let owner = OwnerId::new();
        let filtered = n.add(recorder(&log, "f").filtered(Interval::open(0.0, 2.0)));
        n.add(recorder(&log, "o").owned_by(owner));
        assert_eq!(n.len(), 2);

        n.begin_update(&Interval::closed(3.0, 4.0)).unwrap();
        n.end_update(&Interval::closed(3.0, 4.0)).unwrap();
        assert!(log.borrow().iter().all(|l| l.starts_with("o:")));

        log.borrow_mut().clear();
        n.begin_update(&Interval::closed(1.0, 3.0)).unwrap();
        n.end_update(&Interval::closed(1.0, 3.0)).unwrap();
        assert_eq!(log.borrow().len(), 4);

        n.remove_owner(owner);
        n.remove(filtered);
        n.remove(filtered);
        assert!(n.is_empty());
    }

    #[test]
    fn failing_callback_surfaces_as_propagation_error() {
        let n = UpdateNotifier::new();
        n.add(Observer::new().on_begin(|_| Err(Error::Runtime("boom".into()))));
        let err = n.begin_update(&Interval::point(1.0)).unwrap_err();
        assert_eq!(
            err,
            Error::Propagation(Box::new(Error::Runtime("boom".into())))
        );
        // Documented caveat: the pass is left open.
        assert!(n.is_updating());
    }

    #[test]
    #[tracing_test::traced_test]
    fn passes_are_logged() {
        let n = UpdateNotifier::new();
        n.begin_update(&Interval::closed(0.0, 1.0)).unwrap();
        n.begin_update(&Interval::closed(0.0, 1.0)).unwrap();
        n.end_update(&Interval::closed(0.0, 1.0)).unwrap();
        n.end_update(&Interval::closed(0.0, 1.0)).unwrap();
        assert!(logs_contain("begin_update"));
        assert!(logs_contain("coalesced end_update"));
    }

    #[test]
    fn callbacks_may_register_observers() {
        let n = Rc::new(UpdateNotifier::new());
        let inner = Rc::clone(&n);
        n.add(Observer::new().on_begin(move |_| {
            inner.add(Observer::new());
            Ok(())
        }));
        n.begin_update(&Interval::point(0.0)).unwrap();
        assert_eq!(n.len(), 2);
    }
}
