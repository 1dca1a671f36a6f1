#![forbid(unsafe_code)]

//! Observable values with lazy upstream activation.
//!
//! [`Data<T>`] holds a single time-varying value that may not be available
//! yet (`None`). Subscribers are plain callbacks compared by identity, so the
//! same [`Subscriber`] handle must be passed to [`Data::unsubscribe`] that was
//! passed to [`Data::subscribe`].
//!
//! # Invariants
//!
//! 1. Subscribers are notified in subscription order.
//! 2. Setting a value equal to the stored value is a no-op.
//! 3. The upstream `create` hook fires exactly on the 0→1 subscriber
//!    transition and `destroy` exactly on 1→0. Re-subscribing after a
//!    destroy activates the upstream again.
//! 4. A newly added subscriber is called synchronously with the current
//!    value, if one is defined.
//!
//! # Failure Modes
//!
//! - **Subscriber panics during `set`**: the panic is caught and logged; the
//!   remaining subscribers are still notified and `set` returns normally.
//! - **Subscriber panics during the replay in `subscribe`**: propagates to the
//!   caller of `subscribe` (the subscriber stays registered).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Subscriber<T>
// ---------------------------------------------------------------------------

/// A change callback registered on a [`Data`].
///
/// Cloning shares the callback. Two subscribers are equal when they are the
/// same callback object, which is what [`Data::unsubscribe`] matches on.
pub struct Subscriber<T> {
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Subscriber<T> {
    /// Wrap a closure as a subscriber.
    pub fn new(callback: impl Fn(&T) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback.
    #[inline]
    pub fn call(&self, value: &T) {
        (self.callback)(value);
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Subscriber<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl<T> Eq for Subscriber<T> {}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscriber")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Source<T>: lifecycle hooks for specialized observables
// ---------------------------------------------------------------------------

/// Upstream lifecycle attached to a [`Data`].
///
/// A plain `Data` has no source, which makes both hooks no-ops.
pub(crate) trait Source<T> {
    /// Called when the subscriber count goes from 0 to 1.
    fn create(&mut self, target: &Data<T>);

    /// Called when the subscriber count goes from 1 to 0.
    fn destroy(&mut self, target: &Data<T>);
}

// ---------------------------------------------------------------------------
// Data<T>
// ---------------------------------------------------------------------------

struct State<T> {
    value: Option<T>,
    subscribers: Vec<Subscriber<T>>,
}

struct Inner<T> {
    state: RefCell<State<T>>,
    source: RefCell<Option<Box<dyn Source<T>>>>,
}

/// A shared observable value.
///
/// Cloning a `Data` creates a new handle to the **same** value and
/// subscriber list; [`Data::ptr_eq`] compares handles by identity.
pub struct Data<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Data<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Data<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Data")
            .field("value", &state.value)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl<T> Data<T> {
    pub(crate) fn with_source(initial: Option<T>, source: Option<Box<dyn Source<T>>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(State {
                    value: initial,
                    subscribers: Vec::new(),
                }),
                source: RefCell::new(source),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakData<T> {
        WeakData {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Create an observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_source(Some(value), None)
    }

    /// Create an observable with no value yet.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_source(None, None)
    }

    /// Whether two handles refer to the same observable.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether a value is currently available.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.inner.state.borrow().value.is_some()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.borrow().subscribers.len()
    }

    /// Whether the upstream is currently activated (at least one subscriber).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls [`Data::set`] on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let state = self.inner.state.borrow();
        f(state.value.as_ref())
    }

    /// Run a source hook with the source temporarily taken out, so the hook
    /// may freely re-enter this observable.
    fn run_source(&self, hook: impl FnOnce(&mut dyn Source<T>, &Self)) {
        let taken = self.inner.source.borrow_mut().take();
        if let Some(mut source) = taken {
            hook(source.as_mut(), self);
            *self.inner.source.borrow_mut() = Some(source);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Data<T> {
    /// Current value, if any.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner.state.borrow().value.clone()
    }

    /// Register `subscriber`.
    ///
    /// The first subscriber activates the upstream. If a value is defined,
    /// `subscriber` is called with it before this returns.
    pub fn subscribe(&self, subscriber: Subscriber<T>) {
        if self.inner.state.borrow().subscribers.is_empty() {
            self.run_source(|source, me| source.create(me));
        }
        let replay = {
            let mut state = self.inner.state.borrow_mut();
            state.subscribers.push(subscriber.clone());
            state.value.clone()
        };
        if let Some(value) = replay {
            subscriber.call(&value);
        }
    }

    /// Remove the first registration of `subscriber`.
    ///
    /// Removing the last subscriber deactivates the upstream. Unknown
    /// subscribers are ignored.
    pub fn unsubscribe(&self, subscriber: &Subscriber<T>) {
        let emptied = {
            let mut state = self.inner.state.borrow_mut();
            match state.subscribers.iter().position(|s| s == subscriber) {
                Some(index) => {
                    state.subscribers.remove(index);
                    state.subscribers.is_empty()
                }
                None => false,
            }
        };
        if emptied {
            self.run_source(|source, me| source.destroy(me));
        }
    }

    /// Store `value` and notify subscribers if it differs from the current one.
    pub fn set(&self, value: T) {
        let subscribers = {
            let mut state = self.inner.state.borrow_mut();
            if state.value.as_ref() == Some(&value) {
                return;
            }
            state.value = Some(value.clone());
            state.subscribers.clone()
        };
        for (index, subscriber) in subscribers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.call(&value)));
            if let Err(payload) = outcome {
                tracing::error!(
                    subscriber = index,
                    panic = %panic_message(payload.as_ref()),
                    "subscriber panicked during notification"
                );
            }
        }
    }

    /// Derive an observable whose value is `mapper` applied to this one.
    ///
    /// Nothing is subscribed until the derived observable gets its own first
    /// subscriber. `mapper` receives `None` while this observable is
    /// undefined, and is evaluated once with `None` at activation in that
    /// case, so the derived value may be defined before the source is.
    pub fn map<O: Clone + PartialEq + 'static>(
        &self,
        mapper: impl Fn(Option<&T>) -> O + 'static,
    ) -> Data<O> {
        self.filter_map(move |value| Some(mapper(value)))
    }

    /// Like [`Data::map`], but a `None` from `mapper` stores nothing.
    ///
    /// A derived observable over an undefined source stays undefined when
    /// `mapper(None)` is `None`. Once defined it keeps its last value until
    /// `mapper` produces another.
    pub fn filter_map<O: Clone + PartialEq + 'static>(
        &self,
        mapper: impl Fn(Option<&T>) -> Option<O> + 'static,
    ) -> Data<O> {
        let mapper: Rc<dyn Fn(Option<&T>) -> Option<O>> = Rc::new(mapper);
        let derived = Data::<O>::empty();

        let weak = derived.downgrade();
        let forward = Rc::clone(&mapper);
        let relay = Subscriber::new(move |value: &T| {
            if let Some(target) = weak.upgrade()
                && let Some(mapped) = forward(Some(value))
            {
                target.set(mapped);
            }
        });

        *derived.inner.source.borrow_mut() = Some(Box::new(MappedSource {
            upstream: self.clone(),
            relay,
            mapper,
        }));
        derived
    }
}

impl<T> Default for Data<T> {
    fn default() -> Self {
        Self::with_source(None, None)
    }
}

/// Weak handle used by upstream closures so they do not keep their target alive.
pub(crate) struct WeakData<T> {
    inner: Weak<Inner<T>>,
}

impl<T> WeakData<T> {
    pub(crate) fn upgrade(&self) -> Option<Data<T>> {
        self.inner.upgrade().map(|inner| Data { inner })
    }
}

// ---------------------------------------------------------------------------
// MappedSource
// ---------------------------------------------------------------------------

struct MappedSource<I, O> {
    upstream: Data<I>,
    relay: Subscriber<I>,
    mapper: Rc<dyn Fn(Option<&I>) -> Option<O>>,
}

impl<I, O> Source<O> for MappedSource<I, O>
where
    I: Clone + PartialEq + 'static,
    O: Clone + PartialEq + 'static,
{
    fn create(&mut self, target: &Data<O>) {
        self.upstream.subscribe(self.relay.clone());
        // The relay is not called for an undefined upstream.
        if !self.upstream.is_defined()
            && let Some(mapped) = (self.mapper)(None)
        {
            target.set(mapped);
        }
    }

    fn destroy(&mut self, _target: &Data<O>) {
        self.upstream.unsubscribe(&self.relay);
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
