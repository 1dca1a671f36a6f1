#![forbid(unsafe_code)]

//! Declarative binding specifications.
//!
//! A [`BindingSpec`] maps each output key to a [`Binding`]: a constant, an
//! observable, or a function of the current props. Functions return a
//! [`Resolved`] descriptor, which is the only place a future may appear; a
//! future stored directly in a spec would start its work when the spec is
//! built whether or not anything ever observes it.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use bindery_core::{Data, Spawner};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::element::Props;

/// Function binding: `(props, previous value) -> descriptor`.
pub type ComputeFn<V> = dyn Fn(&Props<V>, Option<&V>) -> Resolved<V>;

/// What a binding function produced for one evaluation.
pub enum Resolved<V> {
    Constant(V),
    Reactive(Data<V>),
    /// Wrapped in a lazily started future-backed observable.
    Deferred(LocalBoxFuture<'static, V>),
}

impl<V> Resolved<V> {
    pub fn deferred(future: impl Future<Output = V> + 'static) -> Self {
        Self::Deferred(future.boxed_local())
    }
}

impl<V> From<Data<V>> for Resolved<V> {
    fn from(data: Data<V>) -> Self {
        Self::Reactive(data)
    }
}

impl<V: fmt::Debug> fmt::Debug for Resolved<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Reactive(data) => f.debug_tuple("Reactive").field(data).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// One entry of a [`BindingSpec`].
pub enum Binding<V> {
    Constant(V),
    Observable(Data<V>),
    Computed(Rc<ComputeFn<V>>),
}

impl<V: Clone> Clone for Binding<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v.clone()),
            Self::Observable(data) => Self::Observable(data.clone()),
            Self::Computed(f) => Self::Computed(Rc::clone(f)),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Binding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Observable(data) => f.debug_tuple("Observable").field(data).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Ordered key → binding map.
pub struct BindingSpec<V> {
    entries: Vec<(String, Binding<V>)>,
}

impl<V> BindingSpec<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `binding` under `key`, replacing an existing entry in place.
    #[must_use]
    pub fn bind(mut self, key: impl Into<String>, binding: Binding<V>) -> Self {
        self.insert(key, binding);
        self
    }

    #[must_use]
    pub fn constant(self, key: impl Into<String>, value: V) -> Self {
        self.bind(key, Binding::Constant(value))
    }

    #[must_use]
    pub fn observable(self, key: impl Into<String>, data: Data<V>) -> Self {
        self.bind(key, Binding::Observable(data))
    }

    #[must_use]
    pub fn computed(
        self,
        key: impl Into<String>,
        compute: impl Fn(&Props<V>, Option<&V>) -> Resolved<V> + 'static,
    ) -> Self {
        self.bind(key, Binding::Computed(Rc::new(compute)))
    }

    pub fn insert(&mut self, key: impl Into<String>, binding: Binding<V>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = binding,
            None => self.entries.push((key, binding)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn key(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(k, _)| k.as_str())
    }
}

/// Result of evaluating a spec against one set of props.
pub(crate) struct Evaluation<V> {
    /// Defined values only; an absent key is still loading.
    pub(crate) state: Props<V>,
    /// Observable backing each entry, by entry index.
    pub(crate) active: Vec<Option<Data<V>>>,
}

impl<V: Clone + PartialEq + 'static> BindingSpec<V> {
    /// Resolve every entry against `props`. `previous` is the state from the
    /// prior evaluation and feeds the second argument of binding functions.
    pub(crate) fn evaluate(
        &self,
        props: &Props<V>,
        previous: &Props<V>,
        spawner: &Rc<dyn Spawner>,
    ) -> Evaluation<V> {
        let mut state = Props::new();
        let mut active = Vec::with_capacity(self.entries.len());
        for (key, binding) in &self.entries {
            let resolved = match binding {
                Binding::Constant(v) => Resolved::Constant(v.clone()),
                Binding::Observable(data) => Resolved::Reactive(data.clone()),
                Binding::Computed(compute) => compute(props, previous.get(key)),
            };
            let observable = match resolved {
                Resolved::Constant(v) => {
                    state.insert(key.clone(), v);
                    None
                }
                Resolved::Reactive(data) => Some(data),
                Resolved::Deferred(future) => Some(Data::from_future(Rc::clone(spawner), future)),
            };
            if let Some(data) = &observable
                && let Some(v) = data.get()
            {
                state.insert(key.clone(), v);
            }
            active.push(observable);
        }
        Evaluation { state, active }
    }
}

impl<V> Default for BindingSpec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for BindingSpec<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for BindingSpec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, b)| (k, b)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use std::cell::RefCell;

    fn spawner() -> (LocalPool, Rc<dyn Spawner>) {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawner> = Rc::new(pool.spawner());
        (pool, spawner)
    }

    #[test]
    fn rebinding_key_replaces_in_place() {
        let spec = BindingSpec::new()
            .constant("a", 1)
            .constant("b", 2)
            .constant("a", 3);
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn evaluate_resolves_each_kind() {
        let (_pool, spawner) = spawner();
        let ready = Data::new(10);
        let pending = Data::<i32>::empty();
        let spec = BindingSpec::new()
            .constant("fixed", 1)
            .observable("ready", ready.clone())
            .observable("pending", pending.clone())
            .computed("sum", |props, _| {
                Resolved::Constant(props.get("base").copied().unwrap_or(0) + 1)
            });

        let mut props = Props::new();
        props.insert("base".to_string(), 41);
        let eval = spec.evaluate(&props, &Props::new(), &spawner);

        assert_eq!(eval.state.get("fixed"), Some(&1));
        assert_eq!(eval.state.get("ready"), Some(&10));
        assert_eq!(eval.state.get("pending"), None);
        assert_eq!(eval.state.get("sum"), Some(&42));
        assert!(eval.active[0].is_none());
        assert!(eval.active[1].as_ref().is_some_and(|d| d.ptr_eq(&ready)));
        assert!(eval.active[2].as_ref().is_some_and(|d| d.ptr_eq(&pending)));
        assert!(eval.active[3].is_none());
    }

    #[test]
    fn computed_receives_previous_value() {
        let (_pool, spawner) = spawner();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let spec = BindingSpec::new().computed("n", move |_, prev| {
            s.borrow_mut().push(prev.copied());
            Resolved::Constant(prev.copied().unwrap_or(0) + 1)
        });

        let first = spec.evaluate(&Props::new(), &Props::new(), &spawner);
        let second = spec.evaluate(&Props::new(), &first.state, &spawner);
        assert_eq!(second.state.get("n"), Some(&2));
        assert_eq!(*seen.borrow(), vec![None, Some(1)]);
    }

    #[test]
    fn deferred_is_wrapped_but_not_started() {
        let (mut pool, spawner) = spawner();
        let spec = BindingSpec::new().computed("user", |_, _| Resolved::deferred(async { 7 }));
        let eval = spec.evaluate(&Props::new(), &Props::new(), &spawner);

        pool.run_until_stalled();
        let data = eval.active[0].clone();
        assert!(data.as_ref().is_some_and(|d| !d.is_defined()));
        assert_eq!(eval.state.get("user"), None);
    }
}
