#![forbid(unsafe_code)]

//! Action and lifecycle-hook specifications.
//!
//! Actions are written against a [`BoundContext`] receiver and bound once per
//! instance at construction; the wrapped component receives them as
//! [`BoundActions`] and can call them without supplying a receiver.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::bind::BoundContext;

pub type ActionFn<V> = dyn Fn(&BoundContext<V>, &[V]);
pub type HookFn<V> = dyn Fn(&BoundContext<V>);

/// Optional lifecycle hooks of a bound component.
pub struct Hooks<V> {
    /// After `will_mount` subscribed the active observables.
    pub on_mount: Option<Rc<HookFn<V>>>,
    /// After the first render was committed by the host.
    pub on_mounted: Option<Rc<HookFn<V>>>,
    /// When a render first finds an undefined binding.
    pub on_load: Option<Rc<HookFn<V>>>,
    /// When a render finds every binding defined.
    pub on_loaded: Option<Rc<HookFn<V>>>,
    /// Before the active observables are unsubscribed.
    pub on_unmount: Option<Rc<HookFn<V>>>,
}

impl<V> Default for Hooks<V> {
    fn default() -> Self {
        Self {
            on_mount: None,
            on_mounted: None,
            on_load: None,
            on_loaded: None,
            on_unmount: None,
        }
    }
}

impl<V> Clone for Hooks<V> {
    fn clone(&self) -> Self {
        Self {
            on_mount: self.on_mount.clone(),
            on_mounted: self.on_mounted.clone(),
            on_load: self.on_load.clone(),
            on_loaded: self.on_loaded.clone(),
            on_unmount: self.on_unmount.clone(),
        }
    }
}

impl<V> fmt::Debug for Hooks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_mount", &self.on_mount.is_some())
            .field("on_mounted", &self.on_mounted.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("on_loaded", &self.on_loaded.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .finish()
    }
}

/// Named actions plus lifecycle hooks for one binding stage.
pub struct Actions<V> {
    actions: Vec<(String, Rc<ActionFn<V>>)>,
    hooks: Hooks<V>,
}

impl<V> Actions<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            hooks: Hooks::default(),
        }
    }

    /// Add an action; a second action with the same name replaces the first.
    #[must_use]
    pub fn action(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&BoundContext<V>, &[V]) + 'static,
    ) -> Self {
        let name = name.into();
        let action: Rc<ActionFn<V>> = Rc::new(action);
        match self.actions.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = action,
            None => self.actions.push((name, action)),
        }
        self
    }

    #[must_use]
    pub fn on_mount(mut self, hook: impl Fn(&BoundContext<V>) + 'static) -> Self {
        self.hooks.on_mount = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_mounted(mut self, hook: impl Fn(&BoundContext<V>) + 'static) -> Self {
        self.hooks.on_mounted = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_load(mut self, hook: impl Fn(&BoundContext<V>) + 'static) -> Self {
        self.hooks.on_load = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_loaded(mut self, hook: impl Fn(&BoundContext<V>) + 'static) -> Self {
        self.hooks.on_loaded = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_unmount(mut self, hook: impl Fn(&BoundContext<V>) + 'static) -> Self {
        self.hooks.on_unmount = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn hooks(&self) -> &Hooks<V> {
        &self.hooks
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(n, _)| n.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Rc<ActionFn<V>>)> {
        self.actions.iter().map(|(n, a)| (n.as_str(), a))
    }
}

impl<V> Default for Actions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Actions<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("actions", &self.names().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Bound actions
// ---------------------------------------------------------------------------

/// An action already attached to its instance.
pub struct BoundAction<V> {
    name: Rc<str>,
    call: Rc<dyn Fn(&[V])>,
}

impl<V> BoundAction<V> {
    pub fn new(name: impl Into<Rc<str>>, call: impl Fn(&[V]) + 'static) -> Self {
        Self {
            name: name.into(),
            call: Rc::new(call),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[V]) {
        (self.call)(args);
    }
}

impl<V> Clone for BoundAction<V> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            call: Rc::clone(&self.call),
        }
    }
}

impl<V> PartialEq for BoundAction<V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.call), Rc::as_ptr(&other.call))
    }
}

impl<V> fmt::Debug for BoundAction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundAction").field(&self.name).finish()
    }
}

/// The `actions` capability exposed to a wrapped component.
pub struct BoundActions<V> {
    by_name: BTreeMap<String, BoundAction<V>>,
}

impl<V> BoundActions<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, action: BoundAction<V>) {
        self.by_name.insert(action.name().to_string(), action);
    }

    /// Copy every action of `other` in, replacing same-named ones.
    pub fn extend(&mut self, other: &BoundActions<V>) {
        for action in other.by_name.values() {
            self.insert(action.clone());
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundAction<V>> {
        self.by_name.get(name)
    }

    /// Invoke `name` with `args`. Returns `false` if there is no such action.
    pub fn call(&self, name: &str, args: &[V]) -> bool {
        match self.by_name.get(name) {
            Some(action) => {
                action.call(args);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<V> Default for BoundActions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for BoundActions<V> {
    fn clone(&self) -> Self {
        Self {
            by_name: self.by_name.clone(),
        }
    }
}

impl<V> fmt::Debug for BoundActions<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.by_name.keys()).finish()
    }
}
