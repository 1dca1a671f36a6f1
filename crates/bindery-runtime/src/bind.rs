#![forbid(unsafe_code)]

//! Binding orchestrator.
//!
//! [`bind`] wraps a component with one that resolves a [`BindingSpec`]
//! against its props, keeps the observables behind the spec subscribed while
//! mounted, renders the configured loader until every binding is defined, and
//! hands the wrapped component the merged props plus the stage's bound
//! actions.
//!
//! # Invariants
//!
//! 1. The active-observable slots always mirror exactly the entries whose
//!    latest evaluation produced an observable.
//! 2. Each entry has one setter for the lifetime of the instance, so a
//!    subscribe and its matching unsubscribe use the same callback.
//! 3. On a props update, only entries whose observable changed identity are
//!    unsubscribed (old) and subscribed (new); the rest stay subscribed.
//! 4. The load phase only moves forward within a mount cycle under
//!    [`LoadHookPolicy::Once`] and is reset to `Unmounted` by `will_unmount`.
//!
//! # Failure Modes
//!
//! - **Props update while unmounted**: returns
//!   [`BindError::IllegalBindState`] naming the component; nothing changes.
//! - **Action called after the instance was dropped**: logged, no effect.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::{Data, Subscriber};

use crate::actions::{Actions, BoundAction, BoundActions};
use crate::config::{self, LoadHookPolicy};
use crate::element::{Element, Props, RenderProps};
use crate::error::{BindError, Result};
use crate::host::{Component, ComponentType, HostContext};
use crate::spec::BindingSpec;

/// Loading progress of one mounted instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Unmounted,
    Mounted,
    /// A render found an undefined binding and `on_load` fired.
    LoadCalled,
    /// A render found every binding defined and `on_loaded` fired.
    LoadedCalled,
}

/// One `(spec, actions)` pair of a multi-stage binding.
pub struct Stage<V> {
    pub spec: BindingSpec<V>,
    pub actions: Actions<V>,
}

impl<V> Stage<V> {
    pub fn new(spec: BindingSpec<V>, actions: Actions<V>) -> Self {
        Self { spec, actions }
    }
}

impl<V: fmt::Debug> fmt::Debug for Stage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("spec", &self.spec)
            .field("actions", &self.actions)
            .finish()
    }
}

/// Wrap `component` with a single binding stage.
///
/// The result is named `<component>B`; [`ComponentType::wrapped`] returns
/// `component`.
pub fn bind<V: Clone + PartialEq + 'static>(
    spec: BindingSpec<V>,
    actions: Actions<V>,
    component: ComponentType<V>,
) -> ComponentType<V> {
    let display_name = format!("{}B", component.display_name());
    tracing::trace!(component = %display_name, keys = spec.len(), "binding component");
    let definition = Rc::new(Definition {
        spec,
        actions,
        target: component.clone(),
        display_name: display_name.clone(),
    });
    ComponentType::wrapping(
        display_name,
        move |props, host| BoundComponent::construct(Rc::clone(&definition), props, host),
        component,
    )
}

/// Wrap `component` with several stages, outermost first.
///
/// Each stage sees the props, resolved values and actions of every stage
/// before it. Stages are applied innermost-first, so the last stage wraps
/// `component` directly. An empty list returns `component` unchanged.
pub fn bind_stages<V: Clone + PartialEq + 'static>(
    stages: Vec<Stage<V>>,
    component: ComponentType<V>,
) -> ComponentType<V> {
    stages
        .into_iter()
        .rev()
        .fold(component, |target, stage| bind(stage.spec, stage.actions, target))
}

// ---------------------------------------------------------------------------
// Instance state
// ---------------------------------------------------------------------------

struct Definition<V> {
    spec: BindingSpec<V>,
    actions: Actions<V>,
    target: ComponentType<V>,
    display_name: String,
}

struct Instance<V> {
    props: RenderProps<V>,
    /// Defined binding values; a missing key is still loading.
    state: Props<V>,
    active: Vec<Option<Data<V>>>,
    setters: Vec<Option<Subscriber<V>>>,
    phase: LoadPhase,
    actions: BoundActions<V>,
}

struct Shared<V> {
    definition: Rc<Definition<V>>,
    host: HostContext,
    instance: RefCell<Instance<V>>,
}

impl<V: Clone + PartialEq + 'static> Shared<V> {
    fn name(&self) -> &str {
        &self.definition.display_name
    }

    fn store(&self, key: &str, value: V) {
        self.instance
            .borrow_mut()
            .state
            .insert(key.to_string(), value);
        self.host.request_render();
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Mount,
    Mounted,
    Load,
    Loaded,
    Unmount,
}

fn fire<V: Clone + PartialEq + 'static>(shared: &Rc<Shared<V>>, hook: Hook) {
    let hooks = shared.definition.actions.hooks();
    let callback = match hook {
        Hook::Mount => &hooks.on_mount,
        Hook::Mounted => &hooks.on_mounted,
        Hook::Load => &hooks.on_load,
        Hook::Loaded => &hooks.on_loaded,
        Hook::Unmount => &hooks.on_unmount,
    };
    if let Some(callback) = callback {
        tracing::trace!(component = %shared.name(), ?hook, "lifecycle hook");
        callback(&context(shared));
    }
}

fn context<V>(shared: &Rc<Shared<V>>) -> BoundContext<V> {
    BoundContext {
        shared: Rc::downgrade(shared),
        definition: Rc::clone(&shared.definition),
    }
}

/// The memoized setter of entry `index`.
fn setter<V: Clone + PartialEq + 'static>(shared: &Rc<Shared<V>>, index: usize) -> Subscriber<V> {
    let existing = shared
        .instance
        .borrow()
        .setters
        .get(index)
        .cloned()
        .flatten();
    if let Some(existing) = existing {
        return existing;
    }

    let key = shared
        .definition
        .spec
        .key(index)
        .unwrap_or_default()
        .to_string();
    let weak = Rc::downgrade(shared);
    let created = Subscriber::new(move |value: &V| {
        if let Some(shared) = weak.upgrade() {
            shared.store(&key, value.clone());
        }
    });
    if let Some(slot) = shared.instance.borrow_mut().setters.get_mut(index) {
        *slot = Some(created.clone());
    }
    created
}

fn active_pairs<V: Clone + PartialEq + 'static>(
    shared: &Rc<Shared<V>>,
) -> Vec<(Data<V>, Subscriber<V>)> {
    let active: Vec<(usize, Data<V>)> = shared
        .instance
        .borrow()
        .active
        .iter()
        .enumerate()
        .filter_map(|(index, data)| data.clone().map(|data| (index, data)))
        .collect();
    active
        .into_iter()
        .map(|(index, data)| (data, setter(shared, index)))
        .collect()
}

fn bind_actions<V: 'static>(
    definition: &Rc<Definition<V>>,
    shared: &Weak<Shared<V>>,
) -> BoundActions<V> {
    let mut bound = BoundActions::new();
    for (name, action) in definition.actions.iter() {
        let action = Rc::clone(action);
        let receiver = BoundContext {
            shared: shared.clone(),
            definition: Rc::clone(definition),
        };
        bound.insert(BoundAction::new(name, move |args: &[V]| {
            action(&receiver, args)
        }));
    }
    bound
}

fn replaced<V>(old: &Data<V>, new: Option<&Data<V>>) -> bool {
    !new.is_some_and(|new| new.ptr_eq(old))
}

/// Move the load phase for a render that found the bindings `complete` or
/// not. Returns whether the matching hook should fire.
fn advance(phase: &mut LoadPhase, complete: bool, policy: LoadHookPolicy) -> bool {
    let next = match (*phase, complete, policy) {
        (LoadPhase::Unmounted, _, _) => return false,
        (LoadPhase::Mounted, false, _) => LoadPhase::LoadCalled,
        (LoadPhase::LoadedCalled, false, LoadHookPolicy::EveryTransition) => {
            LoadPhase::LoadCalled
        }
        (_, false, _) => return false,
        (LoadPhase::LoadedCalled, true, _) => return false,
        (_, true, _) => LoadPhase::LoadedCalled,
    };
    *phase = next;
    true
}

// ---------------------------------------------------------------------------
// BoundComponent
// ---------------------------------------------------------------------------

struct BoundComponent<V> {
    shared: Rc<Shared<V>>,
}

impl<V: Clone + PartialEq + 'static> BoundComponent<V> {
    fn construct(
        definition: Rc<Definition<V>>,
        props: RenderProps<V>,
        host: HostContext,
    ) -> Box<dyn Component<V>> {
        let evaluation = definition
            .spec
            .evaluate(&props.values, &Props::new(), &host.spawner());
        let slots = definition.spec.len();
        let shared = Rc::new_cyclic(|weak: &Weak<Shared<V>>| {
            let actions = bind_actions(&definition, weak);
            Shared {
                definition,
                host,
                instance: RefCell::new(Instance {
                    props,
                    state: evaluation.state,
                    active: evaluation.active,
                    setters: vec![None; slots],
                    phase: LoadPhase::Unmounted,
                    actions,
                }),
            }
        });
        Box::new(Self { shared })
    }
}

impl<V: Clone + PartialEq + 'static> Component<V> for BoundComponent<V> {
    fn will_mount(&mut self) {
        self.shared.instance.borrow_mut().phase = LoadPhase::Mounted;
        let pairs = active_pairs(&self.shared);
        for (data, setter) in &pairs {
            data.subscribe(setter.clone());
        }
        tracing::debug!(
            component = %self.shared.name(),
            subscriptions = pairs.len(),
            "bound component mounted"
        );
        fire(&self.shared, Hook::Mount);
    }

    fn did_mount(&mut self) {
        fire(&self.shared, Hook::Mounted);
    }

    fn will_unmount(&mut self) {
        fire(&self.shared, Hook::Unmount);
        let pairs = active_pairs(&self.shared);
        for (data, setter) in &pairs {
            data.unsubscribe(setter);
        }
        self.shared.instance.borrow_mut().phase = LoadPhase::Unmounted;
        tracing::debug!(
            component = %self.shared.name(),
            released = pairs.len(),
            "bound component unmounted"
        );
    }

    fn will_receive_props(&mut self, props: RenderProps<V>) -> Result<()> {
        let (phase, previous) = {
            let instance = self.shared.instance.borrow();
            (instance.phase, instance.state.clone())
        };
        if phase == LoadPhase::Unmounted {
            tracing::error!(component = %self.shared.name(), "props update on unmounted component");
            return Err(BindError::IllegalBindState {
                component: self.shared.name().to_string(),
            });
        }

        let evaluation = self.shared.definition.spec.evaluate(
            &props.values,
            &previous,
            &self.shared.host.spawner(),
        );
        let current = evaluation.active.clone();
        let outdated = {
            let mut instance = self.shared.instance.borrow_mut();
            instance.props = props;
            // Spec keys are re-resolved; keys written through set_state stay.
            for key in self.shared.definition.spec.keys() {
                instance.state.remove(key);
            }
            instance.state.extend(evaluation.state);
            std::mem::replace(&mut instance.active, evaluation.active)
        };

        let mut released = 0usize;
        for (index, old) in outdated.iter().enumerate() {
            if let Some(old) = old
                && replaced(old, current.get(index).and_then(Option::as_ref))
            {
                old.unsubscribe(&setter(&self.shared, index));
                released += 1;
            }
        }
        let mut acquired = 0usize;
        for (index, new) in current.iter().enumerate() {
            if let Some(new) = new
                && replaced(new, outdated.get(index).and_then(Option::as_ref))
            {
                new.subscribe(setter(&self.shared, index));
                acquired += 1;
            }
        }
        if released + acquired > 0 {
            tracing::debug!(
                component = %self.shared.name(),
                released,
                acquired,
                "binding subscriptions changed"
            );
        }

        self.shared.host.request_render();
        Ok(())
    }

    fn render(&mut self) -> Element<V> {
        let config = config::config();
        let definition = Rc::clone(&self.shared.definition);
        let (complete, fired) = {
            let mut instance = self.shared.instance.borrow_mut();
            let complete = definition
                .spec
                .keys()
                .all(|key| instance.state.contains_key(key));
            let from = instance.phase;
            let fired = advance(&mut instance.phase, complete, config.load_hooks);
            if fired {
                tracing::trace!(
                    component = %definition.display_name,
                    ?from,
                    to = ?instance.phase,
                    "load phase advanced"
                );
            }
            (complete, fired)
        };
        if fired {
            fire(&self.shared, if complete { Hook::Loaded } else { Hook::Load });
        }

        if !complete {
            return config
                .loader
                .clone()
                .map_or(Element::Empty, Element::Placeholder);
        }
        let props = {
            let instance = self.shared.instance.borrow();
            instance.props.merged(&instance.state, &instance.actions)
        };
        Element::create(definition.target.clone(), props)
    }
}

// ---------------------------------------------------------------------------
// BoundContext
// ---------------------------------------------------------------------------

/// Receiver passed to actions and lifecycle hooks.
///
/// Holds a weak reference to its instance; once the instance is dropped,
/// reads return `None` and writes are ignored.
pub struct BoundContext<V> {
    shared: Weak<Shared<V>>,
    definition: Rc<Definition<V>>,
}

impl<V> Clone for BoundContext<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            definition: Rc::clone(&self.definition),
        }
    }
}

impl<V> fmt::Debug for BoundContext<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundContext")
            .field("component", &self.definition.display_name)
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<V: Clone + PartialEq + 'static> BoundContext<V> {
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.definition.display_name
    }

    /// Whether the instance still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        let Some(shared) = self.shared.upgrade() else {
            return LoadPhase::Unmounted;
        };
        let phase = shared.instance.borrow().phase;
        phase
    }

    /// Incoming prop value.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<V> {
        let shared = self.shared.upgrade()?;
        let instance = shared.instance.borrow();
        instance.props.values.get(key).cloned()
    }

    /// Resolved binding value.
    #[must_use]
    pub fn state(&self, key: &str) -> Option<V> {
        let shared = self.shared.upgrade()?;
        let instance = shared.instance.borrow();
        instance.state.get(key).cloned()
    }

    /// Value as the wrapped component sees it: state, else prop.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<V> {
        self.state(key).or_else(|| self.prop(key))
    }

    /// Write a state value and request a re-render. Returns `false` if the
    /// instance is gone.
    pub fn set_state(&self, key: &str, value: V) -> bool {
        match self.shared.upgrade() {
            Some(shared) => {
                shared.store(key, value);
                true
            }
            None => {
                tracing::debug!(component = %self.display_name(), key, "state write after drop ignored");
                false
            }
        }
    }

    /// Invoke another bound action of the same instance.
    pub fn call(&self, name: &str, args: &[V]) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let action = shared.instance.borrow().actions.get(name).cloned();
        match action {
            Some(action) => {
                action.call(args);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Placeholder;
    use crate::host::Scheduler;
    use crate::spec::Resolved;
    use futures::executor::LocalPool;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter(Cell<u32>);

    impl Scheduler for Counter {
        fn request_render(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn host() -> (LocalPool, Rc<Counter>, HostContext) {
        let pool = LocalPool::new();
        let renders = Rc::new(Counter::default());
        let ctx = HostContext::new(renders.clone(), Rc::new(pool.spawner()));
        (pool, renders, ctx)
    }

    fn leaf() -> ComponentType<i32> {
        ComponentType::function("Leaf", |_| Element::Empty)
    }

    fn rendered_value(el: &Element<i32>, key: &str) -> Option<i32> {
        el.as_node()?.props.value(key).copied()
    }

    #[test]
    fn display_name_and_back_references() {
        let inner = leaf();
        let bound = bind(BindingSpec::new(), Actions::new(), inner.clone());
        assert_eq!(bound.display_name(), "LeafB");
        assert_eq!(bound.wrapped(), Some(&inner));
        assert_eq!(bound.component(), &inner);

        let staged = bind_stages(
            vec![
                Stage::new(BindingSpec::new(), Actions::new()),
                Stage::new(BindingSpec::new(), Actions::new()),
            ],
            inner.clone(),
        );
        assert_eq!(staged.display_name(), "LeafBB");
        assert_eq!(staged.component(), &inner);
        assert_eq!(staged.wrapped().map(ComponentType::display_name), Some("LeafB"));
    }

    #[test]
    fn empty_stage_list_is_identity() {
        let inner = leaf();
        assert_eq!(bind_stages(Vec::new(), inner.clone()), inner);
    }

    #[test]
    fn update_before_mount_is_illegal() {
        let (_pool, _renders, ctx) = host();
        let ty = bind(BindingSpec::new().constant("a", 1), Actions::new(), leaf());
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        let err = instance.will_receive_props(RenderProps::new()).err();
        assert_eq!(
            err,
            Some(BindError::IllegalBindState {
                component: "LeafB".to_string()
            })
        );
    }

    #[test]
    fn update_after_unmount_is_illegal() {
        let (_pool, _renders, ctx) = host();
        let ty = bind(BindingSpec::new().constant("a", 1), Actions::new(), leaf());
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();
        instance.will_unmount();
        assert!(instance.will_receive_props(RenderProps::new()).is_err());
    }

    #[test]
    fn mount_subscribes_and_unmount_releases() {
        let (_pool, renders, ctx) = host();
        let count = Data::new(1);
        let ty = bind(
            BindingSpec::new().observable("count", count.clone()),
            Actions::new(),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        assert_eq!(count.subscriber_count(), 0);

        instance.will_mount();
        assert_eq!(count.subscriber_count(), 1);

        count.set(5);
        assert!(renders.0.get() >= 1);
        assert_eq!(rendered_value(&instance.render(), "count"), Some(5));

        instance.will_unmount();
        assert_eq!(count.subscriber_count(), 0);
    }

    #[test]
    fn loader_until_every_binding_is_defined() {
        let _guard = config::test_lock();
        config::set_loader(Placeholder::new("spinner"));

        let (_pool, _renders, ctx) = host();
        let a = Data::new(1);
        let b = Data::<i32>::empty();
        let ty = bind(
            BindingSpec::new()
                .observable("a", a)
                .observable("b", b.clone())
                .constant("c", 3),
            Actions::new(),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();
        let first = instance.render();
        assert_eq!(first.placeholder().map(Placeholder::name), Some("spinner"));

        b.set(2);
        let second = instance.render();
        assert_eq!(rendered_value(&second, "a"), Some(1));
        assert_eq!(rendered_value(&second, "b"), Some(2));
        assert_eq!(rendered_value(&second, "c"), Some(3));
        config::reset();
    }

    #[test]
    fn computed_sees_props_and_previous_value() {
        let (_pool, _renders, ctx) = host();
        let ty = bind(
            BindingSpec::new().computed("total", |props, prev| {
                let step = props.get("step").copied().unwrap_or(0);
                Resolved::Constant(prev.copied().unwrap_or(0) + step)
            }),
            Actions::new(),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new().with_value("step", 2), ctx);
        instance.will_mount();
        assert_eq!(rendered_value(&instance.render(), "total"), Some(2));

        instance
            .will_receive_props(RenderProps::new().with_value("step", 3))
            .ok();
        assert_eq!(rendered_value(&instance.render(), "total"), Some(5));
    }

    #[test]
    fn churn_touches_only_replaced_observable() {
        let (_pool, _renders, ctx) = host();
        let x = Data::new(1);
        let y = Data::new(2);
        let w = Data::new(20);
        let z = Data::new(3);
        let (yy, ww) = (y.clone(), w.clone());
        let ty = bind(
            BindingSpec::new()
                .observable("a", x.clone())
                .computed("b", move |props, _| {
                    if props.contains_key("swap") {
                        Resolved::Reactive(ww.clone())
                    } else {
                        Resolved::Reactive(yy.clone())
                    }
                })
                .observable("c", z.clone()),
            Actions::new(),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();
        assert_eq!(
            [&x, &y, &w, &z].map(Data::subscriber_count),
            [1, 1, 0, 1]
        );

        instance
            .will_receive_props(RenderProps::new().with_value("swap", 1))
            .ok();
        assert_eq!(
            [&x, &y, &w, &z].map(Data::subscriber_count),
            [1, 0, 1, 1]
        );
        assert_eq!(rendered_value(&instance.render(), "b"), Some(20));
    }

    #[test]
    fn actions_reach_their_instance() {
        let (_pool, _renders, ctx) = host();
        let ty = bind(
            BindingSpec::new().constant("count", 0),
            Actions::new()
                .action("bump", |cx: &BoundContext<i32>, args| {
                    let by = args.first().copied().unwrap_or(1);
                    let next = cx.state("count").unwrap_or(0) + by;
                    cx.set_state("count", next);
                })
                .action("bump_twice", |cx, _| {
                    cx.call("bump", &[]);
                    cx.call("bump", &[]);
                }),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();

        let el = instance.render();
        let actions = el.as_node().map(|n| n.props.actions.clone()).unwrap_or_default();
        assert!(actions.call("bump", &[]));
        assert!(actions.call("bump", &[5]));
        assert!(actions.call("bump_twice", &[]));
        assert_eq!(rendered_value(&instance.render(), "count"), Some(8));
    }

    #[test]
    fn action_state_survives_props_update() {
        let _guard = config::test_lock();
        config::set_loader(Placeholder::new("spinner"));

        let (_pool, _renders, ctx) = host();
        let pending = Data::<i32>::empty();
        let p = pending.clone();
        let ty = bind(
            BindingSpec::new().computed("user", move |props, _| match props.get("ready") {
                Some(&v) => Resolved::Constant(v),
                None => Resolved::Reactive(p.clone()),
            }),
            Actions::new().action("open", |cx: &BoundContext<i32>, _| {
                cx.set_state("open", 1);
            }),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new().with_value("ready", 5), ctx);
        instance.will_mount();
        let el = instance.render();
        let actions = el.as_node().map(|n| n.props.actions.clone()).unwrap_or_default();
        assert!(actions.call("open", &[]));

        instance
            .will_receive_props(RenderProps::new().with_value("ready", 6).with_value("x", 9))
            .unwrap();
        let el = instance.render();
        assert_eq!(rendered_value(&el, "open"), Some(1));
        assert_eq!(rendered_value(&el, "user"), Some(6));

        // A spec key that turns undefined is dropped, not left stale.
        instance.will_receive_props(RenderProps::new()).unwrap();
        let el = instance.render();
        assert_eq!(el.placeholder().map(Placeholder::name), Some("spinner"));

        pending.set(7);
        let el = instance.render();
        assert_eq!(rendered_value(&el, "user"), Some(7));
        assert_eq!(rendered_value(&el, "open"), Some(1));
        config::reset();
    }

    #[test]
    fn hooks_fire_in_lifecycle_order() {
        let _guard = config::test_lock();
        config::reset();

        let (_pool, _renders, ctx) = host();
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |tag: &'static str| {
            let log = Rc::clone(&log);
            move |_: &BoundContext<i32>| log.borrow_mut().push(tag)
        };
        let pending = Data::<i32>::empty();
        let ty = bind(
            BindingSpec::new().observable("v", pending.clone()),
            Actions::new()
                .on_mount(push("mount"))
                .on_mounted(push("mounted"))
                .on_load(push("load"))
                .on_loaded(push("loaded"))
                .on_unmount(push("unmount")),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();
        instance.render();
        instance.did_mount();
        instance.render();
        pending.set(1);
        instance.render();
        instance.render();
        instance.will_unmount();

        assert_eq!(
            *log.borrow(),
            vec!["mount", "load", "mounted", "loaded", "unmount"]
        );
    }

    #[test]
    fn advance_once_policy_is_monotonic() {
        let mut phase = LoadPhase::Mounted;
        assert!(advance(&mut phase, false, LoadHookPolicy::Once));
        assert_eq!(phase, LoadPhase::LoadCalled);
        assert!(!advance(&mut phase, false, LoadHookPolicy::Once));
        assert!(advance(&mut phase, true, LoadHookPolicy::Once));
        assert_eq!(phase, LoadPhase::LoadedCalled);
        assert!(!advance(&mut phase, false, LoadHookPolicy::Once));
        assert_eq!(phase, LoadPhase::LoadedCalled);
        assert!(!advance(&mut phase, true, LoadHookPolicy::Once));
    }

    #[test]
    fn advance_every_transition_refires() {
        let mut phase = LoadPhase::Mounted;
        assert!(advance(&mut phase, true, LoadHookPolicy::EveryTransition));
        assert!(advance(&mut phase, false, LoadHookPolicy::EveryTransition));
        assert_eq!(phase, LoadPhase::LoadCalled);
        assert!(advance(&mut phase, true, LoadHookPolicy::EveryTransition));
        assert_eq!(phase, LoadPhase::LoadedCalled);
    }

    #[test]
    fn advance_ignores_unmounted() {
        let mut phase = LoadPhase::Unmounted;
        assert!(!advance(&mut phase, false, LoadHookPolicy::Once));
        assert!(!advance(&mut phase, true, LoadHookPolicy::EveryTransition));
        assert_eq!(phase, LoadPhase::Unmounted);
    }

    #[test]
    fn context_outliving_instance_is_inert() {
        let (_pool, _renders, ctx) = host();
        let kept = Rc::new(RefCell::new(None));
        let k = Rc::clone(&kept);
        let ty = bind(
            BindingSpec::new().constant("a", 1),
            Actions::new().on_mount(move |cx: &BoundContext<i32>| {
                *k.borrow_mut() = Some(cx.clone());
            }),
            leaf(),
        );
        let mut instance = ty.instantiate(RenderProps::new(), ctx);
        instance.will_mount();
        instance.will_unmount();
        drop(instance);

        let cx = kept.borrow_mut().take();
        let cx = cx.as_ref();
        assert_eq!(cx.map(BoundContext::is_alive), Some(false));
        assert_eq!(cx.map(|c| c.set_state("a", 2)), Some(false));
        assert_eq!(cx.map(BoundContext::phase), Some(LoadPhase::Unmounted));
        assert_eq!(cx.map(BoundContext::display_name), Some("LeafB"));
    }
}
