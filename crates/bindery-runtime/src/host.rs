#![forbid(unsafe_code)]

//! Contract between bound components and the host UI framework.
//!
//! The host owns component instances, calls their lifecycle methods, stores
//! what they render, and re-renders when asked through [`Scheduler`]. Bound
//! components only need the capabilities listed here.

use std::fmt;
use std::rc::Rc;

use bindery_core::Spawner;

use crate::element::{Element, RenderProps};
use crate::error::Result;

/// Host capability for scheduling a re-render after a state change.
pub trait Scheduler {
    fn request_render(&self);
}

/// Host services handed to every component instance at construction.
#[derive(Clone)]
pub struct HostContext {
    scheduler: Rc<dyn Scheduler>,
    spawner: Rc<dyn Spawner>,
}

impl HostContext {
    pub fn new(scheduler: Rc<dyn Scheduler>, spawner: Rc<dyn Spawner>) -> Self {
        Self { scheduler, spawner }
    }

    pub fn request_render(&self) {
        self.scheduler.request_render();
    }

    /// Executor for future-backed bindings.
    #[must_use]
    pub fn spawner(&self) -> Rc<dyn Spawner> {
        Rc::clone(&self.spawner)
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext").finish_non_exhaustive()
    }
}

/// A mounted component instance, driven by the host.
///
/// Call order for one mount cycle: `will_mount`, `render`, `did_mount`, then
/// any number of `will_receive_props`/`render` pairs, then `will_unmount`.
pub trait Component<V> {
    fn will_mount(&mut self) {}

    fn did_mount(&mut self) {}

    fn will_unmount(&mut self) {}

    /// New props from the parent. Only valid while mounted.
    fn will_receive_props(&mut self, props: RenderProps<V>) -> Result<()>;

    fn render(&mut self) -> Element<V>;
}

type RenderFn<V> = dyn Fn(&RenderProps<V>) -> Element<V>;
type Constructor<V> = dyn Fn(RenderProps<V>, HostContext) -> Box<dyn Component<V>>;

enum Kind<V> {
    Function(Rc<RenderFn<V>>),
    Class(Rc<Constructor<V>>),
}

struct TypeInner<V> {
    display_name: String,
    kind: Kind<V>,
    wrapped: Option<ComponentType<V>>,
}

/// A component "class": something the host can instantiate.
///
/// Equality is identity, which is what the host uses to decide between
/// updating an existing child and replacing it.
pub struct ComponentType<V> {
    inner: Rc<TypeInner<V>>,
}

impl<V> ComponentType<V> {
    /// A stateless component rendering straight from its props.
    pub fn function(
        display_name: impl Into<String>,
        render: impl Fn(&RenderProps<V>) -> Element<V> + 'static,
    ) -> Self {
        Self::from_kind(display_name.into(), Kind::Function(Rc::new(render)), None)
    }

    /// A stateful component built by `construct` for each mount.
    pub fn class(
        display_name: impl Into<String>,
        construct: impl Fn(RenderProps<V>, HostContext) -> Box<dyn Component<V>> + 'static,
    ) -> Self {
        Self::from_kind(display_name.into(), Kind::Class(Rc::new(construct)), None)
    }

    pub(crate) fn wrapping(
        display_name: String,
        construct: impl Fn(RenderProps<V>, HostContext) -> Box<dyn Component<V>> + 'static,
        wrapped: ComponentType<V>,
    ) -> Self {
        Self::from_kind(display_name, Kind::Class(Rc::new(construct)), Some(wrapped))
    }

    fn from_kind(display_name: String, kind: Kind<V>, wrapped: Option<ComponentType<V>>) -> Self {
        Self {
            inner: Rc::new(TypeInner {
                display_name,
                kind,
                wrapped,
            }),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// The component this one wraps directly, for bound components.
    #[must_use]
    pub fn wrapped(&self) -> Option<&ComponentType<V>> {
        self.inner.wrapped.as_ref()
    }

    /// The innermost presentational component (`self` if nothing is wrapped).
    #[must_use]
    pub fn component(&self) -> &ComponentType<V> {
        let mut current = self;
        while let Some(next) = current.wrapped() {
            current = next;
        }
        current
    }

    /// Whether this type was produced by binding another component.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.wrapped.is_some()
    }
}

impl<V: 'static> ComponentType<V> {
    /// Construct an instance for mounting.
    #[must_use]
    pub fn instantiate(&self, props: RenderProps<V>, host: HostContext) -> Box<dyn Component<V>> {
        match &self.inner.kind {
            Kind::Function(render) => Box::new(FunctionComponent {
                render: Rc::clone(render),
                props,
            }),
            Kind::Class(construct) => construct(props, host),
        }
    }
}

impl<V> Clone for ComponentType<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> PartialEq for ComponentType<V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V> Eq for ComponentType<V> {}

impl<V> fmt::Debug for ComponentType<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("display_name", &self.inner.display_name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

struct FunctionComponent<V> {
    render: Rc<RenderFn<V>>,
    props: RenderProps<V>,
}

impl<V> Component<V> for FunctionComponent<V> {
    fn will_receive_props(&mut self, props: RenderProps<V>) -> Result<()> {
        self.props = props;
        Ok(())
    }

    fn render(&mut self) -> Element<V> {
        (self.render)(&self.props)
    }
}
