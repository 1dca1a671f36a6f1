#![forbid(unsafe_code)]

//! Single-threaded test host.
//!
//! # Render model
//!
//! Every component in this host renders at most one child, so a mounted tree
//! is a chain from the root to whatever the innermost component returned. A
//! render pass walks the chain top-down:
//!
//! - `Element::Node` with the same type as the existing child updates it via
//!   `will_receive_props`; a different type unmounts the old subtree and
//!   mounts a fresh instance.
//! - Anything else ends the chain and becomes the host output.
//!
//! After the pass, newly mounted instances receive `did_mount`, innermost
//! first.
//!
//! # Invariants
//!
//! 1. A pass satisfies every render request made before it. Requests made
//!    while mounting or updating a child are absorbed, since that child
//!    renders next in the same pass; requests made by `render` itself are
//!    not, and schedule another pass.
//! 2. `settle` returns only when no render is pending and the executor has
//!    no runnable task, or fails with [`HarnessError::Unsettled`].
//! 3. Unmount runs `will_unmount` outermost first.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bindery_core::Spawner;
use bindery_runtime::{
    Component, ComponentType, Element, HostContext, RenderProps, Scheduler,
};
use futures::executor::LocalPool;

use crate::error::HarnessError;
use crate::trace::{RenderTrace, TraceEvent};

/// Pass limit used by [`TestHost::new`].
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Scheduler that records whether a render was requested.
#[derive(Debug, Default)]
pub struct DirtyFlag {
    dirty: Cell<bool>,
    requests: Cell<u64>,
}

impl DirtyFlag {
    /// Read and clear the flag.
    pub fn take(&self) -> bool {
        self.dirty.replace(false)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Run `f`, dropping the render requests it makes. A request that was
    /// already pending stays pending.
    pub fn absorb<R>(&self, f: impl FnOnce() -> R) -> R {
        let pending = self.take();
        let result = f();
        self.dirty.set(pending);
        result
    }

    /// Total requests since creation.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl Scheduler for DirtyFlag {
    fn request_render(&self) {
        self.dirty.set(true);
        self.requests.set(self.requests.get() + 1);
    }
}

struct Mounted<V> {
    ty: ComponentType<V>,
    instance: Box<dyn Component<V>>,
    fresh: bool,
}

/// Deterministic host for one root component.
pub struct TestHost<V> {
    root: ComponentType<V>,
    props: RenderProps<V>,
    executor: LocalPool,
    dirty: Rc<DirtyFlag>,
    context: HostContext,
    mounted: Vec<Mounted<V>>,
    output: Option<Element<V>>,
    leaf_props: Option<RenderProps<V>>,
    trace: RenderTrace,
    passes: usize,
    max_passes: usize,
}

impl<V: Clone + PartialEq + fmt::Debug + 'static> TestHost<V> {
    pub fn new(root: ComponentType<V>, props: RenderProps<V>) -> Self {
        Self::with_executor(root, props, LocalPool::new())
    }

    /// Use an existing executor, so observables created against its spawner
    /// before the host existed are driven by this host.
    pub fn with_executor(root: ComponentType<V>, props: RenderProps<V>, executor: LocalPool) -> Self {
        let dirty = Rc::new(DirtyFlag::default());
        let context = HostContext::new(dirty.clone(), Rc::new(executor.spawner()));
        Self {
            root,
            props,
            executor,
            dirty,
            context,
            mounted: Vec::new(),
            output: None,
            leaf_props: None,
            trace: RenderTrace::new(),
            passes: 0,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Mount the root, render it, and settle.
    pub fn mount(&mut self) -> Result<(), HarnessError> {
        if !self.mounted.is_empty() {
            return Err(HarnessError::AlreadyMounted);
        }
        let ty = self.root.clone();
        self.mount_child(ty, self.props.clone());
        self.render_pass()?;
        self.settle().map(|_| ())
    }

    /// Hand the root new props, re-render, and settle.
    pub fn set_props(&mut self, props: RenderProps<V>) -> Result<(), HarnessError> {
        let root = self.mounted.first_mut().ok_or(HarnessError::NotMounted)?;
        self.props = props.clone();
        self.dirty.absorb(|| root.instance.will_receive_props(props))?;
        self.trace.record(TraceEvent::Update {
            depth: 0,
            component: root.ty.display_name().to_string(),
        });
        self.render_pass()?;
        self.settle().map(|_| ())
    }

    /// Unmount the whole chain, outermost first.
    pub fn unmount(&mut self) -> Result<(), HarnessError> {
        if self.mounted.is_empty() {
            return Err(HarnessError::NotMounted);
        }
        self.unmount_from(0);
        self.output = None;
        self.leaf_props = None;
        self.dirty.take();
        Ok(())
    }

    /// Drive spawned futures and pending re-renders until nothing changes.
    ///
    /// Returns the number of render passes performed.
    pub fn settle(&mut self) -> Result<usize, HarnessError> {
        let mut passes = 0;
        loop {
            self.executor.run_until_stalled();
            if !self.dirty.take() {
                break;
            }
            if self.mounted.is_empty() {
                continue;
            }
            if passes == self.max_passes {
                tracing::warn!(passes, "host did not settle");
                return Err(HarnessError::Unsettled { passes });
            }
            self.render_pass()?;
            passes += 1;
        }
        self.trace.record(TraceEvent::Settled { passes });
        Ok(passes)
    }

    /// Run spawned futures without rendering.
    pub fn run_until_stalled(&mut self) {
        self.executor.run_until_stalled();
    }

    /// One top-down render of the mounted chain.
    pub fn render_pass(&mut self) -> Result<(), HarnessError> {
        if self.mounted.is_empty() {
            return Err(HarnessError::NotMounted);
        }
        self.passes += 1;
        self.dirty.take();
        let mut leaf_props = None;
        let mut depth = 0;
        let output = loop {
            let node = match self.mounted[depth].instance.render() {
                Element::Node(node) => node,
                other => {
                    self.unmount_from(depth + 1);
                    break other;
                }
            };
            if !node.ty.is_bound() {
                leaf_props = Some(node.props.clone());
            }
            depth += 1;
            let reused = self.mounted.get(depth).is_some_and(|child| child.ty == node.ty);
            if reused {
                let child = &mut self.mounted[depth];
                self.dirty
                    .absorb(|| child.instance.will_receive_props(node.props))?;
                self.trace.record(TraceEvent::Update {
                    depth,
                    component: node.ty.display_name().to_string(),
                });
            } else {
                self.unmount_from(depth);
                self.mount_child(node.ty, node.props);
            }
        };

        let summary = describe(&output, leaf_props.as_ref());
        tracing::debug!(pass = self.passes, depth, output = %summary, "render pass");
        self.trace.record(TraceEvent::Output {
            pass: self.passes,
            output: summary,
        });
        self.output = Some(output);
        self.leaf_props = leaf_props;

        for mounted in self.mounted.iter_mut().rev() {
            if mounted.fresh {
                mounted.fresh = false;
                mounted.instance.did_mount();
            }
        }
        Ok(())
    }

    fn mount_child(&mut self, ty: ComponentType<V>, props: RenderProps<V>) {
        let mut instance = ty.instantiate(props, self.context.clone());
        self.dirty.absorb(|| instance.will_mount());
        self.trace.record(TraceEvent::Mount {
            depth: self.mounted.len(),
            component: ty.display_name().to_string(),
        });
        self.mounted.push(Mounted {
            ty,
            instance,
            fresh: true,
        });
    }

    fn unmount_from(&mut self, depth: usize) {
        if depth >= self.mounted.len() {
            return;
        }
        for (offset, mounted) in self.mounted[depth..].iter_mut().enumerate() {
            mounted.instance.will_unmount();
            self.trace.record(TraceEvent::Unmount {
                depth: depth + offset,
                component: mounted.ty.display_name().to_string(),
            });
        }
        self.mounted.truncate(depth);
    }

    /// What the innermost component rendered in the last pass.
    #[must_use]
    pub fn output(&self) -> Option<&Element<V>> {
        self.output.as_ref()
    }

    /// Props the innermost unbound component received in the last pass;
    /// `None` while a bound component shows its loader.
    #[must_use]
    pub fn leaf_props(&self) -> Option<&RenderProps<V>> {
        self.leaf_props.as_ref()
    }

    /// Shortcut for a value of [`leaf_props`](Self::leaf_props).
    #[must_use]
    pub fn leaf_value(&self, key: &str) -> Option<&V> {
        self.leaf_props.as_ref()?.value(key)
    }

    /// Whether the last pass ended on the loading placeholder.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        let bound_tail = self.mounted.last().is_some_and(|m| m.ty.is_bound());
        self.output.as_ref().is_some_and(|output| {
            output.is_placeholder() || (bound_tail && matches!(output, Element::Empty))
        })
    }

    /// Display names of the mounted chain, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<&str> {
        self.mounted.iter().map(|m| m.ty.display_name()).collect()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_empty()
    }

    /// Render passes since creation.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }

    #[must_use]
    pub fn spawner(&self) -> Rc<dyn Spawner> {
        self.context.spawner()
    }

    #[must_use]
    pub fn scheduler(&self) -> &DirtyFlag {
        &self.dirty
    }

    #[must_use]
    pub fn trace(&self) -> &RenderTrace {
        &self.trace
    }
}

impl<V> fmt::Debug for TestHost<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHost")
            .field("root", &self.root.display_name())
            .field("mounted", &self.mounted.len())
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

fn describe<V: fmt::Debug>(output: &Element<V>, leaf: Option<&RenderProps<V>>) -> String {
    let head = match output {
        Element::Empty => "empty".to_string(),
        Element::Text(text) => format!("text:{text}"),
        Element::Placeholder(p) => format!("placeholder:{}", p.name()),
        Element::Node(node) => format!("node:{}", node.ty.display_name()),
    };
    match leaf {
        Some(props) => format!("{head} {:?}", props.values),
        None => head,
    }
}
