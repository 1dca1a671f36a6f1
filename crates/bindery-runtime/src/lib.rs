#![forbid(unsafe_code)]

//! Declarative data binding for host UI components.
//!
//! [`bind`] turns a [`BindingSpec`] plus [`Actions`] into a wrapping
//! component type. While mounted, the wrapper keeps every observable the spec
//! currently resolves to subscribed, renders the configured loader until all
//! bindings are defined, and then renders the wrapped component with the
//! incoming props, resolved values and bound actions merged.
//!
//! # Modules
//!
//! - [`spec`]: binding specifications and their resolution descriptors.
//! - [`actions`]: named actions and lifecycle hooks.
//! - [`bind`]: the orchestrator and multi-stage composition.
//! - [`host`]: the component contract a host framework drives.
//! - [`element`]: render output and props.
//! - [`config`]: process-wide loader and hook policy.
//! - [`error`]: lifecycle errors.

pub mod actions;
pub mod bind;
pub mod config;
pub mod element;
pub mod error;
pub mod host;
pub mod spec;

pub use actions::{Actions, BoundAction, BoundActions, Hooks};
pub use bind::{BoundContext, LoadPhase, Stage, bind, bind_stages};
pub use config::{BindConfig, LoadHookPolicy};
pub use element::{Element, Node, Placeholder, Props, RenderProps};
pub use error::{BindError, Result};
pub use host::{Component, ComponentType, HostContext, Scheduler};
pub use spec::{Binding, BindingSpec, Resolved};

pub use bindery_core::{Data, Spawner, Subscriber};
