#![forbid(unsafe_code)]

//! bindery public facade crate.
//!
//! Re-exports the observable primitive and the binding orchestrator. The
//! deterministic test host is available with the `harness` feature.
//!
//! ```
//! use bindery::prelude::*;
//!
//! let count = Data::new(1);
//! let card = ComponentType::function("Card", |props: &RenderProps<i32>| {
//!     Element::text(format!("{:?}", props.value("count")))
//! });
//! let bound = bind(BindingSpec::new().observable("count", count), Actions::new(), card);
//! assert_eq!(bound.display_name(), "CardB");
//! ```

pub use bindery_core::{Data, SpawnError, Spawner, Subscriber};
pub use bindery_runtime::{
    Actions, BindError, BindingSpec, BoundContext, ComponentType, Element, RenderProps, Resolved,
    Stage, bind, bind_stages,
};

pub mod prelude {
    pub use bindery_core as core;
    #[cfg(feature = "harness")]
    pub use bindery_harness as harness;
    pub use bindery_runtime as runtime;

    pub use bindery_core::{Data, Spawner, Subscriber};
    pub use bindery_runtime::config::{BindConfig, LoadHookPolicy};
    pub use bindery_runtime::{
        Actions, BindError, Binding, BindingSpec, BoundAction, BoundActions, BoundContext,
        Component, ComponentType, Element, HostContext, Placeholder, Props, RenderProps,
        Resolved, Scheduler, Stage, bind, bind_stages,
    };
}
