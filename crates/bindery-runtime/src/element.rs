#![forbid(unsafe_code)]

//! Elements and props handed between bound components and the host.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::actions::{BoundAction, BoundActions};
use crate::host::ComponentType;

/// Plain prop values, ordered by key.
pub type Props<V> = BTreeMap<String, V>;

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

/// Host-defined element shown while a bound component is still loading.
///
/// The core never draws it; it only decides when to return it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholder {
    name: String,
    attributes: BTreeMap<String, String>,
}

impl Placeholder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// RenderProps
// ---------------------------------------------------------------------------

/// Props as seen by a rendered component: values plus bound actions.
///
/// Actions live in their own namespace, so a value and an action may share a
/// key without either replacing the other.
pub struct RenderProps<V> {
    pub values: Props<V>,
    pub actions: BoundActions<V>,
}

impl<V> RenderProps<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Props::new(),
            actions: BoundActions::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: V) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&BoundAction<V>> {
        self.actions.get(name)
    }
}

impl<V: Clone> RenderProps<V> {
    /// Shallow merge in the order props → state → actions.
    ///
    /// `state` overrides values of the same key; `actions` override
    /// incoming actions of the same name.
    #[must_use]
    pub fn merged(&self, state: &Props<V>, actions: &BoundActions<V>) -> Self {
        let mut values = self.values.clone();
        values.extend(state.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut merged_actions = self.actions.clone();
        merged_actions.extend(actions);
        Self {
            values,
            actions: merged_actions,
        }
    }
}

impl<V> Default for RenderProps<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for RenderProps<V> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<V> From<Props<V>> for RenderProps<V> {
    fn from(values: Props<V>) -> Self {
        Self {
            values,
            actions: BoundActions::new(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RenderProps<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderProps")
            .field("values", &self.values)
            .field("actions", &self.actions)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A component type paired with the props it should be rendered with.
pub struct Node<V> {
    pub ty: ComponentType<V>,
    pub props: RenderProps<V>,
}

/// Output of a render.
pub enum Element<V> {
    /// Nothing to show (also the loader when none is configured).
    Empty,
    /// A host text leaf.
    Text(String),
    /// The configured loading placeholder.
    Placeholder(Arc<Placeholder>),
    /// A component to instantiate or update.
    Node(Node<V>),
}

impl<V> Element<V> {
    /// Element factory: render `ty` with `props`.
    #[must_use]
    pub fn create(ty: ComponentType<V>, props: RenderProps<V>) -> Self {
        Self::Node(Node { ty, props })
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    #[must_use]
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Node<V>> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl<V: Clone> Clone for Element<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Text(text) => Self::Text(text.clone()),
            Self::Placeholder(p) => Self::Placeholder(Arc::clone(p)),
            Self::Node(node) => Self::Node(Node {
                ty: node.ty.clone(),
                props: node.props.clone(),
            }),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Element<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Placeholder(p) => f.debug_tuple("Placeholder").field(p).finish(),
            Self::Node(node) => f
                .debug_struct("Node")
                .field("ty", &node.ty.display_name())
                .field("props", &node.props)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::BoundAction;

    #[test]
    fn merge_order_is_props_then_state() {
        let props = RenderProps::new()
            .with_value("title", 1)
            .with_value("count", 2);
        let mut state = Props::new();
        state.insert("count".to_string(), 20);
        state.insert("extra".to_string(), 30);

        let merged = props.merged(&state, &BoundActions::new());
        assert_eq!(merged.value("title"), Some(&1));
        assert_eq!(merged.value("count"), Some(&20));
        assert_eq!(merged.value("extra"), Some(&30));
    }

    #[test]
    fn own_actions_override_incoming() {
        let mut incoming = BoundActions::new();
        incoming.insert(BoundAction::new("save", |_: &[i32]| {}));
        let outer = incoming.get("save").cloned();

        let mut own = BoundActions::new();
        own.insert(BoundAction::new("save", |_: &[i32]| {}));
        own.insert(BoundAction::new("reset", |_: &[i32]| {}));

        let props = RenderProps {
            values: Props::new(),
            actions: incoming,
        };
        let merged = props.merged(&Props::new(), &own);
        assert_eq!(merged.actions.len(), 2);
        assert_ne!(merged.action("save"), outer.as_ref());
        assert_eq!(merged.action("save"), own.get("save"));
    }

    #[test]
    fn placeholder_attributes() {
        let p = Placeholder::new("spinner").with_attribute("size", "small");
        assert_eq!(p.name(), "spinner");
        assert_eq!(p.attribute("size"), Some("small"));
        assert_eq!(p.attribute("color"), None);
    }

    #[test]
    fn element_accessors() {
        let el: Element<i32> = Element::Placeholder(Arc::new(Placeholder::new("spinner")));
        assert!(el.is_placeholder());
        assert_eq!(el.placeholder().map(Placeholder::name), Some("spinner"));
        assert!(el.as_node().is_none());

        let text: Element<i32> = Element::text("hello");
        assert_eq!(text.as_text(), Some("hello"));
    }
}
