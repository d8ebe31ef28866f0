//! # Layer Stack: the introspectable shape of a routing component
//!
//! A routing component is an ordered stack of layers. Each layer is a direct
//! route, a mounted sub-router carrying its own stack, or plain middleware.
//! Registration order is part of the contract: it decides match priority.
//!
//! Components publish their stack through [`Introspect`] instead of having
//! their internals reflected over.

use crate::error::{CharacterizeError, CharacterizeResult};
use serde::{Deserialize, Serialize};

/// Name substituted for layers registered without one.
pub const ANONYMOUS: &str = "anonymous";

/// One registered layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: LayerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    /// Terminal binding of one or more methods to a literal path.
    Route { path: String, methods: Vec<String> },
    /// Sub-router mounted under `prefix`.
    Router {
        prefix: String,
        layers: Vec<LayerInfo>,
    },
    /// Anything else in the pipeline.
    Middleware,
}

impl LayerInfo {
    pub fn route(
        name: Option<String>,
        path: impl Into<String>,
        methods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name,
            kind: LayerKind::Route {
                path: path.into(),
                methods: methods.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn router(name: Option<String>, prefix: impl Into<String>, layers: Vec<LayerInfo>) -> Self {
        Self {
            name,
            kind: LayerKind::Router {
                prefix: prefix.into(),
                layers,
            },
        }
    }

    pub fn middleware(name: Option<String>) -> Self {
        Self {
            name,
            kind: LayerKind::Middleware,
        }
    }

    /// The declared name, or [`ANONYMOUS`].
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Check that this layer (and everything nested in it) has the shape the
    /// introspector relies on.
    pub fn validate(&self) -> CharacterizeResult<()> {
        match &self.kind {
            LayerKind::Route { path, methods } => {
                if path.is_empty() {
                    return Err(CharacterizeError::invalid("route layer has an empty path"));
                }
                if !path.starts_with('/') {
                    return Err(CharacterizeError::invalid(format!(
                        "route path `{path}` does not start with `/`"
                    )));
                }
                if methods.is_empty() {
                    return Err(CharacterizeError::invalid(format!(
                        "route `{path}` declares no methods"
                    )));
                }
                if methods.iter().any(|m| m.trim().is_empty()) {
                    return Err(CharacterizeError::invalid(format!(
                        "route `{path}` declares a blank method"
                    )));
                }
                Ok(())
            }
            LayerKind::Router { prefix, layers } => {
                if !prefix.is_empty() && !prefix.starts_with('/') {
                    return Err(CharacterizeError::invalid(format!(
                        "mount prefix `{prefix}` does not start with `/`"
                    )));
                }
                layers.iter().try_for_each(LayerInfo::validate)
            }
            LayerKind::Middleware => Ok(()),
        }
    }
}

/// A flattened `(path, methods)` pair as compared against a baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub methods: String,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, methods: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: methods.into(),
        }
    }
}

/// Explicit introspection interface of a routing component.
pub trait Introspect {
    /// The top-level layer stack in registration order.
    fn layer_stack(&self) -> CharacterizeResult<Vec<LayerInfo>>;
}

impl Introspect for [LayerInfo] {
    fn layer_stack(&self) -> CharacterizeResult<Vec<LayerInfo>> {
        Ok(self.to_vec())
    }
}

impl Introspect for Vec<LayerInfo> {
    fn layer_stack(&self) -> CharacterizeResult<Vec<LayerInfo>> {
        Ok(self.clone())
    }
}

/// A layer stack previously dumped to JSON (e.g. by another process).
impl Introspect for serde_json::Value {
    fn layer_stack(&self) -> CharacterizeResult<Vec<LayerInfo>> {
        if !self.is_array() {
            return Err(CharacterizeError::invalid(
                "serialized layer stack must be a JSON array",
            ));
        }
        serde_json::from_value(self.clone()).map_err(|e| CharacterizeError::invalid(e.to_string()))
    }
}
