//! Route registry model.
//!
//! The host environment owns the route table and the role table. Everything
//! the analyzer knows about them arrives through [`RouteRegistry`], so the
//! analysis core never touches host state directly.

pub mod snapshot;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use snapshot::SnapshotRegistry;

/// Name of the canonical "always allow" permission callback.
pub const ALWAYS_ALLOW_SENTINEL: &str = "__return_true";

/// Read-only view of a host route registry.
///
/// Implementations must re-enumerate on every call; callers rely on each
/// call reflecting the registry at that moment.
pub trait RouteRegistry {
    /// All registered routes in registration order.
    fn routes(&self) -> Result<Vec<RegisteredRoute>>;

    /// Role name to granted capabilities.
    fn roles(&self) -> Result<RoleTable>;
}

/// A path pattern and the handlers registered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub path: String,
    pub handlers: Vec<Handler>,
}

impl RegisteredRoute {
    pub fn new(path: impl Into<String>, handlers: Vec<Handler>) -> Self {
        Self {
            path: path.into(),
            handlers,
        }
    }
}

/// One endpoint handler of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handler {
    /// HTTP method to enabled flag, in registration order.
    pub methods: IndexMap<String, bool>,
    /// Check that must pass before the handler runs.
    pub permission: PermissionRef,
    /// Target of the main route callback, if it is a bound method.
    pub callback: Option<CallableTarget>,
}

impl Handler {
    /// Handler with the given methods enabled and no permission check.
    pub fn with_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(|m| (m.into(), true)).collect(),
            ..Default::default()
        }
    }

    pub fn permission(mut self, permission: PermissionRef) -> Self {
        self.permission = permission;
        self
    }

    pub fn callback(mut self, target: CallableTarget) -> Self {
        self.callback = Some(target);
        self
    }

    /// Enabled methods in registration order.
    pub fn enabled_methods(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|(_, &enabled)| enabled)
            .map(|(method, _)| method.clone())
            .collect()
    }
}

/// The permission check a handler declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PermissionRef {
    /// No check registered at all.
    #[default]
    None,
    /// The built-in always-true callback.
    AlwaysAllow,
    /// A plain function referenced by name.
    Named { name: String },
    /// An invocable routine whose source may be located.
    Bound {
        target: CallableTarget,
        source: Option<SourceSpan>,
    },
    /// Anything else; nothing can be learned from it.
    Opaque,
}

impl PermissionRef {
    /// Reference a function by name, folding the sentinel into `AlwaysAllow`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == ALWAYS_ALLOW_SENTINEL {
            Self::AlwaysAllow
        } else {
            Self::Named { name }
        }
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Bound {
            target: CallableTarget::Method {
                class: class.into(),
                method: method.into(),
            },
            source: None,
        }
    }

    /// Attach a source span to a bound reference. Other variants are
    /// returned unchanged.
    pub fn with_source(self, span: SourceSpan) -> Self {
        match self {
            Self::Bound { target, .. } => Self::Bound {
                target,
                source: Some(span),
            },
            other => other,
        }
    }
}

/// What a bound callable points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallableTarget {
    Method { class: String, method: String },
    Closure,
}

impl CallableTarget {
    /// Type name the callable is bound to, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Method { class, .. } => Some(class),
            Self::Closure => None,
        }
    }
}

impl std::fmt::Display for CallableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Method { class, method } => write!(f, "{class}::{method}"),
            Self::Closure => write!(f, "Closure/Anonymous function"),
        }
    }
}

/// Location of a routine's definition. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

/// A role and the capabilities it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: IndexMap<String, bool>,
}

impl RoleDefinition {
    pub fn grants(&self, capability: &str) -> bool {
        self.capabilities.get(capability).copied().unwrap_or(false)
    }
}

/// Role name to definition, in registration order.
pub type RoleTable = IndexMap<String, RoleDefinition>;

/// Registry held in memory. Used by embedders that already hold the route
/// table, and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    routes: Vec<RegisteredRoute>,
    roles: RoleTable,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, route: RegisteredRoute) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn add_role<I, S>(&mut self, role: impl Into<String>, capabilities: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let definition = RoleDefinition {
            name: None,
            capabilities: capabilities.into_iter().map(|c| (c.into(), true)).collect(),
        };
        self.roles.insert(role.into(), definition);
        self
    }
}

impl RouteRegistry for InMemoryRegistry {
    fn routes(&self) -> Result<Vec<RegisteredRoute>> {
        Ok(self.routes.clone())
    }

    fn roles(&self) -> Result<RoleTable> {
        Ok(self.roles.clone())
    }
}
