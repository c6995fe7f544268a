use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use super::*;
use crate::error::{Result, ScanError};

/// Registry backed by a JSON export of the host's route and role tables.
///
/// The file is re-read on every call so that consecutive calls observe
/// changes to the export.
pub struct SnapshotRegistry {
    path: PathBuf,
}

impl SnapshotRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RawSnapshot> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ScanError::Registry(format!("cannot read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ScanError::Registry(format!("malformed snapshot {}: {e}", self.path.display()))
        })
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl RouteRegistry for SnapshotRegistry {
    fn routes(&self) -> Result<Vec<RegisteredRoute>> {
        let snapshot = self.load()?;
        let base = self.base_dir();

        let routes = snapshot
            .routes
            .into_iter()
            .map(|(path, handlers)| RegisteredRoute {
                path,
                handlers: handlers
                    .into_iter()
                    .map(|raw| raw.into_handler(base))
                    .collect(),
            })
            .collect();

        Ok(routes)
    }

    fn roles(&self) -> Result<RoleTable> {
        Ok(self.load()?.roles)
    }
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    routes: IndexMap<String, Vec<RawHandler>>,
    #[serde(default)]
    roles: RoleTable,
}

#[derive(Debug, Deserialize)]
struct RawHandler {
    #[serde(default)]
    methods: IndexMap<String, bool>,
    #[serde(default)]
    permission_callback: Option<RawCallback>,
    #[serde(default)]
    callback: Option<RawCallback>,
}

/// A callback as exported by the host: either a function name or an
/// object describing a callable.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCallback {
    Name(String),
    Callable(RawCallable),
}

#[derive(Debug, Default, Deserialize)]
struct RawCallable {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    closure: bool,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    start_line: Option<usize>,
    #[serde(default)]
    end_line: Option<usize>,
}

impl RawCallable {
    fn target(&self) -> Option<CallableTarget> {
        match (&self.class, &self.method) {
            (Some(class), Some(method)) => Some(CallableTarget::Method {
                class: class.clone(),
                method: method.clone(),
            }),
            _ if self.closure => Some(CallableTarget::Closure),
            _ => None,
        }
    }

    fn span(&self, base: &Path) -> Option<SourceSpan> {
        let file = self.file.as_ref()?;
        let file = if file.is_relative() {
            base.join(file)
        } else {
            file.clone()
        };
        Some(SourceSpan {
            file,
            start_line: self.start_line?,
            end_line: self.end_line?,
        })
    }
}

impl RawHandler {
    fn into_handler(self, base: &Path) -> Handler {
        let permission = match self.permission_callback {
            None => PermissionRef::None,
            Some(RawCallback::Name(name)) => PermissionRef::named(name),
            Some(RawCallback::Callable(callable)) => match callable.target() {
                Some(target) => PermissionRef::Bound {
                    target,
                    source: callable.span(base),
                },
                None => PermissionRef::Opaque,
            },
        };

        let callback = match self.callback {
            Some(RawCallback::Callable(callable)) => callable.target(),
            _ => None,
        };

        Handler {
            methods: self.methods,
            permission,
            callback,
        }
    }
}
