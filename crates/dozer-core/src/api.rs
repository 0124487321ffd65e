//! Typed wrappers over the Dozer JSON-RPC methods.
//!
//! Arguments are validated before any request is issued; a bad argument is
//! an [`InputError`] and nothing reaches the transport.

use crate::error::InputError;
use crate::note::{Note, RevisionId};
use crate::rpc::{RpcClient, TypedCall};
use crate::sync::{NoteOperation, UpdateNotepageResult};
use crate::transform::MicronVec;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_NAMESPACE: &str = "dozer";

/// Kind of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeClass {
    Folder,
    Notepage,
    Note,
    #[serde(other)]
    Unknown,
}

/// A node returned by `list_folder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub class: NodeClass,
    pub node_id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub path_components: Vec<String>,
}

/// Sort folder entries for display: case-insensitive by name.
pub fn sort_for_listing(entries: &mut [FolderEntry]) {
    entries.sort_by(|a, b| {
        a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.name.cmp(&b.name))
    });
}

/// A notepage node, as returned by `create_notepage` or embedded in a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotepageInfo {
    pub node_id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub path_components: Vec<String>,
    pub revision_id: RevisionId,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default)]
    pub grid_um: Option<MicronVec>,
    #[serde(default)]
    pub grid_subdivisions: Option<i64>,
}

/// Split and validate a node path.
///
/// Repeated slashes collapse; `.` and `..` are rejected. The root path
/// yields no components.
pub fn path_components(path: &str) -> Result<Vec<String>, InputError> {
    path.split('/')
        .filter(|element| !element.is_empty())
        .map(|element| match element {
            "." | ".." => Err(InputError::IllegalPathElement {
                element: element.to_string(),
                path: path.to_string(),
            }),
            _ => Ok(element.to_string()),
        })
        .collect()
}

/// Normalize a path that must name a node below the root.
pub fn node_path(path: &str, what: &'static str) -> Result<String, InputError> {
    let components = path_components(path)?;
    if components.is_empty() {
        return Err(InputError::RootPath { what });
    }
    Ok(format!("/{}", components.join("/")))
}

/// Method names under a configurable namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Api {
    namespace: String,
}

impl Default for Api {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl Api {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn method(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    pub fn create_folder<T: Transport>(
        &self,
        client: &mut RpcClient<T>,
        folder_name: &str,
    ) -> Result<TypedCall<Value>, InputError> {
        let node_name = node_path(folder_name, "Folder name")?;
        client.call_typed(&self.method("create_folder"), json!({ "node_name": node_name }))
    }

    pub fn create_notepage<T: Transport>(
        &self,
        client: &mut RpcClient<T>,
        notepage_name: &str,
    ) -> Result<TypedCall<NotepageInfo>, InputError> {
        let node_name = node_path(notepage_name, "Notepage name")?;
        client.call_typed(&self.method("create_notepage"), json!({ "node_name": node_name }))
    }

    /// List a folder. The root folder (`/`) is allowed here.
    pub fn list_folder<T: Transport>(
        &self,
        client: &mut RpcClient<T>,
        folder_name: &str,
    ) -> Result<TypedCall<Vec<FolderEntry>>, InputError> {
        let node_name = format!("/{}", path_components(folder_name)?.join("/"));
        client.call_typed(&self.method("list_folder"), json!({ "node_name": node_name }))
    }

    pub fn create_note<T: Transport>(
        &self,
        client: &mut RpcClient<T>,
        notepage_name: &str,
        pos_um: Option<MicronVec>,
        size_um: Option<MicronVec>,
    ) -> Result<TypedCall<Note>, InputError> {
        let notepage_name = node_path(notepage_name, "Notepage name")?;
        if let Some(size) = size_um {
            if size.x <= 0 || size.y <= 0 {
                return Err(InputError::NonPositiveSize { size });
            }
        }

        let mut params = Map::new();
        params.insert("notepage_name".into(), Value::String(notepage_name));
        if let Some(pos) = pos_um {
            params.insert("pos_um".into(), json!(pos));
        }
        if let Some(size) = size_um {
            params.insert("size_um".into(), json!(size));
        }
        client.call_typed(&self.method("create_note"), Value::Object(params))
    }

    pub fn update_notepage<T: Transport>(
        &self,
        client: &mut RpcClient<T>,
        notepage_name: &str,
        operations: &[NoteOperation],
    ) -> Result<TypedCall<UpdateNotepageResult>, InputError> {
        let notepage_name = node_path(notepage_name, "Notepage name")?;
        let method = self.method("update_notepage");
        let operations = serde_json::to_value(operations).map_err(|e| InputError::Encode {
            method: method.clone(),
            reason: e.to_string(),
        })?;
        client.call_typed(
            &method,
            json!({ "notepage_name": notepage_name, "operations": operations }),
        )
    }
}
