use crate::splitter;
use crate::types::{VfsNode, WriteOutcome};
use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod storage;

pub use storage::{FileStore, MemoryStore, WorkspaceStore};

/// Per-workspace virtual file system over a pluggable key-value store.
///
/// Every mutating call loads the whole tree, mutates it in memory and writes
/// it back. There is no isolation between concurrent writers to the same
/// workspace; the last writer wins (see `WorkspaceStore::compare_and_swap`
/// for the upgrade path).
#[derive(Clone)]
pub struct Vfs {
    store: Arc<dyn WorkspaceStore>,
}

impl Vfs {
    pub fn new(store: Arc<dyn WorkspaceStore>) -> Self {
        Self { store }
    }

    /// Read a document. `None` when the path is missing or is a folder.
    pub fn read(&self, workspace: &str, path: &str) -> Result<Option<String>> {
        let root = self.load_root(workspace)?;
        Ok(match resolve(&root, &segments(path)) {
            Some(VfsNode::File { content }) => Some(content.clone()),
            _ => None,
        })
    }

    /// Write a document, creating missing parent folders. Oversized content
    /// is split into `_part{k}` siblings with an index at the original path.
    pub fn write(&self, workspace: &str, path: &str, content: &str) -> Result<WriteOutcome> {
        let segs = segments(path);
        let Some((name, dir_segs)) = segs.split_last() else {
            return Ok(WriteOutcome::rejected("Cannot write to the workspace root"));
        };

        let mut root = self.load_root(workspace)?;
        let parent = match descend_mut(&mut root, dir_segs) {
            Ok(children) => children,
            Err(message) => return Ok(WriteOutcome::rejected(message)),
        };
        if matches!(parent.get(*name), Some(VfsNode::Folder { .. })) {
            return Ok(WriteOutcome::rejected(format!(
                "A folder already exists at {}",
                path
            )));
        }

        let parts = splitter::split(content, path, splitter::MAX_LINES, splitter::MAX_CHARS);
        let message = if parts.len() == 1 {
            parent.insert(
                (*name).to_string(),
                VfsNode::File {
                    content: content.to_string(),
                },
            );
            None
        } else {
            debug!("Splitting {} into {} parts", path, parts.len());
            for part in &parts {
                parent.insert(
                    file_name(&part.path).to_string(),
                    VfsNode::File {
                        content: part.content.clone(),
                    },
                );
            }
            let index = splitter::build_index(path, &parts);
            parent.insert((*name).to_string(), VfsNode::File { content: index });
            let check = splitter::detect_large(content, splitter::MAX_LINES);
            Some(if check.is_large {
                check.message
            } else {
                // Split was forced by the char limit alone
                format!(
                    "Note: the content was large and was split into {} parts. \
                     An index document was written at {}.",
                    parts.len(),
                    path
                )
            })
        };

        self.persist(workspace, &root)?;
        Ok(WriteOutcome { success: true, message })
    }

    /// Create a folder and any missing parents. Idempotent on existing
    /// folders; `false` when a file occupies the path or an intermediate.
    pub fn mkdir(&self, workspace: &str, path: &str) -> Result<bool> {
        let segs = segments(path);
        let mut root = self.load_root(workspace)?;
        match descend_mut(&mut root, &segs) {
            Ok(_) => {
                self.persist(workspace, &root)?;
                Ok(true)
            }
            Err(message) => {
                debug!("mkdir {} rejected: {}", path, message);
                Ok(false)
            }
        }
    }

    /// Child names of a folder; `None` when the path is not a folder.
    pub fn list(&self, workspace: &str, path: &str) -> Result<Option<Vec<String>>> {
        let root = self.load_root(workspace)?;
        Ok(match resolve(&root, &segments(path)) {
            Some(VfsNode::Folder { children }) => Some(children.keys().cloned().collect()),
            _ => None,
        })
    }

    /// Delete a document. Folders and missing paths yield `false`.
    pub fn delete(&self, workspace: &str, path: &str) -> Result<bool> {
        let segs = segments(path);
        let Some((name, dir_segs)) = segs.split_last() else {
            return Ok(false);
        };

        let mut root = self.load_root(workspace)?;
        let Some(parent) = resolve_children_mut(&mut root, dir_segs) else {
            return Ok(false);
        };
        if !matches!(parent.get(*name), Some(VfsNode::File { .. })) {
            return Ok(false);
        }
        parent.remove(*name);
        self.persist(workspace, &root)?;
        Ok(true)
    }

    /// Reset the workspace to an empty root. Unconditional; confirmation is
    /// a UI concern.
    pub fn delete_all(&self, workspace: &str) -> Result<()> {
        self.persist(workspace, &VfsNode::empty_folder())
    }

    /// Export the whole tree as a zip byte stream. Folders are implicit in
    /// entry paths; entries are named by VFS path without the leading slash.
    pub fn export_archive(&self, workspace: &str) -> Result<Vec<u8>> {
        let root = self.load_root(workspace)?;
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        add_entries(&mut writer, &root, "")?;
        Ok(writer.finish()?.into_inner())
    }

    fn load_root(&self, workspace: &str) -> Result<VfsNode> {
        match self.store.get(workspace)? {
            Some(json) => {
                let node: VfsNode = serde_json::from_str(&json)?;
                if node.is_file() {
                    warn!("Workspace {} root was a file, resetting", workspace);
                    Ok(VfsNode::empty_folder())
                } else {
                    Ok(node)
                }
            }
            None => Ok(VfsNode::empty_folder()),
        }
    }

    fn persist(&self, workspace: &str, root: &VfsNode) -> Result<()> {
        self.store.set(workspace, serde_json::to_string(root)?)
    }
}

/// Normalize a path into segments: split on `/`, drop empty segments, so
/// `/a//b/` and `a/b` are equivalent.
fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

fn resolve<'a>(root: &'a VfsNode, segs: &[&str]) -> Option<&'a VfsNode> {
    let mut node = root;
    for seg in segs {
        node = match node {
            VfsNode::Folder { children } => children.get(*seg)?,
            VfsNode::File { .. } => return None,
        };
    }
    Some(node)
}

/// Walk to the folder at `segs`, creating missing intermediate folders.
/// Errors with a human-readable message when a file blocks the way.
fn descend_mut<'a>(
    root: &'a mut VfsNode,
    segs: &[&str],
) -> Result<&'a mut HashMap<String, VfsNode>, String> {
    let mut node = root;
    for seg in segs {
        let next = match node {
            VfsNode::Folder { children } => children
                .entry((*seg).to_string())
                .or_insert_with(VfsNode::empty_folder),
            VfsNode::File { .. } => return Err("Cannot traverse through a file".to_string()),
        };
        if next.is_file() {
            return Err(format!("A file already exists at segment '{}'", seg));
        }
        node = next;
    }
    match node {
        VfsNode::Folder { children } => Ok(children),
        VfsNode::File { .. } => Err("Cannot traverse through a file".to_string()),
    }
}

/// Non-creating variant of `descend_mut`, used by delete.
fn resolve_children_mut<'a>(
    root: &'a mut VfsNode,
    segs: &[&str],
) -> Option<&'a mut HashMap<String, VfsNode>> {
    let mut node = root;
    for seg in segs {
        node = match node {
            VfsNode::Folder { children } => children.get_mut(*seg)?,
            VfsNode::File { .. } => return None,
        };
    }
    match node {
        VfsNode::Folder { children } => Some(children),
        VfsNode::File { .. } => None,
    }
}

fn add_entries(
    writer: &mut zip::ZipWriter<std::io::Cursor<Vec<u8>>>,
    node: &VfsNode,
    prefix: &str,
) -> Result<()> {
    let VfsNode::Folder { children } = node else {
        return Ok(());
    };
    // Sorted for deterministic archive layout
    let mut names: Vec<&String> = children.keys().collect();
    names.sort();
    for name in names {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        match &children[name] {
            VfsNode::File { content } => {
                writer.start_file(path.as_str(), zip::write::FileOptions::default())?;
                writer.write_all(content.as_bytes())?;
            }
            folder @ VfsNode::Folder { .. } => add_entries(writer, folder, &path)?,
        }
    }
    Ok(())
}
