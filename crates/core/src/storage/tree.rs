//! Directory tree reconstruction over flat or hierarchical backends.

use futures::TryStreamExt;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use super::backend::{EntryKind, ListEntry};
use super::error::StorageError;
use super::path::StoragePath;
use super::url::UrlIssuer;

/// A node in a listed storage tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// An object with a browser-usable URL.
    File {
        /// Object key.
        path: StoragePath,
        /// Public or signed URL.
        url: String,
    },
    /// A folder and everything below it.
    Folder {
        /// Folder key; empty for the root.
        path: StoragePath,
        /// Files first, then sub-folders.
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    /// Key of this node.
    #[must_use]
    pub fn path(&self) -> &StoragePath {
        match self {
            Self::File { path, .. } | Self::Folder { path, .. } => path,
        }
    }

    /// Children of a folder node; empty for files.
    #[must_use]
    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::File { .. } => &[],
            Self::Folder { children, .. } => children,
        }
    }

    /// Consumes a folder node, returning its children.
    #[must_use]
    pub fn into_children(self) -> Vec<TreeNode> {
        match self {
            Self::File { .. } => Vec::new(),
            Self::Folder { children, .. } => children,
        }
    }
}

/// Recursively lists `folder` into a [`TreeNode::Folder`].
///
/// A missing folder yields an empty folder node.
///
/// # Errors
///
/// Returns the first listing or URL error encountered.
pub async fn list_tree(issuer: &UrlIssuer, folder: &StoragePath) -> Result<TreeNode, StorageError> {
    let children = walk(issuer, folder.clone()).await?;
    Ok(TreeNode::Folder {
        path: folder.clone(),
        children,
    })
}

fn walk(issuer: &UrlIssuer, folder: StoragePath) -> BoxFuture<'_, Result<Vec<TreeNode>, StorageError>> {
    async move {
        let entries: Vec<ListEntry> = issuer.backend().list(&folder).await?.try_collect().await?;
        let (files, folders): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.kind == EntryKind::File);

        let mut nodes = Vec::with_capacity(files.len() + folders.len());
        for entry in files {
            let url = issuer.url_for(&entry.path).await?.into_string();
            nodes.push(TreeNode::File {
                path: entry.path,
                url,
            });
        }
        for entry in folders {
            let children = walk(issuer, entry.path.clone()).await?;
            nodes.push(TreeNode::Folder {
                path: entry.path,
                children,
            });
        }

        tracing::debug!(folder = %folder, entries = nodes.len(), "Listed folder");
        Ok(nodes)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::storage::backend::StorageBackend;
    use crate::storage::body::from_bytes;
    use crate::storage::path::normalize;
    use crate::storage::testing::FakeRemote;
    use crate::storage::{OperatorBackend, StorageProvider};

    const KEYS: [&str; 3] = ["a/b.txt", "a/c/d.txt", "e.txt"];

    fn p(raw: &str) -> StoragePath {
        normalize(raw).unwrap()
    }

    async fn seed(backend: &dyn StorageBackend) {
        for key in KEYS {
            backend.put(&p(key), from_bytes("x"), None).await.unwrap();
        }
    }

    /// Sorts children by key, for backends without a stable enumeration order.
    fn sorted(node: TreeNode) -> TreeNode {
        match node {
            TreeNode::Folder { path, children } => {
                let mut children: Vec<_> = children.into_iter().map(sorted).collect();
                children.sort_by_key(|child| {
                    (matches!(child, TreeNode::Folder { .. }), child.path().clone())
                });
                TreeNode::Folder { path, children }
            }
            file => file,
        }
    }

    fn shape(node: &TreeNode) -> String {
        match node {
            TreeNode::File { path, .. } => path.to_string(),
            TreeNode::Folder { path, children } => {
                let inner: Vec<_> = children.iter().map(shape).collect();
                format!("{path}/[{}]", inner.join(","))
            }
        }
    }

    #[tokio::test]
    async fn test_tree_from_hierarchical_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = OperatorBackend::from_provider(&StorageProvider::local_fs(
            dir.path(),
            "http://localhost/storage",
        ))
        .unwrap();
        seed(&backend).await;
        let issuer = UrlIssuer::new(Arc::new(backend), Duration::from_secs(600));

        let tree = sorted(list_tree(&issuer, &StoragePath::root()).await.unwrap());

        assert_eq!(shape(&tree), "/[e.txt,a/[a/b.txt,a/c/[a/c/d.txt]]]");
        match &tree.children()[0] {
            TreeNode::File { url, .. } => assert_eq!(url, "http://localhost/storage/e.txt"),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tree_from_flat_keys() {
        let backend = FakeRemote::new();
        seed(&backend).await;
        let issuer = UrlIssuer::new(Arc::new(backend), Duration::from_secs(600));

        let tree = sorted(list_tree(&issuer, &StoragePath::root()).await.unwrap());

        assert_eq!(shape(&tree), "/[e.txt,a/[a/b.txt,a/c/[a/c/d.txt]]]");
        match &tree.children()[0] {
            TreeNode::File { url, .. } => assert!(url.starts_with("https://fake-bucket.test/e.txt?")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subfolder_and_missing_folder() {
        let backend = FakeRemote::new();
        seed(&backend).await;
        let issuer = UrlIssuer::new(Arc::new(backend), Duration::from_secs(600));

        let tree = list_tree(&issuer, &p("a/c")).await.unwrap();
        assert_eq!(shape(&tree), "a/c/[a/c/d.txt]");

        let tree = list_tree(&issuer, &p("ghost")).await.unwrap();
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_tree_node_serialization() {
        let node = TreeNode::Folder {
            path: p("a"),
            children: vec![TreeNode::File {
                path: p("a/b.txt"),
                url: "http://x/a/b.txt".into(),
            }],
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "folder",
                "path": "a",
                "children": [{"type": "file", "path": "a/b.txt", "url": "http://x/a/b.txt"}]
            })
        );
    }
}
