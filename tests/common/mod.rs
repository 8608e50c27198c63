//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use trimtree::domain::{Catalog, NodeId, NodeItem, NodeKind};
use trimtree::infrastructure::traits::FileSystem;

/// Canonical tree:
///
/// ```text
/// AND root(42)
/// ├── World(10)
/// ├── OR Foo(33)
/// │   ├── Baz(44)
/// │   ├── Quax(55)
/// │   └── OR Frob(1)
/// │       ├── Crux(5)
/// │       └── Xell(2)
/// ├── Bar(77)
/// └── OR Zyx(3)
///     ├── Xyzzy(11)
///     ├── Sel(12) pinned
///     └── Nonsel(13)
/// ```
pub fn canonical_tree() -> Catalog {
    let mut tree = Catalog::new();
    let root = tree.create(NodeKind::And, 42, NodeItem::new("root"));
    tree.set_root(Some(root));

    tree.append(root, NodeKind::None, 10, NodeItem::new("World"));
    let foo = tree.append(root, NodeKind::Or, 33, NodeItem::new("Foo"));
    tree.append(foo, NodeKind::None, 44, NodeItem::new("Baz"));
    tree.append(foo, NodeKind::None, 55, NodeItem::new("Quax"));
    let frob = tree.append(foo, NodeKind::Or, 1, NodeItem::new("Frob"));
    tree.append(frob, NodeKind::None, 5, NodeItem::new("Crux"));
    tree.append(frob, NodeKind::None, 2, NodeItem::new("Xell"));
    tree.append(root, NodeKind::None, 77, NodeItem::new("Bar"));
    let zyx = tree.append(root, NodeKind::Or, 3, NodeItem::new("Zyx"));
    tree.append(zyx, NodeKind::None, 11, NodeItem::new("Xyzzy"));
    tree.append(zyx, NodeKind::None, 12, NodeItem::pinned("Sel"));
    tree.append(zyx, NodeKind::None, 13, NodeItem::new("Nonsel"));
    tree
}

/// First attached node named `name`.
pub fn find(tree: &Catalog, name: &str) -> NodeId {
    tree.iter()
        .find(|(_, _, node)| node.value().name() == name)
        .map(|(_, id, _)| id)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

pub fn subtree_key(tree: &Catalog, name: &str) -> i64 {
    *tree.node(find(tree, name)).subtree_key()
}

/// In-memory filesystem for service tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.to_string());
        self
    }

    pub fn content(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.content(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
