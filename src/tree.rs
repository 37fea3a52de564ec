use indextree::{Arena, NodeId};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// One filesystem entry held in the tree arena.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    pub is_dir: bool,
    /// False until the directory's children have been read. A directory
    /// with `children_loaded == false` is treated as a leaf by the
    /// flattener; `true` with zero children means "expanded, empty".
    pub children_loaded: bool,
    /// Index of the selected child, meaningful for directories only.
    selected_child: usize,
}

impl Entry {
    pub fn file<P: Into<PathBuf>>(name: &str, path: P, size: u64, modified: SystemTime) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            size,
            modified,
            is_dir: false,
            children_loaded: false,
            selected_child: 0,
        }
    }

    pub fn dir<P: Into<PathBuf>>(name: &str, path: P, modified: SystemTime) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            size: 0,
            modified,
            is_dir: true,
            children_loaded: false,
            selected_child: 0,
        }
    }
}

/// Directory tree backed by an arena allocator.
///
/// `NodeId` handles act as non-owning references: `current_dir` and
/// `marked` point into the arena without owning anything, and the
/// renderer only ever reads through them.
pub struct Tree {
    arena: Arena<Entry>,
    root: Option<NodeId>,
    current_dir: Option<NodeId>,
    marked: Option<NodeId>,
}

impl Tree {
    /// A tree with no root at all. Rendering it yields empty output.
    pub fn empty() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            current_dir: None,
            marked: None,
        }
    }

    /// Build a tree around an in-memory root entry.
    pub fn with_root(entry: Entry) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(entry);
        Self {
            arena,
            root: Some(root),
            current_dir: Some(root),
            marked: None,
        }
    }

    /// Build a tree for a filesystem path and load its first level.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", path.display()),
            ));
        }
        let name = path.to_string_lossy().into_owned();
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let mut tree = Self::with_root(Entry::dir(&name, path, modified));
        if let Some(root) = tree.root {
            tree.load_children(root)?;
        }
        Ok(tree)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn current_dir(&self) -> Option<NodeId> {
        self.current_dir
    }

    pub fn marked(&self) -> Option<NodeId> {
        self.marked
    }

    pub fn get(&self, id: NodeId) -> Option<&Entry> {
        self.arena.get(id).map(|n| n.get())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Append a child entry under `parent`. Adding a child implies the
    /// parent's children list exists, so the parent is marked loaded.
    pub fn add_child(&mut self, parent: NodeId, entry: Entry) -> NodeId {
        let id = self.arena.new_node(entry);
        parent.append(id, &mut self.arena);
        if let Some(node) = self.arena.get_mut(parent) {
            node.get_mut().children_loaded = true;
        }
        id
    }

    /// Mark a directory as expanded without adding children (empty dir).
    pub fn mark_children_loaded(&mut self, id: NodeId) {
        if let Some(node) = self.arena.get_mut(id) {
            node.get_mut().children_loaded = true;
        }
    }

    /// The selected child of the current directory, if it has any.
    pub fn selected_child(&self) -> Option<NodeId> {
        let cur = self.current_dir?;
        let idx = self.get(cur)?.selected_child;
        cur.children(&self.arena).nth(idx)
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(cur) = self.current_dir else {
            return;
        };
        let count = cur.children(&self.arena).count();
        if count == 0 {
            return;
        }
        if let Some(node) = self.arena.get_mut(cur) {
            let entry = node.get_mut();
            let idx = entry.selected_child.min(count - 1) as isize + delta;
            entry.selected_child = idx.clamp(0, count as isize - 1) as usize;
        }
    }

    /// Descend into the selected child if it is a directory, reading its
    /// children from disk on first entry.
    pub fn enter_selected(&mut self) -> io::Result<()> {
        let Some(selected) = self.selected_child() else {
            return Ok(());
        };
        let Some(entry) = self.get(selected) else {
            return Ok(());
        };
        if !entry.is_dir {
            return Ok(());
        }
        if !entry.children_loaded {
            self.load_children(selected)?;
        }
        self.current_dir = Some(selected);
        Ok(())
    }

    /// Move back to the parent directory, keeping the directory we came
    /// from selected.
    pub fn go_up(&mut self) {
        let Some(cur) = self.current_dir else {
            return;
        };
        let Some(parent) = self.arena.get(cur).and_then(|n| n.parent()) else {
            return;
        };
        let idx = parent
            .children(&self.arena)
            .position(|c| c == cur)
            .unwrap_or(0);
        if let Some(node) = self.arena.get_mut(parent) {
            node.get_mut().selected_child = idx;
        }
        self.current_dir = Some(parent);
    }

    /// Mark the selected node, or unmark it if it is already marked.
    /// At most one node is marked at a time.
    pub fn toggle_mark(&mut self) {
        let selected = self.selected_child();
        if selected.is_none() {
            return;
        }
        self.marked = if self.marked == selected {
            None
        } else {
            selected
        };
    }

    /// Read the children of a directory from disk, sorted directories
    /// first, then by name.
    pub fn load_children(&mut self, id: NodeId) -> io::Result<()> {
        let Some(entry) = self.get(id) else {
            return Ok(());
        };
        if entry.children_loaded || !entry.is_dir {
            return Ok(());
        }
        let dir_path = entry.path.clone();

        let mut children = Vec::new();
        for dirent in fs::read_dir(&dir_path)? {
            let dirent = dirent?;
            let path = dirent.path();
            let name = dirent.file_name().to_string_lossy().into_owned();
            let meta = dirent.metadata()?;
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if meta.is_dir() {
                children.push(Entry::dir(&name, path, modified));
            } else {
                children.push(Entry::file(&name, path, meta.len(), modified));
            }
        }
        children.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

        debug!(dir = %dir_path.display(), count = children.len(), "loaded directory");
        for child in children {
            self.add_child(id, child);
        }
        self.mark_children_loaded(id);
        Ok(())
    }

    /// Read up to `max_bytes` of the selected file's content. Directories
    /// and absent selections are errors, which the renderer treats as
    /// "no preview available".
    pub fn read_selected_content(&self, max_bytes: u64) -> io::Result<Vec<u8>> {
        let selected = self
            .selected_child()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "nothing selected"))?;
        let entry = self
            .get(selected)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "stale selection"))?;
        if entry.is_dir {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "selection is a directory",
            ));
        }
        let mut buf = Vec::new();
        File::open(&entry.path)?
            .take(max_bytes)
            .read_to_end(&mut buf)?;
        Ok(buf)
    }
}
