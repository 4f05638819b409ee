//! # Tree Scanner
//!
//! This module performs the single filesystem pass of the generator. It
//! walks the application root and mirrors it into an in-memory tree:
//!
//! 1. **Directories** become [`DirectoryNode`]s, one per directory seen
//!    (empty ones included), keyed by their relative path so parents are
//!    found without re-walking ancestor chains.
//! 2. **Files** become [`FileEntry`]s under their containing directory's
//!    node, each with a document-unique id from the shared [`IdPool`].
//! 3. The **main executable** is detected along the way: the configured
//!    filename, matched case-insensitively, inside a directory path that
//!    contains a `bin` segment. The first match in traversal order wins.
//!
//! Entries are visited sorted by file name, so rescanning an unchanged
//! tree yields the same structure and the same identifiers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::debug;
use walkdir::WalkDir;

use crate::config::ProductConfig;
use crate::ident::{sanitize_id, IdPool};

/// Relative-path key of the scan root inside [`ScanTree`].
pub const ROOT_KEY: &str = "";

/// One mirrored directory. Children are stored as relative-path keys into
/// the owning [`ScanTree`] map, in traversal order.
#[derive(Debug)]
pub struct DirectoryNode {
    /// Document-unique WiX Directory id.
    pub id: String,
    /// Plain directory name, used for the Name attribute.
    pub name: String,
    pub subdirs: Vec<String>,
    pub files: Vec<FileEntry>,
}

/// One file found during the walk.
#[derive(Debug)]
pub struct FileEntry {
    /// Document-unique WiX File id. The component wrapping it is named
    /// `Comp_<id>`.
    pub id: String,
    pub name: String,
    /// Path as given on the command line joined with the relative
    /// location; becomes the File element's Source attribute.
    pub source: PathBuf,
}

/// Locator for the detected main executable.
#[derive(Debug, Clone)]
pub struct ExecutableRef {
    /// File id of the executable's entry; association verbs target it.
    pub file_id: String,
    /// Install-relative path with backslash separators, e.g.
    /// `bin\MView6.exe`. Appended to `[INSTALLFOLDER]` in shortcut and
    /// registry targets.
    pub install_path: String,
}

/// Result of one scan: the directory map, the flat component-reference
/// list, and the executable locator if one was found.
#[derive(Debug)]
pub struct ScanTree {
    dirs: HashMap<String, DirectoryNode>,
    /// `Comp_<file_id>` for every file, in traversal order.
    pub component_refs: Vec<String>,
    pub executable: Option<ExecutableRef>,
}

impl ScanTree {
    fn new(config: &ProductConfig) -> Self {
        let mut dirs = HashMap::new();
        // The scan root maps onto the install folder itself.
        dirs.insert(
            ROOT_KEY.to_string(),
            DirectoryNode {
                id: "INSTALLFOLDER".to_string(),
                name: config.name.to_string(),
                subdirs: Vec::new(),
                files: Vec::new(),
            },
        );
        Self { dirs, component_refs: Vec::new(), executable: None }
    }

    pub fn dir(&self, key: &str) -> Option<&DirectoryNode> {
        self.dirs.get(key)
    }

    /// Relative-path keys of all mirrored directories, the root included.
    #[allow(dead_code)]
    pub fn dir_keys(&self) -> impl Iterator<Item = &String> {
        self.dirs.keys()
    }
}

/// Walks `root` and builds the mirrored tree.
///
/// Fails on any unreadable directory; there is no partial result. The root
/// itself must already be validated as a directory by the caller.
pub fn scan(root: &Path, config: &ProductConfig) -> Result<ScanTree> {
    let mut tree = ScanTree::new(config);
    let mut pool = IdPool::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| {
            format!("failed to enumerate the tree under {}", root.display())
        })?;
        if entry.depth() == 0 {
            continue; // the root node already exists
        }

        let rel = entry.path().strip_prefix(root)?;
        if entry.file_type().is_dir() {
            record_directory(&mut tree, &mut pool, rel, entry.depth())?;
        } else if entry.file_type().is_file() {
            record_file(&mut tree, &mut pool, rel, entry.path(), config)?;
        }
        // Symlinks are left alone: the walk does not follow them and an
        // installer manifest cannot represent them.
    }

    Ok(tree)
}

/// Registers a directory under its parent node.
///
/// The id is derived from the directory's own name, not its full path.
/// Nested levels carry a positional depth suffix, and the result is claimed
/// through the pool, so same-named directories in cousin branches still end
/// up with distinct ids.
fn record_directory(
    tree: &mut ScanTree,
    pool: &mut IdPool,
    rel: &Path,
    depth: usize,
) -> Result<()> {
    let name = leaf_name(rel);
    let mut base = sanitize_id(&format!("Dir_{name}"));
    if depth >= 2 {
        base = format!("{}_{}", base, depth - 1);
    }
    let id = pool.claim(&base);

    let key = path_key(rel);
    let parent = parent_key(rel);
    tree.dirs
        .get_mut(&parent)
        .with_context(|| format!("parent directory of {key} not yet mirrored"))?
        .subdirs
        .push(key.clone());
    tree.dirs.insert(
        key,
        DirectoryNode { id, name, subdirs: Vec::new(), files: Vec::new() },
    );
    Ok(())
}

/// Registers a file under its containing directory and checks it against
/// the executable heuristic.
fn record_file(
    tree: &mut ScanTree,
    pool: &mut IdPool,
    rel: &Path,
    source: &Path,
    config: &ProductConfig,
) -> Result<()> {
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = pool.claim(&format!("File_{}", sanitize_id(&stem)));
    let file = FileEntry {
        id,
        name: leaf_name(rel),
        source: source.to_path_buf(),
    };

    let parent = parent_key(rel);
    if file.name.eq_ignore_ascii_case(config.executable) && has_bin_segment(&parent) {
        if tree.executable.is_none() {
            debug!("Found main executable at {}", rel.display());
            tree.executable = Some(ExecutableRef {
                file_id: file.id.clone(),
                install_path: install_path(rel),
            });
        } else {
            debug!("Ignoring additional executable match at {}", rel.display());
        }
    }

    tree.component_refs.push(format!("Comp_{}", file.id));
    tree.dirs
        .get_mut(&parent)
        .with_context(|| format!("containing directory of {} not yet mirrored", rel.display()))?
        .files
        .push(file);
    Ok(())
}

/// Last component of a relative path, lossily decoded.
fn leaf_name(rel: &Path) -> String {
    rel.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Normalized map key: components joined with `/` regardless of platform.
fn path_key(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

fn parent_key(rel: &Path) -> String {
    rel.parent().map(path_key).unwrap_or_default()
}

/// True if any path segment is named `bin`, in any case.
fn has_bin_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment.eq_ignore_ascii_case("bin"))
}

/// Install-relative path with Windows separators, as it will exist under
/// the install folder.
fn install_path(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("\\")
}
