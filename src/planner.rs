//! Output path planning.
//!
//! Works out where every submitted link ends up inside the mirror, flags
//! links that would land on the same path, and builds the folder tree shown
//! before a job is started. Everything here is pure: the inputs are never
//! mutated and nothing touches the network.

use crate::models::{CompressionConfig, LinkSpec};
use std::collections::BTreeMap;
use std::fmt::Write;
use url::Url;

/// Top-level directory every output path lives under.
pub const ROOT_DIR: &str = "SourceMirror";

/// Name used when a URL has no usable last path segment.
pub const FALLBACK_FILE_NAME: &str = "file";

/// Last path segment of `url`, or [`FALLBACK_FILE_NAME`] when the URL does
/// not parse or ends in a slash. Query and fragment never contribute.
pub fn file_name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}

/// Extension of `name` including the leading dot, or "" when there is none.
fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[dot..],
        None => "",
    }
}

/// Name the worker will give the file once renaming and compression apply.
pub fn final_name(link: &LinkSpec, original_name: &str, compression: &CompressionConfig) -> String {
    let base_name = if link.rename_base.is_empty() {
        strip_extension(original_name)
    } else {
        link.rename_base.as_str()
    };

    if compression.enabled {
        return format!("{}.{}", base_name, compression.archive_type.extension());
    }

    if link.rename_base.is_empty() {
        return original_name.to_string();
    }

    if link.allow_extension_change && !link.rename_ext.is_empty() {
        format!("{}.{}", link.rename_base, link.rename_ext)
    } else {
        format!("{}{}", link.rename_base, extension_of(original_name))
    }
}

/// Folder names from a slash separated path; empty segments are dropped.
pub fn split_folders(folder: &str) -> Vec<String> {
    folder
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn output_path(folders: &[String], final_name: &str) -> String {
    if folders.is_empty() {
        format!("{}/{}", ROOT_DIR, final_name)
    } else {
        format!("{}/{}/{}", ROOT_DIR, folders.join("/"), final_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Folder(DirectoryTree),
    File,
}

/// Folder hierarchy below [`ROOT_DIR`]. Children are kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTree {
    children: BTreeMap<String, TreeNode>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `file_name` below the given folders, creating them as needed.
    /// A folder takes the place of a file of the same name and vice versa.
    pub fn insert(&mut self, folders: &[String], file_name: &str) {
        let mut node = self;
        for folder in folders {
            let child = node
                .children
                .entry(folder.clone())
                .or_insert_with(|| TreeNode::Folder(DirectoryTree::new()));
            if matches!(child, TreeNode::File) {
                *child = TreeNode::Folder(DirectoryTree::new());
            }
            node = match child {
                TreeNode::Folder(tree) => tree,
                TreeNode::File => unreachable!("file leaf replaced above"),
            };
        }
        node.children.insert(file_name.to_string(), TreeNode::File);
    }

    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    /// Children in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }
}

/// Where a single link ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Position of the link in the planner input.
    pub index: usize,
    pub original_name: String,
    pub final_name: String,
    pub folders: Vec<String>,
    pub output_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub entries: Vec<PlannedFile>,
    pub tree: DirectoryTree,
    pub path_counts: BTreeMap<String, usize>,
    /// Every output path claimed by more than one link, once each.
    pub conflicts: Vec<String>,
}

/// Plans the output location of each link. Links with an empty URL are skipped.
pub fn plan(links: &[LinkSpec], compression: &CompressionConfig) -> Plan {
    let mut result = Plan::default();

    for (index, link) in links.iter().enumerate() {
        if link.url.trim().is_empty() {
            continue;
        }

        let original_name = file_name_from_url(link.url.trim());
        let final_name = final_name(link, &original_name, compression);
        let folders = split_folders(&link.folder);
        let output_path = output_path(&folders, &final_name);

        *result.path_counts.entry(output_path.clone()).or_insert(0) += 1;
        result.tree.insert(&folders, &final_name);

        result.entries.push(PlannedFile {
            index,
            original_name,
            final_name,
            folders,
            output_path,
        });
    }

    result.conflicts = result
        .path_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(path, _)| path.clone())
        .collect();

    result
}

impl Plan {
    pub fn is_conflicting(&self, path: &str) -> bool {
        self.path_counts.get(path).is_some_and(|count| *count > 1)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Text rendering of the folder preview rooted at [`ROOT_DIR`].
    pub fn render_tree(&self) -> String {
        let mut out = format!("📁 {}\n", ROOT_DIR);
        self.render_level(&self.tree, "", 1, &mut out);
        out
    }

    fn render_level(&self, tree: &DirectoryTree, parent: &str, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        for (name, node) in tree.iter() {
            let current = if parent.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", parent, name)
            };
            match node {
                TreeNode::File => {
                    let full = format!("{}/{}", ROOT_DIR, current);
                    let marker = if self.is_conflicting(&full) { " ⚠" } else { "" };
                    let _ = writeln!(out, "{}📄 {}{}", indent, name, marker);
                }
                TreeNode::Folder(child) => {
                    let _ = writeln!(out, "{}📁 {}", indent, name);
                    self.render_level(child, &current, depth + 1, out);
                }
            }
        }
    }

    /// Warning block listing conflicting paths, empty when there are none.
    pub fn render_conflicts(&self) -> String {
        if self.conflicts.is_empty() {
            return String::new();
        }
        let mut out = String::from("⚠ Conflicting files detected\n");
        for path in &self.conflicts {
            let _ = writeln!(out, "  - {}", path);
        }
        out
    }
}
