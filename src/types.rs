//! View types returned by the store's read operations.
//!
//! Both serialize to JSON for callers that expose the store over an API and
//! for the CLI's `--json` output.

use crate::imaging::SizeSpec;
use serde::{Deserialize, Serialize};

/// One user folder in the tree returned by `get_folder_tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Directory name (last path segment)
    pub name: String,
    /// Root-relative path, `/`-joined
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FolderNode>,
}

/// Everything the folder view needs, returned by `get_folder_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContent {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Primary-rendition filenames in display order
    pub images: Vec<String>,
    pub sizes: Vec<SizeSpec>,
    /// Immediate child folder names, sorted
    pub subfolders: Vec<String>,
}
