//! Artifact tag resolution
//!
//! Tags identify build artifacts. The commit tag is always derivable;
//! the branch tag exists only when sanitizing the branch name leaves
//! something usable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static INVALID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]+").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Sanitizes a branch name into a tag-safe identifier.
///
/// Lowercases, replaces every character outside `[a-z0-9-]` with `-`,
/// collapses consecutive dashes and strips leading/trailing dashes.
/// The result may be empty (e.g. for a branch named `///`).
#[must_use]
pub fn sanitize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = INVALID_CHARS.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Resolved artifact identifiers for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    /// Sanitized branch tag; absent when sanitization yields nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_tag: Option<String>,

    /// Commit tag, always the commit identifier verbatim
    pub commit_tag: String,
}

impl TagSet {
    /// Resolves the tag set for a branch/commit pair.
    #[must_use]
    pub fn resolve(branch: Option<&str>, commit: &str) -> Self {
        let branch_tag = branch.map(sanitize).filter(|t| !t.is_empty());
        Self {
            branch_tag,
            commit_tag: commit.to_string(),
        }
    }

    /// All resolved tags, branch tag first when present
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags = Vec::with_capacity(2);
        if let Some(ref branch) = self.branch_tag {
            tags.push(branch.as_str());
        }
        tags.push(self.commit_tag.as_str());
        tags
    }

    /// Image reference for the branch tag, e.g. `user/app:main`
    #[must_use]
    pub fn branch_image_ref(&self, repo: &str) -> Option<String> {
        self.branch_tag.as_ref().map(|tag| format!("{repo}:{tag}"))
    }

    /// Image reference for the commit tag
    #[must_use]
    pub fn commit_image_ref(&self, repo: &str) -> String {
        format!("{}:{}", repo, self.commit_tag)
    }
}
