use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use super::owner::{Owner, OwnerModifier};

/// Nearest-governing ownership scope for a file.
pub trait FileOwners {
    /// Owners of `filename` carrying exactly `modifier`, in declaration order.
    fn modified_file_owners(&self, filename: &str, modifier: OwnerModifier) -> Vec<Owner>;
}

/// Map from changed filename to its nearest subtree, in changed-file order.
pub type FileTreeMap<'t> = IndexMap<String, &'t dyn FileOwners>;

/// The ownership hierarchy for a repository.
pub trait OwnersTree {
    /// Resolve every changed file to the innermost scope that governs it.
    fn build_file_tree_map<'t>(&'t self, changed_files: &[String]) -> FileTreeMap<'t>;
}

/// A JSON owner entry. `members` makes it a team; `request_reviews: false`
/// marks a silent owner, `notify: true` an always-notify owner.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerDefinition {
    pub name: String,
    #[serde(default)]
    pub members: Option<Vec<String>>,
    #[serde(default)]
    pub request_reviews: Option<bool>,
    #[serde(default)]
    pub notify: Option<bool>,
}

impl OwnerDefinition {
    fn into_owner(self) -> Owner {
        let modifier = if self.notify == Some(true) {
            OwnerModifier::Notify
        } else if self.request_reviews == Some(false) {
            OwnerModifier::Silent
        } else {
            OwnerModifier::Default
        };
        match self.members {
            Some(members) => Owner::Team {
                name: self.name,
                members,
                modifier,
            },
            None => Owner::Individual {
                username: self.name,
                modifier,
            },
        }
    }
}

/// A JSON ownership rule: owners that apply to files matching `pattern`
/// (basename glob, `*` wildcard), or to every file when no pattern is given.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    #[serde(default)]
    pub pattern: Option<String>,
    pub owners: Vec<OwnerDefinition>,
}

/// A JSON ownership scope: a directory prefix and its rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeDefinition {
    /// Directory this scope governs, relative to the repository root.
    /// `""` or `"."` is the root scope.
    pub path: String,
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeDefinition {
    pub scopes: Vec<ScopeDefinition>,
}

struct ScopeRule {
    pattern: Option<String>,
    owners: Vec<Owner>,
}

/// One directory scope with its owner rules.
pub struct OwnersScope {
    path: String,
    rules: Vec<ScopeRule>,
}

impl FileOwners for OwnersScope {
    fn modified_file_owners(&self, filename: &str, modifier: OwnerModifier) -> Vec<Owner> {
        let name = basename(filename);
        self.rules
            .iter()
            .filter(|rule| rule.pattern.as_deref().is_none_or(|p| glob_matches(p, name)))
            .flat_map(|rule| rule.owners.iter())
            .filter(|owner| owner.modifier() == modifier)
            .cloned()
            .collect()
    }
}

/// Directory-scoped ownership tree loaded from a JSON definition.
///
/// The nearest scope for a file is the longest path prefix that contains it.
/// A file outside every scope has no owners and is left out of the map.
pub struct ScopedOwnersTree {
    scopes: Vec<OwnersScope>,
}

impl ScopedOwnersTree {
    pub fn from_definition(def: TreeDefinition) -> Self {
        let scopes = def
            .scopes
            .into_iter()
            .map(|scope| OwnersScope {
                path: normalize_scope_path(&scope.path),
                rules: scope
                    .rules
                    .into_iter()
                    .map(|rule| ScopeRule {
                        pattern: rule.pattern,
                        owners: rule.owners.into_iter().map(OwnerDefinition::into_owner).collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { scopes }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read owners file {}", path.display()))?;
        let def: TreeDefinition = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse owners file {}", path.display()))?;
        Ok(Self::from_definition(def))
    }

    fn nearest_scope(&self, filename: &str) -> Option<&OwnersScope> {
        self.scopes
            .iter()
            .filter(|scope| scope_governs(&scope.path, filename))
            .max_by_key(|scope| scope.path.len())
    }
}

impl OwnersTree for ScopedOwnersTree {
    fn build_file_tree_map<'t>(&'t self, changed_files: &[String]) -> FileTreeMap<'t> {
        let mut map = FileTreeMap::default();
        for filename in changed_files {
            if let Some(scope) = self.nearest_scope(filename) {
                map.insert(filename.clone(), scope as &dyn FileOwners);
            }
        }
        map
    }
}

fn normalize_scope_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed == "." { String::new() } else { trimmed.to_string() }
}

fn scope_governs(path: &str, filename: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    filename
        .strip_prefix(path)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn basename(filename: &str) -> &str {
    filename.rsplit('/').next().unwrap_or(filename)
}

/// Literal match with `*` matching any run of characters.
fn glob_matches(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    if tail.is_empty() {
        // no wildcard: the whole pattern already matched as a prefix
        return rest.is_empty();
    }
    let (last, middle) = tail.split_last().expect("tail is non-empty");
    for part in middle {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tree_from_json(raw: &str) -> ScopedOwnersTree {
        let def: TreeDefinition = serde_json::from_str(raw).unwrap();
        ScopedOwnersTree::from_definition(def)
    }

    const SAMPLE: &str = r#"{
        "scopes": [
            {
                "path": "",
                "rules": [
                    {"owners": [{"name": "rootward"}]},
                    {"pattern": "*.md", "owners": [{"name": "docs-team", "members": ["dora", "dan"], "notify": true}]}
                ]
            },
            {
                "path": "src/net",
                "rules": [
                    {"owners": [{"name": "netty", "request_reviews": false}]}
                ]
            }
        ]
    }"#;

    #[test]
    fn nearest_scope_prefers_longest_prefix() {
        let tree = tree_from_json(SAMPLE);
        let files = vec!["src/net/socket.rs".to_string(), "README.md".to_string()];
        let map = tree.build_file_tree_map(&files);

        assert_eq!(map.len(), 2);
        let net = map["src/net/socket.rs"];
        let silent = net.modified_file_owners("src/net/socket.rs", OwnerModifier::Silent);
        assert_eq!(silent.len(), 1);
        assert_eq!(silent[0].name(), "netty");

        // the root scope governs README.md, not the src/net scope
        let root = map["README.md"];
        assert!(root.modified_file_owners("README.md", OwnerModifier::Silent).is_empty());
    }

    #[test]
    fn file_map_preserves_changed_file_order() {
        let tree = tree_from_json(SAMPLE);
        let files = vec![
            "b.txt".to_string(),
            "a.txt".to_string(),
            "src/net/c.rs".to_string(),
        ];
        let map = tree.build_file_tree_map(&files);
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["b.txt", "a.txt", "src/net/c.rs"]);
    }

    #[test]
    fn pattern_rules_filter_by_basename() {
        let tree = tree_from_json(SAMPLE);
        let files = vec!["docs/guide.md".to_string(), "docs/guide.txt".to_string()];
        let map = tree.build_file_tree_map(&files);

        let md = map["docs/guide.md"].modified_file_owners("docs/guide.md", OwnerModifier::Notify);
        assert_eq!(md.len(), 1);
        assert_eq!(md[0].name(), "docs-team");
        assert_eq!(md[0].all_usernames(), vec!["dora".to_string(), "dan".to_string()]);

        let txt = map["docs/guide.txt"].modified_file_owners("docs/guide.txt", OwnerModifier::Notify);
        assert!(txt.is_empty());
    }

    #[test]
    fn modifier_derivation_from_flags() {
        let tree = tree_from_json(
            r#"{"scopes": [{"path": "", "rules": [{"owners": [
                {"name": "plain"},
                {"name": "quiet", "request_reviews": false},
                {"name": "loud", "notify": true}
            ]}]}]}"#,
        );
        let files = vec!["x.rs".to_string()];
        let map = tree.build_file_tree_map(&files);
        let scope = map["x.rs"];

        let defaults = scope.modified_file_owners("x.rs", OwnerModifier::Default);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name(), "plain");
        let silent = scope.modified_file_owners("x.rs", OwnerModifier::Silent);
        assert_eq!(silent.len(), 1);
        assert_eq!(silent[0].name(), "quiet");
        let notify = scope.modified_file_owners("x.rs", OwnerModifier::Notify);
        assert_eq!(notify.len(), 1);
        assert_eq!(notify[0].name(), "loud");
    }

    #[test]
    fn glob_matching() {
        assert!(glob_matches("*.js", "index.js"));
        assert!(!glob_matches("*.js", "index.jsx"));
        assert!(glob_matches("index.js", "index.js"));
        assert!(!glob_matches("index.js", "main.js"));
        assert!(glob_matches("test_*.rs", "test_parser.rs"));
        assert!(glob_matches("a*b*c", "aXbYc"));
        assert!(!glob_matches("a*b*c", "aXcYb"));
        assert!(glob_matches("*", "anything"));
    }

    #[test]
    fn loads_definition_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let tree = ScopedOwnersTree::from_path(tmp.path()).unwrap();
        let files = vec!["src/net/mod.rs".to_string()];
        let map = tree.build_file_tree_map(&files);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn file_outside_every_scope_is_skipped() {
        let tree = tree_from_json(
            r#"{"scopes": [{"path": "src", "rules": [{"owners": [{"name": "s"}]}]}]}"#,
        );
        let files = vec!["README.md".to_string(), "src/lib.rs".to_string()];
        let map = tree.build_file_tree_map(&files);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("src/lib.rs"));
    }
}
