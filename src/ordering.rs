//! Node ordering
//!
//! Two orderings exist. The default browsing order is tuned for folders that
//! follow an "initial submission, monthly folders, final" workflow. The
//! management order is a plain comparator picked by the user and persisted as
//! a single token such as `date-desc`.

use crate::error::ApiError;
use crate::tree::Node;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const MONTHS: [&[&str]; 12] = [
    &["jan", "january"],
    &["feb", "february"],
    &["mar", "march"],
    &["apr", "april"],
    &["may"],
    &["jun", "june"],
    &["jul", "july"],
    &["aug", "august"],
    &["sep", "september"],
    &["oct", "october"],
    &["nov", "november"],
    &["dec", "december"],
];

/// Calendar index of a name that starts with a month name or abbreviation.
///
/// The month must be followed by a non-letter or the end of the name, so
/// `May2024` and `mar-reports` match while `Marble` does not.
pub fn month_index(name: &str) -> Option<usize> {
    let lower = name.to_lowercase();
    MONTHS.iter().position(|variants| {
        variants.iter().any(|variant| {
            lower.starts_with(variant)
                && lower[variant.len()..]
                    .chars()
                    .next()
                    .map_or(true, |next| !next.is_ascii_lowercase())
        })
    })
}

/// Matches both the historical `intial` spelling and `initial`.
pub fn is_initial(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("intial") || lower.contains("initial")
}

pub fn is_final(name: &str) -> bool {
    name.to_lowercase().contains("final")
}

/// Case- and accent-insensitive sort key
pub fn collation_key(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Alphabetical, ignoring case and accents; exact bytes break ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn directories_first(a: &Node, b: &Node) -> Ordering {
    b.is_dir().cmp(&a.is_dir())
}

/// Default browsing comparator
pub fn default_cmp(a: &Node, b: &Node) -> Ordering {
    let by_kind = directories_first(a, b);
    if by_kind != Ordering::Equal {
        return by_kind;
    }
    if a.is_file() {
        return compare_names(&a.name, &b.name);
    }

    match (is_initial(&a.name), is_initial(&b.name)) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    match (month_index(&a.name), month_index(&b.name)) {
        (Some(x), Some(y)) if x != y => return x.cmp(&y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => {}
    }

    match (is_final(&a.name), is_final(&b.name)) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    compare_names(&a.name, &b.name)
}

/// Apply the default ordering at every level
pub fn sort_default(nodes: &mut [Node]) {
    nodes.sort_by(default_cmp);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            sort_default(children);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Name,
    LastModified,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// User-selectable ordering; directories always sort ahead of files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::LastModified,
            direction: SortDirection::Desc,
        }
    }
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn compare(&self, a: &Node, b: &Node) -> Ordering {
        let by_kind = directories_first(a, b);
        if by_kind != Ordering::Equal {
            return by_kind;
        }
        let ordering = match self.key {
            SortKey::Name => compare_names(&a.name, &b.name),
            SortKey::Size => a.size().cmp(&b.size()),
            // missing timestamps sort as the oldest
            SortKey::LastModified => a.last_modified.cmp(&b.last_modified),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Sort every level in place. Ties keep their current relative order.
    pub fn sort(&self, nodes: &mut [Node]) {
        nodes.sort_by(|a, b| self.compare(a, b));
        for node in nodes.iter_mut() {
            if let Some(children) = node.children_mut() {
                self.sort(children);
            }
        }
    }

    pub fn sorted(&self, nodes: &[Node]) -> Vec<Node> {
        let mut out = nodes.to_vec();
        self.sort(&mut out);
        out
    }

    /// All persisted tokens, in menu order
    pub fn all() -> [SortOrder; 6] {
        use SortDirection::*;
        use SortKey::*;
        [
            SortOrder::new(Name, Asc),
            SortOrder::new(Name, Desc),
            SortOrder::new(LastModified, Desc),
            SortOrder::new(LastModified, Asc),
            SortOrder::new(Size, Desc),
            SortOrder::new(Size, Asc),
        ]
    }

    pub fn label(&self) -> &'static str {
        match (self.key, self.direction) {
            (SortKey::Name, SortDirection::Asc) => "Name (A-Z)",
            (SortKey::Name, SortDirection::Desc) => "Name (Z-A)",
            (SortKey::LastModified, SortDirection::Desc) => "Last Modified (Newest)",
            (SortKey::LastModified, SortDirection::Asc) => "Last Modified (Oldest)",
            (SortKey::Size, SortDirection::Desc) => "Size (Largest)",
            (SortKey::Size, SortDirection::Asc) => "Size (Smallest)",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::Name => "name",
            SortKey::LastModified => "date",
            SortKey::Size => "size",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", key, direction)
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ApiError::PreferenceError(format!(
                "Invalid sort order '{}' (expected <name|date|size>-<asc|desc>)",
                token
            ))
        };
        let (key, direction) = token.trim().split_once('-').ok_or_else(invalid)?;
        let key = match key.to_ascii_lowercase().as_str() {
            "name" => SortKey::Name,
            "date" | "modified" | "lastmodified" => SortKey::LastModified,
            "size" => SortKey::Size,
            _ => return Err(invalid()),
        };
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };
        Ok(SortOrder { key, direction })
    }
}
