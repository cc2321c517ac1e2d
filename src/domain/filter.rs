use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{is_private_name, Visibility};
use crate::domain::traversal::InventoryEntry;

/// Which entries survive the visibility filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    #[default]
    Public,
    Private,
    All,
}

impl VisibilityFilter {
    pub fn matches(self, visibility: Visibility) -> bool {
        match self {
            VisibilityFilter::All => true,
            VisibilityFilter::Public => visibility == Visibility::Public,
            VisibilityFilter::Private => visibility == Visibility::Private,
        }
    }

    /// Prefix rule first: an underscore name is private whatever the
    /// export list says.
    pub fn admits(self, entry: &InventoryEntry<'_>) -> bool {
        let visibility = if is_private_name(entry.name()) {
            Visibility::Private
        } else {
            entry.visibility
        };
        self.matches(visibility)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VisibilityFilter::Public => "public",
            VisibilityFilter::Private => "private",
            VisibilityFilter::All => "all",
        }
    }
}

impl fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(VisibilityFilter::Public),
            "private" => Ok(VisibilityFilter::Private),
            "all" => Ok(VisibilityFilter::All),
            other => Err(format!(
                "invalid visibility '{other}': expected public, private or all"
            )),
        }
    }
}

/// Keep the entries admitted by `filter`, preserving traversal order.
pub fn filter_entries<'a, I>(entries: I, filter: VisibilityFilter) -> Vec<InventoryEntry<'a>>
where
    I: IntoIterator<Item = InventoryEntry<'a>>,
{
    entries
        .into_iter()
        .filter(|entry| filter.admits(entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_all_filter_then_matches_both() {
        assert!(VisibilityFilter::All.matches(Visibility::Public));
        assert!(VisibilityFilter::All.matches(Visibility::Private));
        assert!(!VisibilityFilter::Public.matches(Visibility::Private));
    }

    #[test]
    fn given_mixed_case_when_parsing_then_accepts() {
        assert_eq!("ALL".parse::<VisibilityFilter>(), Ok(VisibilityFilter::All));
        assert!("hidden".parse::<VisibilityFilter>().is_err());
    }
}
