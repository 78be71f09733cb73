use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Reserved id of the fallback category. Always present, always first.
pub const COMMON_CATEGORY_ID: &str = "common";

/// Pseudo-category the UI passes to mean "every category".
pub const ALL_CATEGORIES_ID: &str = "all";

/// Pseudo-category every private vault link belongs to.
pub const PRIVATE_CATEGORY_ID: &str = "private";

/// A single bookmark.
///
/// Field names follow the persisted JSON (`categoryId`, `pinnedOrder`, ...)
/// so snapshots and vault payloads stay readable by other implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_order: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl Link {
    /// Sort key among non-pinned links: `order`, falling back to `createdAt`.
    pub fn sort_key(&self) -> i64 {
        self.order.unwrap_or(self.created_at)
    }
}

/// A link category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

impl Category {
    /// The built-in fallback category.
    pub fn common() -> Self {
        Self {
            id: COMMON_CATEGORY_ID.to_string(),
            name: "Common".to_string(),
            icon: "Star".to_string(),
        }
    }
}

/// Input for creating a link. The store assigns id, timestamps and ranks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDraft {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

/// Partial update applied over an existing link.
///
/// `None` keeps the current value. An empty `description` or `icon` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdate {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
}

/// The persisted `{links, categories}` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Plaintext envelope sealed inside a vault token. No categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct PrivateVaultPayload {
    pub links: Vec<Link>,
}

/// Which sub-sequence of links a drag-reorder applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderScope {
    /// Non-pinned links of one category.
    Category(String),
    /// Every non-pinned link.
    AllUnpinned,
    /// Every pinned link, ranked by `pinnedOrder`.
    Pinned,
}

impl ReorderScope {
    /// Maps a category id from the UI to a scope; `"all"` selects every non-pinned link.
    pub fn for_category(category_id: &str) -> Self {
        if category_id == ALL_CATEGORIES_ID {
            ReorderScope::AllUnpinned
        } else {
            ReorderScope::Category(category_id.to_string())
        }
    }

    /// Returns true if `link` belongs to this scope.
    pub fn contains(&self, link: &Link) -> bool {
        match self {
            ReorderScope::Category(id) => !link.pinned && link.category_id == *id,
            ReorderScope::AllUnpinned => !link.pinned,
            ReorderScope::Pinned => link.pinned,
        }
    }
}

/// Trims `raw` and prefixes `https://` when no http(s) scheme is present.
///
/// Returns `None` for blank input.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

/// Seed categories used when nothing has been persisted yet.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::common(),
        Category {
            id: "dev".to_string(),
            name: "Development".to_string(),
            icon: "Code".to_string(),
        },
        Category {
            id: "design".to_string(),
            name: "Design".to_string(),
            icon: "Palette".to_string(),
        },
        Category {
            id: "read".to_string(),
            name: "Reading".to_string(),
            icon: "BookOpen".to_string(),
        },
    ]
}

/// Seed links used when nothing has been persisted yet.
pub fn initial_links() -> Vec<Link> {
    let seed = [
        ("1", "https://github.com", "GitHub", "dev", true),
        ("2", "https://doc.rust-lang.org", "Rust Documentation", "dev", false),
        ("3", "https://crates.io", "crates.io", "dev", false),
        ("4", "https://www.figma.com", "Figma", "design", false),
        ("5", "https://news.ycombinator.com", "Hacker News", "read", false),
    ];
    let mut pinned_rank = 0;
    seed.iter()
        .enumerate()
        .map(|(index, (id, url, title, category, pinned))| {
            let pinned_order = if *pinned {
                pinned_rank += 1;
                Some(pinned_rank - 1)
            } else {
                None
            };
            Link {
                id: id.to_string(),
                url: url.to_string(),
                title: title.to_string(),
                description: None,
                category_id: category.to_string(),
                icon: None,
                pinned: *pinned,
                order: Some(index as i64),
                pinned_order,
                created_at: 0,
            }
        })
        .collect()
}
