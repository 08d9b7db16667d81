//! Semi-structured attachments stored as `jsonb` next to the relational columns.
//!
//! These mirror the nested objects of the WooCommerce product schema. Filtering
//! on them needs the GIN indexes created by the migration rather than joins.
//! The same records are sent back to WooCommerce in payloads, so every field
//! the remote may omit is optional.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CategoryRef {
    pub fn named(name: &str) -> Self {
        Self { id: None, name: Some(name.to_string()), slug: Some(slugify(name)) }
    }

    /// Reference used when pushing to another shop: ids are shop-local, names are not.
    pub fn portable(&self) -> Self {
        Self { id: None, name: self.name.clone(), slug: self.slug.clone() }
    }
}

pub type TagRef = CategoryRef;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn from_src(src: &str) -> Self { Self { src: src.to_string(), ..Self::default() } }

    pub fn portable(&self) -> Self { Self { id: None, src: self.src.clone(), name: None, alt: self.alt.clone() } }
}

/// Product-level attribute with its full list of options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub variation: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Variation-level attribute: a single chosen option.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub option: String,
}

fn default_true() -> bool { true }

/// `"Summer Shoes"` -> `"summer-shoes"`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join("-")
}
