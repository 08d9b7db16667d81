//! CSV rows and their translation into WooCommerce payloads.

use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;
use thiserror::Error;
use crate::domain::attachments::{CategoryRef, ImageRef, VariationAttribute};
use crate::domain::value_objects::{format_price, parse_price, PriceError, ProductStatus, ProductType, Sku, SkuError, StockStatus, UnknownVariant};
use crate::remote::{ProductPayload, VariationPayload};

const ATTRIBUTE_PREFIX: &str = "meta_attribute_";

/// One data row keyed by (cleaned) header, in header order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self { fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Trimmed value of a column; `None` when absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == column).map(|(_, v)| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> { self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    pub fn sku(&self) -> Option<String> { self.get("sku").map(str::to_string) }

    pub fn to_json(&self) -> serde_json::Value { serde_json::to_value(self).unwrap_or_default() }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields { map.serialize_entry(k, v)?; }
        map.end()
    }
}

/// Parses CSV text with a header line. Empty lines are skipped and header
/// names are trimmed and stripped of stray quotes.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) { continue; }
        rows.push(RawRow::from_pairs(headers.iter().cloned().zip(record.iter().map(str::to_string))));
    }
    Ok(rows)
}

fn clean_header(raw: &str) -> String { raw.trim_start_matches('\u{feff}').replace('"', "").trim().to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error(transparent)]
    Sku(#[from] SkuError),
    #[error(transparent)]
    Price(#[from] PriceError),
    #[error(transparent)]
    Value(#[from] UnknownVariant),
}

/// A validated parent-product row.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentRow {
    pub sku: Sku,
    pub payload: ProductPayload,
}

impl ParentRow {
    pub fn parse(row: &RawRow) -> Result<Self, RowError> {
        let sku = Sku::new(row.get("sku").ok_or(RowError::Missing("sku"))?)?;
        let name = row.get("post_title").ok_or(RowError::Missing("post_title"))?;
        let regular_price = parse_price(row.get("regular_price").unwrap_or_default())?;

        let payload = ProductPayload {
            name: Some(name.to_string()),
            slug: row.get("post_name").map(str::to_string),
            product_type: Some(parse_or_default::<ProductType>(row, "tax_product_type")?),
            status: Some(parse_or_default::<ProductStatus>(row, "post_status")?),
            sku: Some(sku.as_str().to_string()),
            regular_price: regular_price.map(|p| format_price(Some(p))),
            description: row.get("post_content").map(str::to_string),
            short_description: row.get("post_excerpt").map(str::to_string),
            stock_status: Some(parse_or_default::<StockStatus>(row, "stock_status")?),
            categories: row.get("tax_product_cat").map(|v| split_list(v).map(CategoryRef::named).collect()),
            images: row.get("images").map(|v| split_list(v).map(ImageRef::from_src).collect()),
            ..Default::default()
        };
        Ok(Self { sku, payload })
    }
}

/// A validated variation row, still to be attached to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct VariationRow {
    pub parent_sku: Sku,
    pub sku: Sku,
    pub payload: VariationPayload,
}

impl VariationRow {
    pub fn parse(row: &RawRow) -> Result<Self, RowError> {
        let parent_sku = Sku::new(row.get("parent_sku").ok_or(RowError::Missing("parent_sku"))?)?;
        let sku = Sku::new(row.get("sku").ok_or(RowError::Missing("sku"))?)?;
        let regular_price = parse_price(row.get("regular_price").unwrap_or_default())?;

        let attributes: Vec<VariationAttribute> = row
            .iter()
            .filter_map(|(column, value)| {
                let name = column.strip_prefix(ATTRIBUTE_PREFIX)?.trim();
                let option = value.trim();
                (!name.is_empty() && !option.is_empty()).then(|| VariationAttribute { id: None, name: name.to_string(), option: option.to_string() })
            })
            .collect();

        let payload = VariationPayload {
            sku: Some(sku.as_str().to_string()),
            regular_price: regular_price.map(|p| format_price(Some(p))),
            stock_status: Some(parse_or_default::<StockStatus>(row, "stock_status")?),
            attributes: (!attributes.is_empty()).then_some(attributes),
            image: row.get("images").and_then(|v| split_list(v).next()).map(ImageRef::from_src),
            ..Default::default()
        };
        Ok(Self { parent_sku, sku, payload })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> { raw.split('|').map(str::trim).filter(|s| !s.is_empty()) }

/// Blank means the default. `other` only exists to absorb values read back
/// from WooCommerce, so it is refused here.
fn parse_or_default<T>(row: &RawRow, column: &'static str) -> Result<T, UnknownVariant>
where
    T: std::str::FromStr<Err = UnknownVariant> + Default,
{
    match row.get(column).map(str::to_ascii_lowercase) {
        None => Ok(T::default()),
        Some(value) if value == "other" => Err(UnknownVariant { kind: column, value }),
        Some(value) => value.parse(),
    }
}
