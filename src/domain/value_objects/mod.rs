//! Value Objects for the catalog mirror

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an enum whose variants travel as lowercase strings, both on the
/// WooCommerce wire and in the `varchar` status columns.
///
/// An `open` enum also carries `Other`: any unrecognised wire value decodes to
/// it, so plugin-defined types or statuses never fail a whole page. `FromStr`
/// stays strict for both kinds.
macro_rules! wire_enum {
    (@common $name:ident { $($variant:ident => $wire:literal),+ }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $wire),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownVariant { kind: stringify!($name), value: other.to_string() }),
                }
            }
        }
    };

    (open $(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
            #[serde(rename = "other")] Other,
        }

        wire_enum!(@common $name { $($variant => $wire),+, Other => "other" });

        impl $name {
            /// `None` for values this crate does not model.
            pub fn known(self) -> Option<Self> { (self != Self::Other).then_some(self) }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match Option::<String>::deserialize(deserializer)? {
                    Some(raw) => raw.parse().unwrap_or(Self::Other),
                    None => Self::default(),
                })
            }
        }
    };

    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        wire_enum!(@common $name { $($variant => $wire),+ });
    };
}

wire_enum! {
    /// Last observed liveness of a connected shop.
    ShopStatus { Online => "online", Offline => "offline", Unknown => "unknown" }
}

wire_enum! {
    open ProductType { Simple => "simple", Variable => "variable", Grouped => "grouped", External => "external" }
}

wire_enum! {
    open
    /// WooCommerce post status of a product or variation.
    ProductStatus { Draft => "draft", Pending => "pending", Private => "private", Publish => "publish" }
}

wire_enum! {
    open StockStatus { InStock => "instock", OutOfStock => "outofstock", OnBackorder => "onbackorder" }
}

wire_enum! {
    /// What an import batch is tracking: one of the two CSV layouts, or a store-wide sync.
    ImportKind { Parent => "parent", Variations => "variations", Sync => "sync" }
}

wire_enum! {
    ImportStatus { Pending => "pending", Processing => "processing", Completed => "completed", Failed => "failed" }
}

wire_enum! {
    /// Classification recorded on every import error row.
    ErrorCategory { Validation => "validation", WooCommerce => "woocommerce", Network => "network", Database => "database" }
}

impl Default for ShopStatus { fn default() -> Self { Self::Unknown } }
impl Default for ProductType { fn default() -> Self { Self::Simple } }
impl Default for ProductStatus { fn default() -> Self { Self::Publish } }
impl Default for StockStatus { fn default() -> Self { Self::InStock } }
impl Default for ImportStatus { fn default() -> Self { Self::Pending } }

impl ImportStatus {
    pub fn is_terminal(&self) -> bool { matches!(self, Self::Completed | Self::Failed) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant { pub kind: &'static str, pub value: String }
impl std::error::Error for UnknownVariant {}
impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown {} value '{}'", self.kind, self.value) }
}

/// SKU (Stock Keeping Unit) value object.
///
/// The correlation key between shops. Case-sensitive; surrounding
/// whitespace is dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 100;

    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// Fallback master SKU for remote products that carry none.
    pub fn for_remote_id(remote_id: i64) -> Self { Self(format!("woo-{remote_id}")) }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU is required"), Self::TooLong => write!(f, "SKU exceeds {} characters", Sku::MAX_LEN) }
    }
}

/// Parses a WooCommerce price string. WooCommerce sends `""` for "no price".
pub fn parse_price(raw: &str) -> Result<Option<Decimal>, PriceError> {
    let raw = raw.trim();
    if raw.is_empty() { return Ok(None); }
    let amount = Decimal::from_str(raw).map_err(|_| PriceError::Invalid(raw.to_string()))?;
    if amount.is_sign_negative() { return Err(PriceError::Negative(raw.to_string())); }
    Ok(Some(amount))
}

/// Lenient variant for values coming back from the remote store, which is authoritative.
pub fn price_or_none(raw: &str) -> Option<Decimal> { parse_price(raw).ok().flatten() }

/// Renders a price the way WooCommerce expects it in payloads.
pub fn format_price(price: Option<Decimal>) -> String {
    price.map(|p| p.normalize().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PriceError { Invalid(String), Negative(String) }
impl std::error::Error for PriceError {}
impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(v) => write!(f, "invalid price '{v}'"),
            Self::Negative(v) => write!(f, "price cannot be negative: '{v}'"),
        }
    }
}
