//! Catalogue item model and its persisted document shape
//!
//! Items are stored as camelCase documents. Three generations of the image
//! field exist in stored data:
//!
//! - `imageUrl`: a single public URL (oldest records)
//! - `imageUrls`: an ordered list of public URLs
//! - `images`: an ordered list of [`ImageRef`] (written by this crate)
//!
//! All three are normalized into [`Item::images`] when a record is decoded,
//! so nothing downstream ever looks at the stored shape.

use crate::core::service::Document;
use anyhow::{Result, anyhow};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Garment size, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClothingSize {
    #[serde(rename = "XS")]
    ExtraSmall,
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XXL")]
    DoubleExtraLarge,
    #[serde(rename = "One Size")]
    OneSize,
}

impl ClothingSize {
    pub const ALL: [ClothingSize; 7] = [
        ClothingSize::ExtraSmall,
        ClothingSize::Small,
        ClothingSize::Medium,
        ClothingSize::Large,
        ClothingSize::ExtraLarge,
        ClothingSize::DoubleExtraLarge,
        ClothingSize::OneSize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingSize::ExtraSmall => "XS",
            ClothingSize::Small => "S",
            ClothingSize::Medium => "M",
            ClothingSize::Large => "L",
            ClothingSize::ExtraLarge => "XL",
            ClothingSize::DoubleExtraLarge => "XXL",
            ClothingSize::OneSize => "One Size",
        }
    }
}

impl fmt::Display for ClothingSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClothingSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClothingSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| format!("unknown size '{}'", s))
    }
}

/// Garment type, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClothingType {
    Shirt,
    Pants,
    Dress,
    Jacket,
    Skirt,
    Shoes,
    Accessory,
}

impl ClothingType {
    pub const ALL: [ClothingType; 7] = [
        ClothingType::Shirt,
        ClothingType::Pants,
        ClothingType::Dress,
        ClothingType::Jacket,
        ClothingType::Skirt,
        ClothingType::Shoes,
        ClothingType::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingType::Shirt => "Shirt",
            ClothingType::Pants => "Pants",
            ClothingType::Dress => "Dress",
            ClothingType::Jacket => "Jacket",
            ClothingType::Skirt => "Skirt",
            ClothingType::Shoes => "Shoes",
            ClothingType::Accessory => "Accessory",
        }
    }
}

impl fmt::Display for ClothingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClothingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClothingType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown type '{}'", s))
    }
}

/// Reference to one stored image
///
/// `path` is the blob store key and is what deletion uses. It is absent for
/// images hosted elsewhere (sample data) and for records written before keys
/// were kept alongside URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub url: String,
}

impl ImageRef {
    /// Reference to an image uploaded to the blob store
    pub fn stored(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            url: url.into(),
        }
    }

    /// Reference to an image hosted outside the blob store
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            path: None,
            url: url.into(),
        }
    }
}

/// A catalogue entry as seen by callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub price: Decimal,
    pub color: String,
    pub size: ClothingSize,
    #[serde(rename = "type")]
    pub item_type: ClothingType,
    pub images: Vec<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// The primary image shown in listings
    pub fn cover_image(&self) -> Option<&ImageRef> {
        self.images.first()
    }

    /// Decode a stored document, normalizing legacy image shapes
    pub fn from_document(id: impl Into<String>, doc: Document) -> Result<Self> {
        let id = id.into();
        let stored: StoredItem = serde_json::from_value(Value::Object(doc))
            .map_err(|e| anyhow!("Failed to decode item '{}': {}", id, e))?;

        let images = stored.images.into_refs();
        if images.is_empty() {
            return Err(anyhow!("Item '{}' has an empty image list", id));
        }

        Ok(Self {
            id,
            name: stored.name,
            description: stored.description,
            brand: stored.brand,
            price: stored.price,
            color: stored.color,
            size: stored.size,
            item_type: stored.item_type,
            images,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

/// Scalar fields supplied when creating an item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub price: Decimal,
    pub color: String,
    pub size: ClothingSize,
    pub item_type: ClothingType,
}

impl ItemFields {
    /// Encode a full record in the current shape
    pub fn to_document(
        &self,
        images: &[ImageRef],
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Document> {
        let record = ItemRecord {
            name: &self.name,
            description: &self.description,
            brand: &self.brand,
            price: self.price,
            color: &self.color,
            size: self.size,
            item_type: self.item_type,
            images,
            created_at,
            updated_at,
        };

        match serde_json::to_value(record)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(anyhow!("Item record did not serialize to an object")),
        }
    }
}

/// Partial update of an item
///
/// `images`, when set, is the caller's already-trimmed list of existing
/// images. Newly uploaded images are appended after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub color: Option<String>,
    pub size: Option<ClothingSize>,
    pub item_type: Option<ClothingType>,
    pub images: Option<Vec<ImageRef>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }

    /// Encode the provided scalar fields as a partial document
    ///
    /// Images and the modification timestamp are added by the store.
    pub fn scalar_document(&self) -> Result<Document> {
        let mut doc = Document::new();
        if let Some(name) = &self.name {
            doc.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(description) = &self.description {
            doc.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(brand) = &self.brand {
            doc.insert("brand".into(), Value::String(brand.clone()));
        }
        if let Some(price) = self.price {
            doc.insert("price".into(), price_value(price)?);
        }
        if let Some(color) = &self.color {
            doc.insert("color".into(), Value::String(color.clone()));
        }
        if let Some(size) = self.size {
            doc.insert("size".into(), Value::String(size.as_str().into()));
        }
        if let Some(item_type) = self.item_type {
            doc.insert("type".into(), Value::String(item_type.as_str().into()));
        }
        Ok(doc)
    }
}

/// Binary image supplied for upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension of the original file name, if it has a usable one
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Collision-resistant blob key: `<prefix>/<millis>_<random>.<ext>`
    pub fn storage_key(&self, prefix: &str, at: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = match self.extension() {
            Some(ext) => format!("{}_{}.{}", at.timestamp_millis(), &suffix[..12], ext),
            None => format!("{}_{}", at.timestamp_millis(), &suffix[..12]),
        };
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        }
    }
}

/// Encode a timestamp as fixed-width RFC 3339 (microseconds, `Z`)
///
/// Fixed width keeps lexical order equal to chronological order, which is
/// what document engines use when sorting strings.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Prices must stay below this bound, in whole currency units
pub const PRICE_LIMIT: i64 = 10_000_000_000_000;

/// Decimal places a price may carry
pub const MAX_PRICE_SCALE: u32 = 2;

/// Check that a price survives being stored as a double
///
/// At most two decimal places below [`PRICE_LIMIT`] is fifteen significant
/// digits, which a double holds exactly.
pub fn check_storable_price(price: Decimal) -> std::result::Result<(), String> {
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(format!(
            "'price' allows at most {} decimal places (got {})",
            MAX_PRICE_SCALE, price
        ));
    }
    if price.abs() >= Decimal::new(PRICE_LIMIT, 0) {
        return Err(format!("'price' must be below {} (got {})", PRICE_LIMIT, price));
    }
    Ok(())
}

/// Encode a price as a JSON number so document engines can range over it
pub fn price_value(price: Decimal) -> Result<Value> {
    price_to_f64(price)
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("Price {} cannot be stored as a number", price))
}

/// Nearest double to the decimal, via correctly rounded string parsing
fn price_to_f64(price: Decimal) -> Option<f64> {
    price.to_string().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Shortest decimal that reads back as the same double
fn price_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Prices persist as JSON numbers and read back exactly when storable
mod price_number {
    use super::{price_from_f64, price_to_f64};
    use rust_decimal::Decimal;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let value = price_to_f64(*price)
            .ok_or_else(|| serde::ser::Error::custom(format!("price {} is not finite", price)))?;
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }

    struct PriceVisitor;

    impl Visitor<'_> for PriceVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a price as a number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
            price_from_f64(value).ok_or_else(|| E::custom(format!("invalid price {}", value)))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Decimal, E> {
            Decimal::from_str(value.trim()).map_err(E::custom)
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord<'a> {
    name: &'a str,
    description: &'a str,
    brand: &'a str,
    #[serde(with = "price_number")]
    price: Decimal,
    color: &'a str,
    size: ClothingSize,
    #[serde(rename = "type")]
    item_type: ClothingType,
    images: &'a [ImageRef],
    #[serde(serialize_with = "serialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    name: String,
    #[serde(default)]
    description: String,
    brand: String,
    #[serde(with = "price_number")]
    price: Decimal,
    color: String,
    size: ClothingSize,
    #[serde(rename = "type")]
    item_type: ClothingType,
    #[serde(flatten)]
    images: StoredImages,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredImages {
    Refs {
        images: Vec<ImageRef>,
    },
    Urls {
        #[serde(rename = "imageUrls")]
        image_urls: Vec<String>,
    },
    Single {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
}

impl StoredImages {
    fn into_refs(self) -> Vec<ImageRef> {
        match self {
            StoredImages::Refs { images } => images,
            StoredImages::Urls { image_urls } => {
                image_urls.into_iter().map(ImageRef::external).collect()
            }
            StoredImages::Single { image_url } => vec![ImageRef::external(image_url)],
        }
    }
}
