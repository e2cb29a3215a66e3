//! Filter selections and the in-memory predicate

use crate::core::item::{ClothingSize, ClothingType, Item};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User-selected constraints on a listing
///
/// Every field is optional. An absent field, or an empty set, places no
/// constraint on that dimension. Constraints are ANDed across dimensions and
/// ORed within a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSelection {
    /// Inclusive lower price bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,

    /// Inclusive upper price bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<ClothingSize>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<ClothingType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_price(mut self, price: Decimal) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Decimal) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn sizes(mut self, sizes: impl IntoIterator<Item = ClothingSize>) -> Self {
        self.sizes = Some(sizes.into_iter().collect());
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = ClothingType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    pub fn brands<S: Into<String>>(mut self, brands: impl IntoIterator<Item = S>) -> Self {
        self.brands = Some(brands.into_iter().map(Into::into).collect());
        self
    }

    pub fn colors<S: Into<String>>(mut self, colors: impl IntoIterator<Item = S>) -> Self {
        self.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }

    /// True when no dimension is constrained
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && active(&self.sizes).is_none()
            && active(&self.types).is_none()
            && active(&self.brands).is_none()
            && active(&self.colors).is_none()
    }

    /// Decide whether an item satisfies every present constraint
    pub fn matches(&self, item: &Item) -> bool {
        self.min_price.is_none_or(|min| item.price >= min)
            && self.max_price.is_none_or(|max| item.price <= max)
            && active(&self.sizes).is_none_or(|sizes| sizes.contains(&item.size))
            && active(&self.types).is_none_or(|types| types.contains(&item.item_type))
            && active(&self.brands).is_none_or(|brands| brands.contains(&item.brand))
            && active(&self.colors).is_none_or(|colors| colors.contains(&item.color))
    }

    /// Keep the matching items, preserving their order
    pub fn apply(&self, items: Vec<Item>) -> Vec<Item> {
        if self.is_empty() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// A set constraint only counts when it has at least one value
pub(crate) fn active<T>(set: &Option<Vec<T>>) -> Option<&[T]> {
    set.as_deref().filter(|values| !values.is_empty())
}
