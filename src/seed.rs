//! Sample catalogue data
//!
//! Populates an empty catalogue with a fixed set of items whose images are
//! hosted externally, so a fresh deployment has something to browse.

use crate::core::error::CatalogueResult;
use crate::core::item::{ClothingSize, ClothingType, ImageRef, ItemFields};
use crate::core::store::ItemStore;
use rust_decimal::Decimal;

/// A sample entry: item fields plus its externally hosted image
#[derive(Debug, Clone, PartialEq)]
pub struct SampleItem {
    pub fields: ItemFields,
    pub image: ImageRef,
}

fn unsplash(photo: &str) -> ImageRef {
    ImageRef::external(format!(
        "https://images.unsplash.com/{}?auto=format&fit=crop&w=800&q=80",
        photo
    ))
}

#[allow(clippy::too_many_arguments)]
fn sample(
    name: &str,
    description: &str,
    brand: &str,
    cents: i64,
    color: &str,
    size: ClothingSize,
    item_type: ClothingType,
    photo: &str,
) -> SampleItem {
    SampleItem {
        fields: ItemFields {
            name: name.to_string(),
            description: description.to_string(),
            brand: brand.to_string(),
            price: Decimal::new(cents, 2),
            color: color.to_string(),
            size,
            item_type,
        },
        image: unsplash(photo),
    }
}

/// The sample catalogue, in insertion order
pub fn sample_items() -> Vec<SampleItem> {
    use ClothingSize::*;
    use ClothingType::*;

    vec![
        sample(
            "Classic White Oxford Shirt",
            "A timeless white oxford shirt perfect for any occasion",
            "Royal Essentials",
            8999,
            "White",
            Medium,
            Shirt,
            "photo-1604695573706-53170668f6a6",
        ),
        sample(
            "Slim Fit Black Dress Pants",
            "Modern slim fit dress pants in classic black",
            "Royal Collection",
            12999,
            "Black",
            Large,
            Pants,
            "photo-1594633313593-bab3825d0caf",
        ),
        sample(
            "Navy Blue Blazer",
            "Sophisticated navy blazer with modern cut",
            "Royal Luxe",
            29999,
            "Navy",
            Medium,
            Jacket,
            "photo-1592878940526-0214b0f374f6",
        ),
        sample(
            "Floral Summer Dress",
            "Light and airy floral dress perfect for summer",
            "Royal Boutique",
            15999,
            "Multicolor",
            Small,
            Dress,
            "photo-1572804013309-59a88b7e92f1",
        ),
        sample(
            "Leather Oxford Shoes",
            "Classic brown leather oxford shoes",
            "Royal Footwear",
            19999,
            "Brown",
            ExtraLarge,
            Shoes,
            "photo-1614252369475-531eba835eb1",
        ),
        sample(
            "Pleated Midi Skirt",
            "Elegant pleated midi skirt in charcoal grey",
            "Royal Collection",
            11999,
            "Grey",
            Medium,
            Skirt,
            "photo-1583496661160-fb5886a0aaaa",
        ),
        sample(
            "Silk Neck Scarf",
            "Luxurious silk scarf with geometric pattern",
            "Royal Accessories",
            4999,
            "Red",
            Small,
            Accessory,
            "photo-1584030373081-f37b7bb4fa8e",
        ),
        sample(
            "Wool Peacoat",
            "Classic wool peacoat for winter",
            "Royal Outerwear",
            34999,
            "Black",
            Large,
            Jacket,
            "photo-1551489186-cf8726f514f8",
        ),
        sample(
            "Striped Cotton Shirt",
            "Classic striped button-down shirt",
            "Royal Essentials",
            7999,
            "Blue",
            Medium,
            Shirt,
            "photo-1596755094514-f87e34085b2c",
        ),
        sample(
            "Leather Belt",
            "Premium leather belt with silver buckle",
            "Royal Accessories",
            6999,
            "Brown",
            Medium,
            Accessory,
            "photo-1553062407-98eeb64c6a62",
        ),
        sample(
            "Evening Gown",
            "Elegant black evening gown",
            "Royal Luxe",
            49999,
            "Black",
            Small,
            Dress,
            "photo-1566624790190-511a09f6ddbd",
        ),
        sample(
            "Chino Pants",
            "Casual chino pants in khaki",
            "Royal Essentials",
            8999,
            "Khaki",
            Medium,
            Pants,
            "photo-1624378439575-d8705ad7ae80",
        ),
    ]
}

/// Insert every sample item, in order, and return the new ids
///
/// Stops at the first failure; items inserted before it are kept.
pub async fn seed_catalogue(store: &ItemStore) -> CatalogueResult<Vec<String>> {
    let samples = sample_items();
    tracing::info!(count = samples.len(), "Seeding catalogue with sample data");

    let mut ids = Vec::with_capacity(samples.len());
    for sample in samples {
        let name = sample.fields.name.clone();
        let id = store.import(sample.fields, vec![sample.image]).await?;
        tracing::info!(item_id = %id, name = %name, "Added sample item");
        ids.push(id);
    }

    tracing::info!(count = ids.len(), "Seeded catalogue");
    Ok(ids)
}
