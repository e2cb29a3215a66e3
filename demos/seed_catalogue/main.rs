//! Seed a catalogue with sample items, then browse it as a visitor and as
//! an admin
//!
//! ```sh
//! cargo run --example seed_catalogue -- [config.yaml]
//! ```

use std::path::PathBuf;
use storefront::prelude::*;
use storefront::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    println!("🛍️  Storefront Seed Example\n");

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = match StorefrontConfig::load(path.as_deref()) {
        Ok(config) => config,
        Err(ConfigError::MissingFields { fields }) if path.is_none() => {
            tracing::warn!(?fields, "No configuration given, using in-memory demo settings");
            StorefrontConfig {
                admin_password: Some("demo".to_string()),
                ..Default::default()
            }
        }
        Err(e) => return Err(e.into()),
    };

    let store = open_item_store(&config).await?;

    println!("📦 Seeding sample items...\n");
    let ids = seed_catalogue(&store).await?;
    println!("✅ Inserted {} items\n", ids.len());

    println!("🔎 Medium shirts under $100:");
    let selection = FilterSelection::new()
        .sizes([ClothingSize::Medium])
        .types([ClothingType::Shirt])
        .max_price(Decimal::new(100, 0));
    for item in store.list(Some(&selection)).await? {
        println!("   - {} ({}, ${})", item.name, item.brand, item.price);
    }

    println!("\n🔐 Admin session");
    let gate = config.admin_gate();
    let mut session = gate.login("wrong password");
    println!("   wrong password -> admin: {}", session.is_admin());
    if let Some(secret) = config.admin_secret() {
        session = gate.login(secret);
    }
    println!("   configured secret -> admin: {}", session.is_admin());

    if AccessPolicy::AdminOnly.check(&session)
        && let Some(first) = ids.first()
    {
        let patch = ItemPatch {
            price: Some(Decimal::new(7999, 2)),
            ..Default::default()
        };
        store.update(first, patch, Vec::new()).await?;
        let item = store.get(first).await?;
        if let Some(item) = item {
            println!("   repriced '{}' to ${}", item.name, item.price);
        }

        store.delete_item(first).await?;
        println!("   deleted '{}'", first);
    }
    session.end();

    println!("\n📋 Catalogue now holds {} items", store.list(None).await?.len());
    Ok(())
}
