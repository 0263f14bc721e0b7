//! Seed the category taxonomy.
//!
//! The marketplace ships a fixed two-level taxonomy; sellers pick from it
//! rather than inventing their own. Seeding is idempotent: categories and
//! subcategories are upserted by slug, so re-running after adding a new
//! entry here only inserts the new rows.

use sqlx::PgPool;
use tracing::info;

use shopmate_core::CategoryId;

/// One category with its subcategories, as (name, slug) pairs.
type CategorySeed = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const TAXONOMY: &[CategorySeed] = &[
    (
        "Groceries",
        "groceries",
        &[
            ("Rice & Grains", "rice-grains"),
            ("Fruits & Vegetables", "fruits-vegetables"),
            ("Dairy & Eggs", "dairy-eggs"),
            ("Meat & Seafood", "meat-seafood"),
            ("Snacks & Beverages", "snacks-beverages"),
            ("Cooking Essentials", "cooking-essentials"),
            ("Bakery & Bread", "bakery-bread"),
        ],
    ),
    (
        "Electronics",
        "electronics",
        &[
            ("Smartphones", "smartphones"),
            ("Laptops & Computers", "laptops-computers"),
            ("Home Appliances", "home-appliances"),
            ("Cameras & Photography", "cameras-photography"),
            ("Audio & Headphones", "audio-headphones"),
            ("Smart Devices", "smart-devices"),
        ],
    ),
    (
        "Fashion",
        "fashion",
        &[
            ("Men's Clothing", "mens-clothing"),
            ("Women's Clothing", "womens-clothing"),
            ("Kids' Clothing", "kids-clothing"),
            ("Footwear", "footwear"),
            ("Accessories", "accessories"),
            ("Jewelry & Watches", "jewelry-watches"),
        ],
    ),
    (
        "Home & Living",
        "home-living",
        &[
            ("Furniture", "furniture"),
            ("Home Decor", "home-decor"),
            ("Kitchen & Dining", "kitchen-dining"),
            ("Bedding & Linen", "bedding-linen"),
            ("Storage & Organization", "storage-organization"),
        ],
    ),
    (
        "Beauty & Personal Care",
        "beauty-personal-care",
        &[
            ("Skincare", "skincare"),
            ("Makeup", "makeup"),
            ("Hair Care", "hair-care"),
            ("Fragrances", "fragrances"),
            ("Personal Hygiene", "personal-hygiene"),
        ],
    ),
    (
        "Books & Stationery",
        "books-stationery",
        &[
            ("Books", "books"),
            ("Office Supplies", "office-supplies"),
            ("Art & Craft", "art-craft"),
            ("School Supplies", "school-supplies"),
        ],
    ),
    (
        "Sports & Fitness",
        "sports-fitness",
        &[
            ("Exercise Equipment", "exercise-equipment"),
            ("Sports Gear", "sports-gear"),
            ("Fitness Accessories", "fitness-accessories"),
            ("Outdoor Recreation", "outdoor-recreation"),
        ],
    ),
];

/// Upsert the full taxonomy.
///
/// # Errors
///
/// Returns an error if the connection or any statement fails.
pub async fn taxonomy() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    info!("Connected to database");

    for (name, slug, subcategories) in TAXONOMY {
        let category_id = upsert_category(&pool, name, slug).await?;
        info!(category = name, "Seeded category");

        for (sub_name, sub_slug) in *subcategories {
            upsert_subcategory(&pool, category_id, sub_name, sub_slug).await?;
        }
        info!(
            category = name,
            subcategories = subcategories.len(),
            "Seeded subcategories"
        );
    }

    info!("Taxonomy seed complete!");
    Ok(())
}

async fn upsert_category(pool: &PgPool, name: &str, slug: &str) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar::<_, CategoryId>(
        "INSERT INTO categories (name, slug) VALUES ($1, $2)
         ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await
}

async fn upsert_subcategory(
    pool: &PgPool,
    category_id: CategoryId,
    name: &str,
    slug: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subcategories (category_id, name, slug) VALUES ($1, $2, $3)
         ON CONFLICT (category_id, slug) DO UPDATE SET name = EXCLUDED.name",
    )
    .bind(category_id)
    .bind(name)
    .bind(slug)
    .execute(pool)
    .await?;

    Ok(())
}
