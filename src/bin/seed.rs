use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    models::{Product, ProductImage, ProductStatus, Role, User},
    query::ProductFilter,
    state::AppState,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::postgres(pool, config);

    let admin_id = ensure_user(&state, "Admin", "admin@example.com", "admin1234", Role::Admin).await?;
    let user_id = ensure_user(&state, "Shopper", "user@example.com", "user12345", Role::User).await?;
    seed_products(&state, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(mut existing) = state.users.find_by_email(email).await? {
        if existing.role != role {
            existing.role = role;
            state.users.save(&existing).await?;
        }
        println!("User {email} already present (role={})", role.as_str());
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let user = state
        .users
        .insert(User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        })
        .await?;
    println!("Created user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(state: &AppState, owner: Uuid) -> anyhow::Result<()> {
    if state.products.count(&ProductFilter::all()).await? > 0 {
        println!("Catalog not empty; skipping products");
        return Ok(());
    }

    let catalog = [
        ("Ferris Plush", "Soft crab for your desk", 2_499, "Toys", "Rustacean Goods", "plush,gift", 40, true),
        ("Borrow Checker Mug", "Holds exactly one mutable coffee", 1_299, "Kitchen", "Rustacean Goods", "mug,gift", 120, false),
        ("Mechanical Keyboard", "Tactile switches, hot-swap sockets", 8_900, "Electronics", "KeyWorks", "keyboard,desk", 15, true),
        ("USB-C Dock", "Four ports and a card reader", 5_450, "Electronics", "PortHub", "usb,desk", 0, false),
    ];

    for (name, description, price, category, brand, tags, stock, featured) in catalog {
        let now = Utc::now();
        let id = Uuid::new_v4();
        state
            .products
            .insert(Product {
                id,
                name: name.to_string(),
                description: description.to_string(),
                price,
                category: category.to_string(),
                brand: brand.to_string(),
                tags: tags.split(',').map(str::to_string).collect(),
                stock,
                num_of_reviews: 0,
                ratings: 0.0,
                images: vec![ProductImage {
                    storage_id: format!("seed-{id}"),
                    url: format!("{}/seed-{id}.png", state.config.image_base_url),
                }],
                is_featured: featured,
                status: if stock > 0 {
                    ProductStatus::Active
                } else {
                    ProductStatus::OutOfStock
                },
                owner,
                reviews: Vec::new(),
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    println!("Seeded {} products", catalog.len());
    Ok(())
}
