use lawn_booking_api::{
    config::database_url_from_env,
    db::{create_pool, run_migrations},
    services::catalog_service::{DEFAULT_CATALOG, seed_default_catalog},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;

    let pool = create_pool(&database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let ids = seed_default_catalog(&pool).await?;
    for (entry, id) in DEFAULT_CATALOG.iter().zip(&ids) {
        println!("Seeded service: {} (ID: {id})", entry.name);
    }

    println!("Seed completed. {} services in catalog.", ids.len());
    Ok(())
}
