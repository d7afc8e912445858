use harvest_hub::config::AppConfig;
use harvest_hub::db::{self, queries};
use harvest_hub::services::seed;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let config = AppConfig::from_env();
    let mut conn = db::init_db(&config.database_url)?;

    let removed = seed::reseed(&mut conn)?;
    println!("Cleared {removed} existing listings");

    let count = queries::count_listings(&conn)?;
    println!("Product count in DB: {count}");

    if let Some(first) = queries::list_listings(&conn, None, None)?.first() {
        println!("Sample listing: {}", first.title);
    }

    Ok(())
}
