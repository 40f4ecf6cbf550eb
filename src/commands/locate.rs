use std::sync::Arc;

use vesseltrack::config::Config;
use vesseltrack::error::Result;
use vesseltrack::feed::FeedClient;
use vesseltrack::models::ShipLocation;
use vesseltrack::query::QueryService;
use vesseltrack::storage::create_sqlite_repository;

fn query_service(config: &Config) -> Result<QueryService> {
    let registry = create_sqlite_repository(&config.database.sqlite_path)?;
    let feed = FeedClient::new(config.telemetry.clone())?;

    Ok(QueryService::new(registry, Arc::new(feed))
        .with_bulk_concurrency(config.query.bulk_concurrency))
}

fn print_location(location: &ShipLocation) {
    println!(
        "{} (owner: {}) at {:.5}, {:.5}",
        location.ship_name, location.owner_name, location.lat, location.lon
    );
    if !location.observed_at.is_empty() {
        println!("   Observed: {}", location.observed_at);
    }
}

pub async fn locate(config: &Config, ship_name: &str) -> Result<()> {
    let location = query_service(config)?.locate_one(Some(ship_name)).await?;

    print_location(&location);
    Ok(())
}

pub async fn locate_all(config: &Config) -> Result<()> {
    let service = query_service(config)?;
    let total = service.registry().count()?;
    let locations = service.locate_all().await?;

    println!("Located {} of {} ships", locations.len(), total);
    println!("========================");
    for location in &locations {
        print_location(location);
    }

    Ok(())
}
