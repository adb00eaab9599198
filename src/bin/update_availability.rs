// Marks every car in the data file as available from today until the end
// of the booking horizon.
//
// Usage: update_availability [path]   (defaults to data/cars.json)

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use minivan_rent::availability::{availability_end, refresh_file};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "minivan_rent=info,update_availability=info".into()))
        .with(fmt::layer())
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/cars.json"));
    let today = Local::now().date_naive();

    let updated = refresh_file(&path, today)?;
    tracing::info!(
        "Updated {} cars in {}: available from {} to {}",
        updated,
        path.display(),
        today,
        availability_end()
    );
    Ok(())
}
