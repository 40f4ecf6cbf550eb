use vesseltrack::config::Config;
use vesseltrack::error::Result;
use vesseltrack::models::{Device, NewDevice};
use vesseltrack::storage::{create_sqlite_repository, SharedDeviceRepository};

fn open_registry(config: &Config) -> Result<SharedDeviceRepository> {
    tracing::debug!(path = %config.database.sqlite_path.display(), "Opening registry");
    Ok(create_sqlite_repository(&config.database.sqlite_path)?)
}

fn print_device(device: &Device) {
    println!("{}. {} (owner: {})", device.id, device.ship_name, device.owner_name);
    println!("   Channel: {}", device.channel_id);
    println!(
        "   Registered: {}",
        device.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

pub fn list_devices(config: &Config) -> Result<()> {
    let devices = open_registry(config)?.list()?;

    if devices.is_empty() {
        println!("No devices registered.");
        return Ok(());
    }

    println!("Registered devices ({})", devices.len());
    println!("========================");
    for device in &devices {
        print_device(device);
    }

    Ok(())
}

pub fn add_device(config: &Config, new_device: NewDevice) -> Result<()> {
    let device = open_registry(config)?.create(&new_device)?;

    tracing::info!(device_id = device.id, ship_name = %device.ship_name, "Device registered");
    println!("Registered device:");
    print_device(&device);
    Ok(())
}

pub fn show_device(config: &Config, id: i64) -> Result<()> {
    let device = open_registry(config)?.get(id)?;
    print_device(&device);
    Ok(())
}

pub fn remove_device(config: &Config, id: i64) -> Result<()> {
    if open_registry(config)?.delete(id)? {
        println!("Removed device {id}.");
    } else {
        println!("Device {id} was not registered.");
    }
    Ok(())
}
