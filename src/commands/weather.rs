use vesseltrack::config::Config;
use vesseltrack::error::Result;
use vesseltrack::weather::WeatherClient;

pub async fn weather(config: &Config, lat: f64, lon: f64) -> Result<()> {
    let client = WeatherClient::new(config.weather.clone())?;
    let snapshot = client.current(lat, lon).await?;

    let show = |value: Option<f64>, unit: &str| match value {
        Some(v) => format!("{v}{unit}"),
        None => "n/a".to_string(),
    };

    println!("Weather at {lat}, {lon}");
    println!("========================");
    println!("  Conditions: {}", snapshot.weather.as_deref().unwrap_or("n/a"));
    println!("  Temperature: {}", show(snapshot.temp, " °C"));
    println!("  Pressure: {}", show(snapshot.pressure, " hPa"));
    println!("  Humidity: {}", show(snapshot.humidity, "%"));
    println!("  Wind: {}", show(snapshot.wind_speed, " m/s"));
    println!("  Sea level: {}", show(snapshot.sea_level, " hPa"));
    println!("  Ground level: {}", show(snapshot.grnd_level, " hPa"));
    Ok(())
}
