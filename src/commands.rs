use std::io::Write;

use lugabiz_core::AppConfigExt;
use lugabiz_core::geo::GeoPosition;
use lugabiz_core::markers::{Marker, project_markers, zoom_for_radius};
use lugabiz_core::places::PointOfInterest;
use lugabiz_core::proximity::CheckOutcome;
use lugabiz_core::AppConfig;
use lugabiz_types::{DISTANCE_PRESETS, preset_for};

use crate::context::AppContext;

pub async fn show_status(ctx: &AppContext) -> Result<(), String> {
    let position = ctx.pipeline.position();
    let fetch = ctx.pipeline.fetch_state();
    let status = ctx.pipeline.notifier_status();
    let radius = ctx.pipeline.radius();

    match (&position.position, position.loading) {
        (Some(p), _) => println!("Position:      {p}"),
        (None, true) => println!("Position:      locating..."),
        (None, false) => println!("Position:      unknown"),
    }
    if let Some(err) = &position.error {
        println!("  error:       {err}");
    }

    println!("Radius:        {}", describe_radius(radius));
    println!(
        "Places:        {}{}",
        fetch.places().len(),
        if fetch.loading { " (loading)" } else { "" }
    );
    if let Some(err) = &fetch.error {
        println!("  error:       {err}");
    }
    println!("Cached sets:   {}", ctx.cache.len());
    println!(
        "Notifications: {} ({} sent this hour)",
        describe_permission(status.permission_granted, status.permission_denied, status.supported),
        status.notification_count
    );
    println!(
        "Backends:      location={} notifications={}",
        ctx.backends.location, ctx.backends.notifications
    );
    Ok(())
}

pub async fn list_places(ctx: &AppContext) -> Result<(), String> {
    let fetch = ctx.pipeline.fetch_state();
    let places = fetch.places();
    if places.is_empty() {
        println!("No places loaded");
        return Ok(());
    }

    let here = ctx.pipeline.position().position;
    let mut rows: Vec<(&PointOfInterest, Option<f64>)> = places
        .iter()
        .map(|p| (p, distance_from(here, p)))
        .collect();
    rows.sort_by(|a, b| a.1.unwrap_or(f64::MAX).total_cmp(&b.1.unwrap_or(f64::MAX)));

    println!("{:<4} {:<36} {:<14} {:>10}", "", "Name", "Category", "Distance");
    println!("{}", "-".repeat(68));
    for (place, distance) in rows {
        let category = place.category();
        let distance = distance
            .map(|d| format!("{:.0} m", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<36} {:<14} {:>10}",
            category.emoji,
            place.name().unwrap_or("Unnamed"),
            category.label,
            distance
        );
    }
    Ok(())
}

/// Show the marker layer, or preview matches for `query` without applying it
pub async fn show_markers(ctx: &AppContext, query: Option<&str>) -> Result<(), String> {
    let markers = match query {
        Some(query) => project_markers(ctx.pipeline.fetch_state().places(), query),
        None => ctx.pipeline.markers().await,
    };
    if markers.is_empty() {
        println!("No markers");
        return Ok(());
    }

    let matching = markers.iter().filter(|m| m.matches).count();
    println!("{} markers, {} matching", markers.len(), matching);
    for marker in &markers {
        println!("{}", format_marker(marker));
    }
    Ok(())
}

fn format_marker(marker: &Marker) -> String {
    format!(
        "{} {} {:<36} {:>11.6}, {:>11.6}  [{}]",
        if marker.matches { "*" } else { " " },
        marker.emoji,
        marker.label,
        marker.lat,
        marker.lon,
        marker.color
    )
}

pub async fn set_radius(ctx: &AppContext, meters: u32) -> Result<(), String> {
    ctx.pipeline.set_radius(meters).await?;
    println!(
        "Radius set to {} (zoom {})",
        describe_radius(meters),
        zoom_for_radius(meters)
    );
    Ok(())
}

pub fn list_presets(current: u32) {
    for preset in DISTANCE_PRESETS {
        let marker = if preset.meters == current { "*" } else { " " };
        println!(
            "{} {:<8} {:>6} m  zoom {}",
            marker,
            preset.label,
            preset.meters,
            zoom_for_radius(preset.meters)
        );
    }
}

pub async fn set_filter(ctx: &AppContext, query: &str) -> Result<(), String> {
    ctx.pipeline.set_filter(query).await?;
    if query.trim().is_empty() {
        println!("Filter cleared");
    } else {
        println!("Filtering markers by \"{}\"", query.trim());
    }
    Ok(())
}

pub async fn retry_location(ctx: &AppContext) -> Result<(), String> {
    ctx.pipeline.retry_location().await?;
    println!("Retrying location...");
    Ok(())
}

pub async fn show_config(ctx: &AppContext) -> Result<(), String> {
    let config = ctx.config.read().await;
    match AppConfig::config_path() {
        Ok(path) => println!("Config file:   {}", path.display()),
        Err(err) => println!("Config file:   unavailable ({err})"),
    }
    println!("Default radius: {}", describe_radius(config.default_radius_m));
    println!(
        "Location:      {:?} (fixed {}, {}; track file {:?})",
        config.location.backend,
        config.location.fixed_lat,
        config.location.fixed_lon,
        config.location.track_file
    );
    println!(
        "Overpass:      {} (timeout {}s, server timeout {}s, max {} results)",
        config.overpass.endpoint,
        config.overpass.request_timeout_secs,
        config.overpass.server_timeout_secs,
        config.overpass.max_results
    );
    println!(
        "Proximity:     {} m, cooldown {} min, max {}/hour",
        config.proximity.radius_m,
        config.proximity.cooldown_minutes,
        config.proximity.max_notifications_per_hour
    );
    println!(
        "Notifications: enabled={} desktop={} remembered={:?}",
        config.notifications.enabled,
        config.notifications.desktop,
        config.notifications.remembered_permission
    );
    Ok(())
}

pub async fn show_notifications(ctx: &AppContext) -> Result<(), String> {
    let status = ctx.pipeline.notifier_status();
    println!(
        "Permission:    {}",
        describe_permission(status.permission_granted, status.permission_denied, status.supported)
    );
    println!("Sent (1 h):    {}", status.notification_count);

    let last = ctx.pipeline.last_check().await;
    let last = match last {
        None => "not run yet".to_string(),
        Some(CheckOutcome::Notified { place_id, distance_m }) => {
            format!("notified place {place_id} at {distance_m:.0} m")
        }
        Some(other) => format!("{other:?}"),
    };
    println!("Last check:    {last}");
    Ok(())
}

pub async fn exit(ctx: &AppContext) -> Result<(), String> {
    ctx.shutdown().await;
    write!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}

fn describe_radius(meters: u32) -> String {
    match preset_for(meters) {
        Some(preset) => format!("{} m ({})", meters, preset.label),
        None => format!("{} m", meters),
    }
}

fn describe_permission(granted: bool, denied: bool, supported: bool) -> &'static str {
    match (supported, granted, denied) {
        (false, _, _) => "unsupported",
        (true, true, _) => "granted",
        (true, false, true) => "denied",
        (true, false, false) => "not decided",
    }
}

fn distance_from(here: Option<GeoPosition>, place: &PointOfInterest) -> Option<f64> {
    Some(here?.distance_to(&place.position()?))
}
