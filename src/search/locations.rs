// Destination location lists

use crate::collaborators::Placemark;
use crate::models::LocationResult;

/// Current location first, then saved locations, then fetched locations
/// whose name is not already saved, sorted by name
pub fn merged_location_results(
    current: &LocationResult,
    cached: &[LocationResult],
    fetched: &[LocationResult],
) -> Vec<LocationResult> {
    let mut merged = vec![current.clone()];
    merged.extend(cached.iter().filter(|l| !l.is_current_location()).cloned());

    let mut rest: Vec<LocationResult> = fetched
        .iter()
        .filter(|l| !l.is_current_location())
        .filter(|l| {
            let name = l.name.to_lowercase();
            !cached.iter().any(|c| c.name.to_lowercase() == name)
        })
        .cloned()
        .collect();
    rest.sort_by(|a, b| a.name.cmp(&b.name));
    merged.extend(rest);
    merged
}

/// Append geocoded placemarks not already listed by display name.
/// Returns the number added.
pub fn append_placemarks(locations: &mut Vec<LocationResult>, placemarks: &[Placemark]) -> usize {
    let mut added = 0;
    for placemark in placemarks {
        let Some(name) = placemark.display_name() else {
            continue;
        };
        if locations.iter().any(|l| l.name == name) {
            continue;
        }
        locations.push(LocationResult::new(name, placemark.coordinate));
        added += 1;
    }
    added
}

/// Append fetched locations, skipping exact duplicates
pub fn append_locations(locations: &mut Vec<LocationResult>, fetched: Vec<LocationResult>) {
    for location in fetched {
        if !locations.contains(&location) {
            locations.push(location);
        }
    }
}
