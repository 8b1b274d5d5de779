//! Kartmarkörer för personer med koordinater

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::models::Person;

/// Radie i grader för personer som delar exakt samma punkt
pub const SPREAD_RADIUS_DEG: f64 = 0.00005;

/// En markör att rita på kartan
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub person_id: Option<i64>,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_private: bool,
}

/// En markör per person med position. Personer på samma punkt (avrundat till
/// sex decimaler) sprids ut på en liten cirkel så att alla går att klicka på.
pub fn marker_positions(persons: &[Person]) -> Vec<MapMarker> {
    let located: Vec<(&Person, f64, f64)> = persons
        .iter()
        .filter_map(|p| p.location().map(|(lat, lon)| (p, lat, lon)))
        .collect();

    // Antal och första personens position per avrundad punkt
    let mut groups: HashMap<(i64, i64), (usize, f64, f64)> = HashMap::new();
    for (_, lat, lon) in &located {
        groups.entry(coordinate_key(*lat, *lon)).or_insert((0, *lat, *lon)).0 += 1;
    }

    let mut seen: HashMap<(i64, i64), usize> = HashMap::new();
    located
        .into_iter()
        .map(|(person, lat, lon)| {
            let key = coordinate_key(lat, lon);
            let (total, center_lat, center_lon) = groups.get(&key).copied().unwrap_or((1, lat, lon));
            let index = seen.entry(key).or_insert(0);

            let (latitude, longitude) = if total > 1 {
                let angle = 2.0 * PI * (*index as f64) / (total as f64);
                (
                    center_lat + SPREAD_RADIUS_DEG * angle.sin(),
                    center_lon + SPREAD_RADIUS_DEG * angle.cos(),
                )
            } else {
                (lat, lon)
            };
            *index += 1;

            MapMarker {
                person_id: person.id,
                title: person.display_name(),
                latitude,
                longitude,
                is_private: person.is_private,
            }
        })
        .collect()
}

fn coordinate_key(lat: f64, lon: f64) -> (i64, i64) {
    ((lat * 1e6).round() as i64, (lon * 1e6).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(name: &str, lat: f64, lon: f64) -> Person {
        Person {
            latitude: Some(lat),
            longitude: Some(lon),
            ..Person::new(name)
        }
    }

    fn distance(a: &MapMarker, lat: f64, lon: f64) -> f64 {
        ((a.latitude - lat).powi(2) + (a.longitude - lon).powi(2)).sqrt()
    }

    #[test]
    fn test_single_points_stay_put_and_unlocated_are_skipped() {
        let persons = vec![at("Anna", 59.3, 18.0), Person::new("Utan plats"), at("Erik", 59.4, 18.1)];
        let markers = marker_positions(&persons);

        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].latitude, markers[0].longitude), (59.3, 18.0));
        assert_eq!(markers[1].title, "Erik");
    }

    #[test]
    fn test_shared_point_is_spread_on_circle() {
        let persons = vec![
            at("A", 59.3, 18.0),
            at("B", 59.3, 18.0),
            at("C", 59.300_000_01, 18.0),
            at("D", 60.0, 18.0),
        ];
        let markers = marker_positions(&persons);
        assert_eq!(markers.len(), 4);

        for marker in &markers[..3] {
            assert!((distance(marker, 59.3, 18.0) - SPREAD_RADIUS_DEG).abs() < 1e-9);
        }
        for (i, a) in markers[..3].iter().enumerate() {
            for b in &markers[i + 1..3] {
                assert!(distance(a, b.latitude, b.longitude) > 1e-6);
            }
        }
        assert_eq!((markers[3].latitude, markers[3].longitude), (60.0, 18.0));
    }

    #[test]
    fn test_private_persons_are_kept() {
        let mut person = at("Anna", 59.3, 18.0);
        person.is_private = true;
        assert!(marker_positions(&[person])[0].is_private);
    }
}
