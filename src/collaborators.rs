//! External collaborators
//!
//! Contracts for device location, entitlement and analytics, with the simple
//! implementations used by the standalone binary.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::models::Coordinate;

/// Reverse/forward geocoding hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    pub neighborhood: Option<String>,
    pub locality: Option<String>,
    pub coordinate: Option<Coordinate>,
}

impl Placemark {
    /// "neighborhood, locality", falling back to whichever part exists, then the name
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.neighborhood.as_deref(), self.locality.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return self.name.clone().filter(|n| !n.is_empty());
        }
        Some(parts.join(", "))
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Option<Coordinate>;
    fn is_authorized(&self) -> bool;
    async fn authorize(&self) -> bool;
    async fn look_up_location(&self, coordinate: Coordinate) -> Vec<Placemark>;
    async fn look_up_location_name(&self, text: &str) -> Vec<Placemark>;
}

/// Gate for the personalized provider and related places
pub trait EntitlementSource: Send + Sync {
    fn has_personalized_access(&self) -> bool;
}

/// Fire-and-forget event sink
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &str, properties: Option<&Map<String, Value>>);
    fn track_error(&self, error: &(dyn std::error::Error + 'static), context: Option<&str>);
}

/// Writes events to the log
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn track(&self, event: &str, properties: Option<&Map<String, Value>>) {
        match properties {
            Some(props) => log::info!("event {} {}", event, Value::Object(props.clone())),
            None => log::info!("event {}", event),
        }
    }

    fn track_error(&self, error: &(dyn std::error::Error + 'static), context: Option<&str>) {
        log::warn!("tracked error: {} ({})", error, context.unwrap_or("no context"));
    }
}

pub struct StaticEntitlement {
    personalized: AtomicBool,
}

impl StaticEntitlement {
    pub fn new(personalized: bool) -> Self {
        Self {
            personalized: AtomicBool::new(personalized),
        }
    }

    pub fn set(&self, personalized: bool) {
        self.personalized.store(personalized, Ordering::SeqCst);
    }
}

impl EntitlementSource for StaticEntitlement {
    fn has_personalized_access(&self) -> bool {
        self.personalized.load(Ordering::SeqCst)
    }
}

/// Location provider pinned to a configurable coordinate, with no geocoder
#[derive(Default)]
pub struct FixedLocationProvider {
    coordinate: RwLock<Option<Coordinate>>,
}

impl FixedLocationProvider {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self {
            coordinate: RwLock::new(coordinate),
        }
    }

    pub fn set(&self, coordinate: Option<Coordinate>) {
        if let Ok(mut slot) = self.coordinate.write() {
            *slot = coordinate;
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    fn current_location(&self) -> Option<Coordinate> {
        self.coordinate.read().ok().and_then(|c| *c)
    }

    fn is_authorized(&self) -> bool {
        self.current_location().is_some()
    }

    async fn authorize(&self) -> bool {
        self.is_authorized()
    }

    async fn look_up_location(&self, _coordinate: Coordinate) -> Vec<Placemark> {
        Vec::new()
    }

    async fn look_up_location_name(&self, _text: &str) -> Vec<Placemark> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placemark_display_name() {
        let full = Placemark {
            neighborhood: Some("Williamsburg".into()),
            locality: Some("Brooklyn".into()),
            ..Default::default()
        };
        assert_eq!(full.display_name().as_deref(), Some("Williamsburg, Brooklyn"));

        let named = Placemark { name: Some("Pier 17".into()), ..Default::default() };
        assert_eq!(named.display_name().as_deref(), Some("Pier 17"));
        assert_eq!(Placemark::default().display_name(), None);
    }
}
