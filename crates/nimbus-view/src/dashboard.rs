//! Dashboard controller: the selected place, its forecast and enrichment.
//!
//! The forecast is primary data. Its failures set a visible error and clear
//! the weather. Air quality and alerts are enrichment, so their failures are
//! logged and otherwise ignored.
//!
//! Loads are split into `begin_*`/`finish_*` halves the same way as the
//! search box, so a response for a superseded place or unit is dropped.

use std::sync::Arc;

use nimbus_core::{AppError, LoadState, RequestTracker, SavedPlace, SharedStore, Ticket, Unit};
use nimbus_weather::{AirQuality, Alert, Coordinates, ForecastBundle, GeoPlace, Theme};
use serde::{Deserialize, Serialize};

use crate::client::WeatherSource;
use crate::current;

const LOAD_FAILED: &str = "Failed to load weather data. Please try again.";
const UNIT_FAILED: &str = "Failed to update units.";
const PERMISSION_DENIED: &str = "Location permission denied. Enter a city instead.";
const LOCATION_UNAVAILABLE: &str = "Unable to get your location. Enter a city instead.";
const FALLBACK_NAME: &str = "Your location";

/// Place the dashboard is showing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub coords: Coordinates,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Short name kept in recent cities once a chosen load lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            name: name.into(),
            coords,
            timezone: None,
            city: None,
        }
    }
}

/// What the device reported when asked for its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceLocation {
    Granted(Coordinates),
    Denied,
    Unavailable,
}

/// Why a load was started; picks the message shown when it fails and
/// whether the place goes into the recent lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
    Chosen,
    Located,
    UnitChange,
}

/// An in-flight forecast load.
#[derive(Debug, Clone)]
pub struct PendingLoad {
    ticket: Ticket,
    location: Location,
    unit: Unit,
    reason: LoadReason,
}

impl PendingLoad {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }
}

/// Last rendered view, persisted so the next start has something to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub location: Location,
    pub unit: Unit,
    pub weather: ForecastBundle,
}

pub struct Dashboard {
    source: Arc<dyn WeatherSource>,
    store: SharedStore,
    unit: Unit,
    location: Option<Location>,
    weather: Option<ForecastBundle>,
    air: Option<AirQuality>,
    alerts: Vec<Alert>,
    error: Option<String>,
    state: LoadState,
    forecast_tracker: RequestTracker,
    enrichment_tracker: RequestTracker,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("unit", &self.unit)
            .field("location", &self.location)
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

impl Dashboard {
    /// New dashboard using the stored unit, or `default_unit` when none is stored.
    pub fn new(source: Arc<dyn WeatherSource>, store: SharedStore, default_unit: Unit) -> Self {
        let unit = store.lock().unit().unwrap_or(default_unit);
        Self {
            source,
            store,
            unit,
            location: None,
            weather: None,
            air: None,
            alerts: Vec::new(),
            error: None,
            state: LoadState::Idle,
            forecast_tracker: RequestTracker::new(),
            enrichment_tracker: RequestTracker::new(),
        }
    }

    /// Show the stored snapshot, if one decodes. Returns whether it did.
    pub fn restore_snapshot(&mut self) -> bool {
        let snapshot = self
            .store
            .lock()
            .last_snapshot()
            .cloned()
            .and_then(|value| serde_json::from_value::<Snapshot>(value).ok());

        match snapshot {
            Some(snapshot) if snapshot.unit == self.unit => {
                tracing::debug!("Restored snapshot for {}", snapshot.location.name);
                self.location = Some(snapshot.location);
                self.weather = Some(snapshot.weather);
                self.state = LoadState::Ready;
                true
            }
            _ => false,
        }
    }

    pub fn begin_load(&mut self, location: Location, reason: LoadReason) -> PendingLoad {
        let ticket = self.forecast_tracker.issue();
        // Enrichment for the previous place is no longer wanted
        self.enrichment_tracker.invalidate();
        self.state = LoadState::Loading(ticket);
        self.error = None;
        PendingLoad {
            ticket,
            location,
            unit: self.unit,
            reason,
        }
    }

    /// Apply a forecast response. Returns false when it was stale.
    pub fn finish_load(
        &mut self,
        pending: PendingLoad,
        result: Result<ForecastBundle, AppError>,
    ) -> bool {
        let PendingLoad {
            ticket,
            location,
            unit,
            reason,
        } = pending;
        let Some(result) = self.forecast_tracker.accept(ticket, result) else {
            return false;
        };
        self.state = self.state.on_done(ticket, result.is_ok());

        match result {
            Ok(bundle) => {
                tracing::info!("Loaded weather for {}", location.name);
                let mut location = location;
                if location.timezone.is_none() && !bundle.timezone.is_empty() {
                    location.timezone = Some(bundle.timezone.clone());
                }
                self.record(&location, unit, &bundle, reason);
                self.location = Some(location);
                self.weather = Some(bundle);
                self.air = None;
                self.alerts.clear();
            }
            Err(e) => {
                tracing::error!("Weather load for {} failed: {}", location.name, e);
                self.weather = None;
                self.air = None;
                self.alerts.clear();
                self.error = Some(
                    match reason {
                        LoadReason::UnitChange => UNIT_FAILED,
                        LoadReason::Chosen | LoadReason::Located => LOAD_FAILED,
                    }
                    .to_string(),
                );
            }
        }
        true
    }

    fn record(&self, location: &Location, unit: Unit, bundle: &ForecastBundle, reason: LoadReason) {
        let mut store = self.store.lock();
        if reason == LoadReason::Chosen {
            store.add_recent_place(SavedPlace {
                name: location.name.clone(),
                latitude: location.coords.latitude,
                longitude: location.coords.longitude,
                timezone: location.timezone.clone(),
            });
            if let Some(city) = &location.city {
                store.add_recent_city(city);
            }
        }

        let snapshot = Snapshot {
            location: location.clone(),
            unit,
            weather: bundle.clone(),
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => store.set_last_snapshot(value),
            Err(e) => tracing::warn!("Could not encode snapshot: {}", e),
        }
    }

    /// Fetch the forecast for `location`, then its enrichment.
    pub async fn load(&mut self, location: Location, reason: LoadReason) -> bool {
        let pending = self.begin_load(location, reason);
        let result = self
            .source
            .forecast(pending.location.coords, pending.unit)
            .await;
        let ok = result.is_ok();
        let applied = self.finish_load(pending, result) && ok;
        if applied {
            self.enrich().await;
        }
        applied
    }

    /// Load a geocoded place. Its short name goes into recent cities.
    pub async fn select_place(&mut self, place: &GeoPlace) -> bool {
        let coords = match place.coordinates() {
            Ok(coords) => coords,
            Err(e) => {
                tracing::warn!("Ignoring place {}: {}", place.name, e);
                self.error = Some(LOAD_FAILED.to_string());
                return false;
            }
        };

        let mut location = Location::new(place.display_name(), coords);
        location.timezone = place.timezone.clone();
        location.city = Some(place.name.clone());
        self.load(location, LoadReason::Chosen).await
    }

    /// Switch units and reload the current place. No-op for the same unit.
    pub async fn set_unit(&mut self, unit: Unit) {
        if unit == self.unit {
            return;
        }
        self.unit = unit;
        self.store.lock().set_unit(unit);

        if let Some(location) = self.location.clone() {
            self.load(location, LoadReason::UnitChange).await;
        }
    }

    /// Load from the device position, falling back to the IP location.
    pub async fn locate(&mut self, device: DeviceLocation) -> bool {
        self.error = None;
        match device {
            DeviceLocation::Granted(coords) => {
                let name = match self.source.reverse_geocode(coords).await {
                    Ok(Some(name)) => name,
                    Ok(None) => self.ip_name().await,
                    Err(e) => {
                        tracing::debug!("Reverse geocode failed: {}", e);
                        self.ip_name().await
                    }
                };
                self.load(Location::new(name, coords), LoadReason::Located)
                    .await
            }
            DeviceLocation::Denied => self.resolve_by_ip(PERMISSION_DENIED).await,
            DeviceLocation::Unavailable => self.resolve_by_ip(LOCATION_UNAVAILABLE).await,
        }
    }

    async fn ip_name(&self) -> String {
        let name = match self.source.ip_location().await {
            Ok(ip) => ip.display_name(),
            Err(e) => {
                tracing::debug!("IP lookup failed: {}", e);
                None
            }
        };
        name.unwrap_or_else(|| FALLBACK_NAME.to_string())
    }

    async fn resolve_by_ip(&mut self, failure: &str) -> bool {
        let ip = match self.source.ip_location().await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!("IP lookup failed: {}", e);
                self.error = Some(failure.to_string());
                return false;
            }
        };
        let Some(coords) = ip.coordinates() else {
            self.error = Some(failure.to_string());
            return false;
        };

        let name = ip
            .display_name()
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        let loaded = self
            .load(Location::new(name, coords), LoadReason::Located)
            .await;
        if !loaded {
            self.error = Some(failure.to_string());
        }
        loaded
    }

    /// Fetch air quality and alerts for the current place. Failures leave
    /// the sections empty.
    pub async fn enrich(&mut self) {
        let Some(coords) = self.location.as_ref().map(|l| l.coords) else {
            return;
        };
        let ticket = self.begin_enrichment();

        let (air, alerts) = tokio::join!(self.source.air(coords), self.source.alerts(coords));
        self.apply_enrichment(ticket, air, alerts);
    }

    pub fn apply_enrichment(
        &mut self,
        ticket: Ticket,
        air: Result<AirQuality, AppError>,
        alerts: Result<Vec<Alert>, AppError>,
    ) {
        if !self.enrichment_tracker.is_current(ticket) {
            tracing::debug!("Dropping stale enrichment");
            return;
        }
        self.air = air
            .map_err(|e| tracing::debug!("Air quality unavailable: {}", e))
            .ok();
        self.alerts = alerts
            .map_err(|e| tracing::debug!("Alerts unavailable: {}", e))
            .unwrap_or_default();
    }

    pub fn begin_enrichment(&self) -> Ticket {
        self.enrichment_tracker.issue()
    }

    /// Drop everything in flight and persist preferences.
    pub fn teardown(&mut self) {
        self.forecast_tracker.invalidate();
        self.enrichment_tracker.invalidate();
        if self.state.is_loading() {
            self.state = LoadState::Idle;
        }
        if let Err(e) = self.store.lock().flush() {
            tracing::warn!("Failed to save preferences: {}", e);
        }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn weather(&self) -> Option<&ForecastBundle> {
        self.weather.as_ref()
    }

    pub fn air(&self) -> Option<&AirQuality> {
        self.air.as_ref()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn theme(&self) -> Theme {
        current::theme(self.weather.as_ref())
    }

    pub fn recent_cities(&self) -> Vec<String> {
        self.store.lock().recent_cities().to_vec()
    }

    pub fn recent_places(&self) -> Vec<SavedPlace> {
        self.store.lock().recent_places().to_vec()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use nimbus_core::{MemoryBackend, NetworkError, PreferenceStore};
    use parking_lot::Mutex;

    struct Unused;

    #[async_trait::async_trait]
    impl WeatherSource for Unused {
        async fn geocode(&self, _: &str, _: u32) -> Result<Vec<GeoPlace>, AppError> {
            Ok(Vec::new())
        }
        async fn forecast(&self, _: Coordinates, _: Unit) -> Result<ForecastBundle, AppError> {
            Err(AppError::Network(NetworkError::Timeout))
        }
        async fn day_detail(
            &self,
            _: Coordinates,
            _: Unit,
            _: Option<&str>,
        ) -> Result<ForecastBundle, AppError> {
            Err(AppError::Network(NetworkError::Timeout))
        }
        async fn reverse_geocode(&self, _: Coordinates) -> Result<Option<String>, AppError> {
            Ok(None)
        }
        async fn air(&self, _: Coordinates) -> Result<AirQuality, AppError> {
            Ok(AirQuality::default())
        }
        async fn alerts(&self, _: Coordinates) -> Result<Vec<Alert>, AppError> {
            Ok(Vec::new())
        }
        async fn ip_location(&self) -> Result<nimbus_weather::IpLocation, AppError> {
            Err(AppError::Network(NetworkError::Timeout))
        }
    }

    fn dashboard() -> Dashboard {
        let store = Arc::new(Mutex::new(PreferenceStore::load(
            Box::new(MemoryBackend::default()),
            5,
        )));
        Dashboard::new(Arc::new(Unused), store, Unit::Us)
    }

    fn bundle(tz: &str) -> ForecastBundle {
        serde_json::from_value(serde_json::json!({ "timezone": tz })).unwrap()
    }

    fn oslo() -> Location {
        Location::new("Oslo, Norway", Coordinates::new(59.9, 10.7).unwrap())
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut dash = dashboard();
        let old = dash.begin_load(oslo(), LoadReason::Chosen);
        let paris = Location::new("Paris, France", Coordinates::new(48.8, 2.3).unwrap());
        let new = dash.begin_load(paris, LoadReason::Chosen);

        assert!(dash.finish_load(new, Ok(bundle("Europe/Paris"))));
        assert!(!dash.finish_load(old, Ok(bundle("Europe/Oslo"))));
        assert_eq!(dash.location().unwrap().name, "Paris, France");
        assert_eq!(dash.state(), LoadState::Ready);
    }

    #[test]
    fn superseded_choice_stays_out_of_recent_cities() {
        let mut dash = dashboard();
        let mut oslo = oslo();
        oslo.city = Some("Oslo".into());
        let old = dash.begin_load(oslo, LoadReason::Chosen);
        let mut bergen = Location::new("Bergen, Norway", Coordinates::new(60.4, 5.3).unwrap());
        bergen.city = Some("Bergen".into());
        let new = dash.begin_load(bergen, LoadReason::Chosen);

        assert!(!dash.finish_load(old, Ok(bundle("Europe/Oslo"))));
        assert!(dash.recent_cities().is_empty());
        assert!(dash.finish_load(new, Ok(bundle("Europe/Oslo"))));
        assert_eq!(dash.recent_cities(), vec!["Bergen".to_string()]);
    }

    #[tokio::test]
    async fn failed_choice_reports_not_loaded() {
        let mut dash = dashboard();
        let place = GeoPlace {
            name: "Oslo".into(),
            admin1: None,
            country: Some("Norway".into()),
            latitude: 59.9,
            longitude: 10.7,
            population: None,
            timezone: None,
        };
        assert!(!dash.select_place(&place).await);
        assert!(dash.recent_cities().is_empty());
    }

    #[test]
    fn failure_clears_weather_and_sets_message() {
        let mut dash = dashboard();
        let first = dash.begin_load(oslo(), LoadReason::Chosen);
        dash.finish_load(first, Ok(bundle("Europe/Oslo")));

        let again = dash.begin_load(oslo(), LoadReason::UnitChange);
        dash.finish_load(again, Err(AppError::Network(NetworkError::Timeout)));
        assert!(dash.weather().is_none());
        assert_eq!(dash.error(), Some("Failed to update units."));
        assert_eq!(dash.state(), LoadState::Failed);
    }

    #[test]
    fn success_records_place_and_snapshot() {
        let mut dash = dashboard();
        let pending = dash.begin_load(oslo(), LoadReason::Chosen);
        dash.finish_load(pending, Ok(bundle("Europe/Oslo")));

        let places = dash.recent_places();
        assert_eq!(places[0].name, "Oslo, Norway");
        assert_eq!(places[0].timezone.as_deref(), Some("Europe/Oslo"));

        let mut fresh = Dashboard::new(Arc::new(Unused), dash.store.clone(), Unit::Us);
        assert!(fresh.restore_snapshot());
        assert_eq!(fresh.location().unwrap().name, "Oslo, Norway");
    }

    #[test]
    fn located_load_skips_recent_places() {
        let mut dash = dashboard();
        let pending = dash.begin_load(oslo(), LoadReason::Located);
        dash.finish_load(pending, Ok(bundle("UTC")));
        assert!(dash.recent_places().is_empty());
        assert!(dash.store.lock().last_snapshot().is_some());
    }

    #[test]
    fn stale_enrichment_is_ignored() {
        let mut dash = dashboard();
        let old = dash.begin_enrichment();
        let _new = dash.begin_enrichment();
        dash.apply_enrichment(old, Ok(AirQuality::default()), Ok(Vec::new()));
        assert!(dash.air().is_none());
    }

    #[test]
    fn enrichment_failures_are_absorbed() {
        let mut dash = dashboard();
        let ticket = dash.begin_enrichment();
        let err = || AppError::Network(NetworkError::Timeout);
        dash.apply_enrichment(ticket, Err(err()), Err(err()));
        assert!(dash.air().is_none());
        assert!(dash.alerts().is_empty());
        assert!(dash.error().is_none());
    }

    #[test]
    fn teardown_drops_in_flight_load() {
        let mut dash = dashboard();
        let pending = dash.begin_load(oslo(), LoadReason::Chosen);
        dash.teardown();
        assert!(!dash.finish_load(pending, Ok(bundle("UTC"))));
        assert!(dash.weather().is_none());
        assert_eq!(dash.state(), LoadState::Idle);
    }
}
