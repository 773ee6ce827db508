//! Reverse geocoding of planner-generated street names.
//!
//! `Geocoder` is an enum over concrete backends, so callers need no
//! trait-object machinery. `GeocodeResolver` runs one fire-and-forget task
//! per lookup and hands results back over a channel in completion order.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::{GeocoderKind, GeocodingConfig};
use crate::error::{Error, Result};
use crate::generator::DirectionsGenerator;
use crate::geo::Point;
use crate::locale::Locale;

/// A postal address as a list of display lines, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub lines: Vec<String>,
}

impl Address {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Address { lines: lines.into_iter().map(Into::into).collect() }
    }

    /// All lines joined with newlines, or `None` for an empty address.
    pub fn string_address(&self) -> Option<String> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.join("\n"))
        }
    }

    /// The first non-blank line. Lines with embedded newlines are split.
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .flat_map(|l| l.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

/// Which end of a leg a place is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegEnd {
    From,
    To,
}

/// The planner object whose name triggered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Step { leg: usize, step: usize },
    Place { leg: usize, end: LegEnd },
}

/// A pending reverse lookup for a generated name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeRequest {
    pub point: Point,
    /// The text the generator put into the directions in place of a real name.
    pub generated_name: String,
    pub subjects: Vec<Subject>,
}

/// A finished lookup. `addresses` is empty when nothing was found or the lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeOutcome {
    pub request: GeocodeRequest,
    pub addresses: Vec<Address>,
}

/// All available geocoding backends.
#[derive(Debug, Clone)]
pub enum Geocoder {
    Nominatim(NominatimGeocoder),
    Fixed(FixedGeocoder),
}

impl Geocoder {
    pub fn from_config(config: &GeocodingConfig, locale: Locale) -> Result<Self> {
        match config.provider {
            GeocoderKind::Nominatim => Ok(Geocoder::Nominatim(NominatimGeocoder::new(
                &config.endpoint,
                &config.user_agent,
                config.timeout_seconds,
                locale,
            )?)),
            GeocoderKind::Fixed => {
                if config.fixed.is_empty() {
                    warn!("fixed geocoder configured without addresses, lookups will find nothing");
                }
                let mut fixed = FixedGeocoder::new(config.match_tolerance_m);
                for entry in &config.fixed {
                    fixed.insert(Point::new(entry.lat, entry.lon), Address::new(entry.lines.iter().cloned()));
                }
                Ok(Geocoder::Fixed(fixed))
            }
        }
    }

    /// Addresses near `point`, best match first.
    pub async fn reverse(&self, point: Point) -> Result<Vec<Address>> {
        match self {
            Geocoder::Nominatim(g) => g.reverse(point).await,
            Geocoder::Fixed(g) => Ok(g.reverse(point)),
        }
    }
}

/// Reverse lookups against a Nominatim-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    pedestrian: Option<String>,
    footway: Option<String>,
    path: Option<String>,
    cycleway: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    postcode: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: &str, user_agent: &str, timeout_seconds: u64, locale: Locale) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Geocode(format!("failed building HTTP client: {e}")))?;

        Ok(NominatimGeocoder {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            language: locale.to_string(),
        })
    }

    pub async fn reverse(&self, point: Point) -> Result<Vec<Address>> {
        let url = format!("{}/reverse", self.endpoint);
        let res = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await
            .map_err(|e| Error::Geocode(format!("reverse request failed: {e}")))?;

        if !res.status().is_success() {
            return Err(Error::Geocode(format!("reverse lookup returned {}", res.status())));
        }

        let body: NominatimReverse = res
            .json()
            .await
            .map_err(|e| Error::Geocode(format!("reverse parse failed: {e}")))?;

        Ok(to_addresses(body))
    }
}

fn to_addresses(body: NominatimReverse) -> Vec<Address> {
    if let Some(err) = body.error {
        debug!("nominatim found nothing: {err}");
        return Vec::new();
    }

    let address = body.address.unwrap_or_default();
    let street = [&address.road, &address.pedestrian, &address.footway, &address.path, &address.cycleway]
        .into_iter()
        .find_map(|s| s.clone());

    let first = match (street, &address.house_number) {
        (Some(street), Some(number)) => Some(format!("{number} {street}")),
        (Some(street), None) => Some(street),
        (None, _) => body
            .display_name
            .as_deref()
            .and_then(|d| d.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };

    let locality = [&address.city, &address.town, &address.village]
        .into_iter()
        .find_map(|s| s.clone());
    let second = match (locality, address.postcode) {
        (Some(locality), Some(postcode)) => Some(format!("{locality} {postcode}")),
        (Some(locality), None) => Some(locality),
        (None, postcode) => postcode,
    };

    let lines: Vec<String> = first.into_iter().chain(second).collect();
    if lines.is_empty() {
        Vec::new()
    } else {
        vec![Address { lines }]
    }
}

/// An in-memory table of known addresses. Answers without network access.
#[derive(Debug, Clone, Default)]
pub struct FixedGeocoder {
    entries: Vec<(Point, Address)>,
    tolerance_m: f64,
}

impl FixedGeocoder {
    pub fn new(tolerance_m: f64) -> Self {
        FixedGeocoder { entries: Vec::new(), tolerance_m }
    }

    pub fn insert(&mut self, point: Point, address: Address) {
        self.entries.push((point, address));
    }

    pub fn reverse(&self, point: Point) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(p, _)| p.matches(&point, self.tolerance_m))
            .map(|(_, a)| a.clone())
            .collect()
    }
}

/// Runs reverse lookups in the background.
#[derive(Debug, Clone)]
pub struct GeocodeResolver {
    geocoder: Arc<Geocoder>,
    timeout: Duration,
}

impl GeocodeResolver {
    pub fn new(geocoder: Geocoder, timeout: Duration) -> Self {
        GeocodeResolver { geocoder: Arc::new(geocoder), timeout }
    }

    /// Start one task per request. Outcomes arrive in completion order and
    /// the channel closes once every task has finished.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(&self, requests: Vec<GeocodeRequest>) -> mpsc::UnboundedReceiver<GeocodeOutcome> {
        let (tx, rx) = mpsc::unbounded_channel();

        for request in requests {
            let tx = tx.clone();
            let geocoder = Arc::clone(&self.geocoder);
            let timeout = self.timeout;

            tokio::spawn(async move {
                let addresses = match tokio::time::timeout(timeout, geocoder.reverse(request.point)).await {
                    Ok(Ok(addresses)) => addresses,
                    Ok(Err(e)) => {
                        warn!("lookup for {:?} failed: {e}", request.generated_name);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("lookup for {:?} timed out", request.generated_name);
                        Vec::new()
                    }
                };
                // The receiver is gone if the directions were discarded.
                let _ = tx.send(GeocodeOutcome { request, addresses });
            });
        }

        rx
    }

    /// Look up every queued name of `generator` and patch results in as they
    /// arrive. Returns the number of entries that changed.
    pub async fn resolve(&self, generator: &mut DirectionsGenerator) -> usize {
        let requests = generator.take_geocode_requests();
        if requests.is_empty() {
            return 0;
        }

        let count = requests.len();
        let mut rx = self.spawn(requests);
        let mut changed = 0;
        while let Some(outcome) = rx.recv().await {
            changed += generator.apply_geocoded(&outcome);
        }

        info!("resolved {count} generated names, {changed} entries updated");
        changed
    }
}
