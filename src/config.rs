//! Configuration loading with env-var overrides.
//!
//! Every section of the TOML file is optional. After parsing,
//! `OTP_DIRECTIONS_LOCALE` and `OTP_DIRECTIONS_GEOCODER_URL` override the
//! locale and the geocoder endpoint.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::format::{Clock, Formatter, Units};
use crate::locale::{Locale, Phrases};

pub const ENV_LOCALE: &str = "OTP_DIRECTIONS_LOCALE";
pub const ENV_GEOCODER_URL: &str = "OTP_DIRECTIONS_GEOCODER_URL";

/// Reverse geocoder backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderKind {
    #[default]
    Nominatim,
    /// In-memory table, no network.
    Fixed,
}

/// One known address for the `fixed` geocoder, from `[[geocoding.fixed]]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixedAddress {
    pub lat: f64,
    pub lon: f64,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub locale: Locale,
    pub units: Units,
    pub clock: Clock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingConfig {
    /// When false, generated street names are localized but never looked up.
    pub enabled: bool,
    pub provider: GeocoderKind,
    /// Base URL of the reverse geocoding service.
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// How close (in meters) a direction must be to a lookup's coordinates
    /// for the result to be applied to it. Zero means exact match.
    pub match_tolerance_m: f64,
    /// Address table served by the `fixed` provider.
    pub fixed: Vec<FixedAddress>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub display: DisplayConfig,
    pub geocoding: GeocodingConfig,
    /// Raw `[phrases]` overrides, applied on top of the locale's catalog.
    pub phrases: toml::Table,
}

/// Everything the generator needs to produce text.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub phrases: Phrases,
    pub formatter: Formatter,
    pub match_tolerance_m: f64,
    pub geocoding_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            phrases: Phrases::default(),
            formatter: Formatter::default(),
            match_tolerance_m: default_tolerance(),
            geocoding_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let geocoding = RawGeocoding::default();
        Config {
            display: DisplayConfig {
                locale: Locale::default(),
                units: Units::default(),
                clock: Clock::default(),
            },
            geocoding: GeocodingConfig {
                enabled: geocoding.enabled,
                provider: geocoding.provider,
                endpoint: geocoding.endpoint,
                timeout_seconds: geocoding.timeout_seconds,
                user_agent: geocoding.user_agent,
                match_tolerance_m: geocoding.match_tolerance_m,
                fixed: geocoding.fixed,
            },
            phrases: toml::Table::new(),
        }
    }
}

impl Config {
    /// Parse a TOML document. Env overrides are not applied.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Read a TOML file and apply env overrides from the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides using `lookup` to read variables.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(locale) = lookup(ENV_LOCALE).filter(|v| !v.trim().is_empty()) {
            self.display.locale = locale.trim().parse()?;
        }
        if let Some(url) = lookup(ENV_GEOCODER_URL).filter(|v| !v.trim().is_empty()) {
            self.geocoding.endpoint = url.trim().to_string();
        }
        Ok(())
    }

    /// Resolve the phrase catalog and formatter.
    pub fn settings(&self) -> Result<Settings> {
        let phrases = Phrases::for_locale(self.display.locale).with_overrides(&self.phrases)?;
        Ok(Settings {
            phrases,
            formatter: Formatter::new(self.display.units, self.display.clock),
            match_tolerance_m: self.geocoding.match_tolerance_m,
            geocoding_enabled: self.geocoding.enabled,
        })
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let locale = raw.display.locale.parse()?;
        if raw.geocoding.match_tolerance_m < 0.0 {
            return Err(Error::Config(format!(
                "match_tolerance_m must not be negative, got {}",
                raw.geocoding.match_tolerance_m
            )));
        }
        if raw.geocoding.timeout_seconds == 0 {
            return Err(Error::Config("timeout_seconds must be positive".into()));
        }
        if let Some(entry) = raw.geocoding.fixed.iter().find(|e| e.lines.iter().all(|l| l.trim().is_empty())) {
            return Err(Error::Config(format!(
                "fixed address at {}, {} has no lines",
                entry.lat, entry.lon
            )));
        }

        Ok(Config {
            display: DisplayConfig {
                locale,
                units: raw.display.units,
                clock: raw.display.clock,
            },
            geocoding: GeocodingConfig {
                enabled: raw.geocoding.enabled,
                provider: raw.geocoding.provider,
                endpoint: raw.geocoding.endpoint,
                timeout_seconds: raw.geocoding.timeout_seconds,
                user_agent: raw.geocoding.user_agent,
                match_tolerance_m: raw.geocoding.match_tolerance_m,
                fixed: raw.geocoding.fixed,
            },
            phrases: raw.phrases,
        })
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    display: RawDisplay,
    #[serde(default)]
    geocoding: RawGeocoding,
    #[serde(default)]
    phrases: toml::Table,
}

#[derive(Deserialize)]
struct RawDisplay {
    #[serde(default = "default_locale")]
    locale: String,
    #[serde(default)]
    units: Units,
    #[serde(default)]
    clock: Clock,
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self { locale: default_locale(), units: Units::default(), clock: Clock::default() }
    }
}

#[derive(Deserialize)]
struct RawGeocoding {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    provider: GeocoderKind,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_timeout")]
    timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default = "default_tolerance")]
    match_tolerance_m: f64,
    #[serde(default)]
    fixed: Vec<FixedAddress>,
}

impl Default for RawGeocoding {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            provider: GeocoderKind::default(),
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            match_tolerance_m: default_tolerance(),
            fixed: Vec::new(),
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("otp-directions/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_tolerance() -> f64 {
    0.5
}
