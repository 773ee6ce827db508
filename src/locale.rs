//! Phrase catalog for direction text.
//!
//! Each supported locale has a built-in catalog. Individual phrases can be
//! overridden from the `[phrases]` table of the configuration file.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::otp::{AbsoluteDirection, RelativeDirection};

/// Languages with a built-in catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept full tags such as "es-ES" or "en_US".
        let lang = s.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        match lang.as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            _ => Err(Error::Config(format!("unsupported locale: {s}"))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::En => "en",
            Locale::Es => "es",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativePhrases {
    pub depart: String,
    pub hard_left: String,
    pub left: String,
    pub slightly_left: String,
    #[serde(rename = "continue")]
    pub continue_on: String,
    pub slightly_right: String,
    pub right: String,
    pub hard_right: String,
    pub circle_clockwise: String,
    pub circle_counterclockwise: String,
    pub elevator: String,
    pub uturn_left: String,
    pub uturn_right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsolutePhrases {
    pub north: String,
    pub northeast: String,
    pub east: String,
    pub southeast: String,
    pub south: String,
    pub southwest: String,
    pub west: String,
    pub northwest: String,
}

/// Every piece of text the generator puts into a direction.
///
/// `late` and `early` contain a `{minutes}` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrases {
    pub walk_action: String,
    pub bicycle_action: String,
    pub car_action: String,
    pub from: String,
    pub to: String,
    pub heading: String,
    pub turn: String,
    pub connector_street_name: String,
    pub connector_street_name_roundabout: String,
    pub roundabout_exit: String,
    pub roundabout_number: String,
    /// Ordinals for roundabout exits 1 through 10.
    pub ordinals: Vec<String>,
    pub relative: RelativePhrases,
    pub absolute: AbsolutePhrases,
    /// Localized names for the generic street names the planner invents.
    pub street_types: BTreeMap<String, String>,
    pub get_on: String,
    pub get_off: String,
    pub connector_stop_name: String,
    pub stops_in_between: String,
    pub late: String,
    pub early: String,
    pub on_time: String,
    pub hours: String,
    pub minutes: String,
}

/// Generic names the planner gives to unnamed ways.
pub const GENERATED_STREET_NAMES: [&str; 18] = [
    "bike path",
    "open area",
    "path",
    "bridleway",
    "footpath",
    "platform",
    "footbridge",
    "underpass",
    "road",
    "ramp",
    "link",
    "service road",
    "alley",
    "parking aisle",
    "byway",
    "track",
    "sidewalk",
    "steps",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn street_table(localized: [&str; 18]) -> BTreeMap<String, String> {
    GENERATED_STREET_NAMES
        .iter()
        .zip(localized)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Phrases {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::Es => Self::spanish(),
        }
    }

    fn english() -> Self {
        Phrases {
            walk_action: "Walk".into(),
            bicycle_action: "Bike".into(),
            car_action: "Drive".into(),
            from: "from".into(),
            to: "to".into(),
            heading: "heading".into(),
            turn: "Turn".into(),
            connector_street_name: "on".into(),
            connector_street_name_roundabout: "onto".into(),
            roundabout_exit: "exit".into(),
            roundabout_number: "number".into(),
            ordinals: strings(&["1st", "2nd", "3rd", "4th", "5th", "6th", "7th", "8th", "9th", "10th"]),
            relative: RelativePhrases {
                depart: "Depart".into(),
                hard_left: "Hard left".into(),
                left: "left".into(),
                slightly_left: "Slight left".into(),
                continue_on: "Continue".into(),
                slightly_right: "Slight right".into(),
                right: "right".into(),
                hard_right: "Hard right".into(),
                circle_clockwise: "Take the roundabout clockwise".into(),
                circle_counterclockwise: "Take the roundabout counterclockwise".into(),
                elevator: "Take the elevator".into(),
                uturn_left: "Make a U-turn left".into(),
                uturn_right: "Make a U-turn right".into(),
            },
            absolute: AbsolutePhrases {
                north: "north".into(),
                northeast: "northeast".into(),
                east: "east".into(),
                southeast: "southeast".into(),
                south: "south".into(),
                southwest: "southwest".into(),
                west: "west".into(),
                northwest: "northwest".into(),
            },
            street_types: street_table(GENERATED_STREET_NAMES),
            get_on: "Get on".into(),
            get_off: "Get off".into(),
            connector_stop_name: "at".into(),
            stops_in_between: "stops in between".into(),
            late: "{minutes} min late".into(),
            early: "{minutes} min early".into(),
            on_time: "on time".into(),
            hours: "h".into(),
            minutes: "min".into(),
        }
    }

    fn spanish() -> Self {
        Phrases {
            walk_action: "Camine".into(),
            bicycle_action: "Pedalee".into(),
            car_action: "Conduzca".into(),
            from: "desde".into(),
            to: "hasta".into(),
            heading: "en dirección".into(),
            turn: "Gire a la".into(),
            connector_street_name: "por".into(),
            connector_street_name_roundabout: "hacia".into(),
            roundabout_exit: "salida".into(),
            roundabout_number: "número".into(),
            ordinals: strings(&[
                "1ª", "2ª", "3ª", "4ª", "5ª", "6ª", "7ª", "8ª", "9ª", "10ª",
            ]),
            relative: RelativePhrases {
                depart: "Salga".into(),
                hard_left: "Gire completamente a la izquierda".into(),
                left: "izquierda".into(),
                slightly_left: "Gire ligeramente a la izquierda".into(),
                continue_on: "Continúe".into(),
                slightly_right: "Gire ligeramente a la derecha".into(),
                right: "derecha".into(),
                hard_right: "Gire completamente a la derecha".into(),
                circle_clockwise: "Tome la rotonda en sentido horario".into(),
                circle_counterclockwise: "Tome la rotonda en sentido antihorario".into(),
                elevator: "Tome el ascensor".into(),
                uturn_left: "Cambie de sentido por la izquierda".into(),
                uturn_right: "Cambie de sentido por la derecha".into(),
            },
            absolute: AbsolutePhrases {
                north: "norte".into(),
                northeast: "noreste".into(),
                east: "este".into(),
                southeast: "sureste".into(),
                south: "sur".into(),
                southwest: "suroeste".into(),
                west: "oeste".into(),
                northwest: "noroeste".into(),
            },
            street_types: street_table([
                "carril bici",
                "zona abierta",
                "camino",
                "camino de herradura",
                "sendero",
                "andén",
                "pasarela",
                "paso subterráneo",
                "carretera",
                "rampa",
                "enlace",
                "vía de servicio",
                "callejón",
                "pasillo de aparcamiento",
                "camino vecinal",
                "pista",
                "acera",
                "escaleras",
            ]),
            get_on: "Suba al".into(),
            get_off: "Baje del".into(),
            connector_stop_name: "en".into(),
            stops_in_between: "paradas intermedias".into(),
            late: "{minutes} min de retraso".into(),
            early: "{minutes} min de adelanto".into(),
            on_time: "puntual".into(),
            hours: "h".into(),
            minutes: "min".into(),
        }
    }

    /// Apply overrides from a configuration table on top of this catalog.
    ///
    /// Nested tables (`relative`, `absolute`, `street_types`) merge key by key.
    pub fn with_overrides(self, overrides: &toml::Table) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self);
        }
        let mut base = serde_json::to_value(&self)?;
        let patch = serde_json::to_value(overrides)?;
        merge(&mut base, patch, "");
        Ok(serde_json::from_value(base)?)
    }

    /// Ordinal for a roundabout exit number, if it is in 1..=10.
    pub fn ordinal(&self, number: i64) -> Option<&str> {
        if !(1..=10).contains(&number) {
            return None;
        }
        self.ordinals.get((number - 1) as usize).map(String::as_str)
    }

    pub fn relative_direction(&self, dir: RelativeDirection) -> &str {
        let r = &self.relative;
        match dir {
            RelativeDirection::Depart => &r.depart,
            RelativeDirection::HardLeft => &r.hard_left,
            RelativeDirection::Left => &r.left,
            RelativeDirection::SlightlyLeft => &r.slightly_left,
            RelativeDirection::Continue => &r.continue_on,
            RelativeDirection::SlightlyRight => &r.slightly_right,
            RelativeDirection::Right => &r.right,
            RelativeDirection::HardRight => &r.hard_right,
            RelativeDirection::CircleClockwise => &r.circle_clockwise,
            RelativeDirection::CircleCounterclockwise => &r.circle_counterclockwise,
            RelativeDirection::Elevator => &r.elevator,
            RelativeDirection::UturnLeft => &r.uturn_left,
            RelativeDirection::UturnRight => &r.uturn_right,
        }
    }

    pub fn absolute_direction(&self, dir: AbsoluteDirection) -> &str {
        let a = &self.absolute;
        match dir {
            AbsoluteDirection::North => &a.north,
            AbsoluteDirection::Northeast => &a.northeast,
            AbsoluteDirection::East => &a.east,
            AbsoluteDirection::Southeast => &a.southeast,
            AbsoluteDirection::South => &a.south,
            AbsoluteDirection::Southwest => &a.southwest,
            AbsoluteDirection::West => &a.west,
            AbsoluteDirection::Northwest => &a.northwest,
        }
    }

    /// Localized name for a planner-generated street name such as `"path"`.
    pub fn street_type(&self, generated: &str) -> Option<&str> {
        self.street_types.get(generated).map(String::as_str)
    }
}

impl Default for Phrases {
    fn default() -> Self {
        Self::english()
    }
}

fn merge(base: &mut serde_json::Value, patch: serde_json::Value, path: &str) {
    use serde_json::Value;

    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                let key_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                match base_map.get_mut(&key) {
                    Some(slot) => merge(slot, value, &key_path),
                    // Street types may be extended, everything else is fixed.
                    None if path == "street_types" => {
                        base_map.insert(key, value);
                    }
                    None => warn!("ignoring unknown phrase override: {key_path}"),
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
