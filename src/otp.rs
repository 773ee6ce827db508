//! Trip planner response model.
//!
//! Serde structures for the subset of the OpenTripPlanner `plan`
//! response that the directions generator consumes: itineraries, legs,
//! walk steps and places. Parsing is lenient where the planner's
//! vocabulary has changed between server versions.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::geo::Point;

/// Top-level planner answer. Exactly one of `plan` or `error` is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub plan: Option<Plan>,
    pub error: Option<PlannerError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerError {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "optional_millis")]
    pub date: Option<i64>,
    pub from: Place,
    pub to: Place,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default)]
    pub duration: i64,
    #[serde(deserialize_with = "millis")]
    pub start_time: i64,
    #[serde(deserialize_with = "millis")]
    pub end_time: i64,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

/// One segment of a trip: a walk, a ride, a drive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub mode: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
    pub from: Place,
    pub to: Place,
    #[serde(default)]
    pub distance: f64,
    #[serde(deserialize_with = "millis")]
    pub start_time: i64,
    #[serde(deserialize_with = "millis")]
    pub end_time: i64,
    /// Seconds.
    #[serde(default)]
    pub departure_delay: i64,
    /// Seconds.
    #[serde(default)]
    pub arrival_delay: i64,
    #[serde(default, alias = "realtime")]
    pub real_time: bool,
    /// Milliseconds east of UTC.
    #[serde(default)]
    pub agency_time_zone_offset: i64,
    #[serde(default)]
    pub intermediate_stops: Option<Vec<Place>>,
    /// Stops list as sent by older servers.
    #[serde(default)]
    pub stop: Option<Vec<Place>>,
    #[serde(default)]
    pub steps: Option<Vec<WalkStep>>,
}

impl Leg {
    /// The leg's travel mode, or `None` if the server sent one we don't know.
    pub fn traverse_mode(&self) -> Option<TraverseMode> {
        self.mode.parse().ok()
    }

    /// Stops passed between boarding and alighting.
    pub fn stops_in_between(&self) -> &[Place] {
        match (&self.intermediate_stops, &self.stop) {
            (Some(stops), _) if !stops.is_empty() => stops,
            (_, Some(stops)) if !stops.is_empty() => stops,
            _ => &[],
        }
    }
}

/// A named location, possibly a transit stop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub stop_id: Option<AgencyAndId>,
}

impl Place {
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }
}

/// A transit stop identifier scoped by agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStopId", rename_all = "camelCase")]
pub struct AgencyAndId {
    pub agency_id: String,
    pub id: String,
}

impl fmt::Display for AgencyAndId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.agency_id, self.id)
    }
}

/// Newer servers send `"agency:id"`, older ones an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStopId {
    Text(String),
    Object {
        #[serde(rename = "agencyId")]
        agency_id: String,
        id: String,
    },
}

impl From<RawStopId> for AgencyAndId {
    fn from(raw: RawStopId) -> Self {
        match raw {
            RawStopId::Text(text) => match text.split_once(':') {
                Some((agency, id)) => AgencyAndId { agency_id: agency.to_string(), id: id.to_string() },
                None => AgencyAndId { agency_id: String::new(), id: text },
            },
            RawStopId::Object { agency_id, id } => AgencyAndId { agency_id, id },
        }
    }
}

/// One maneuver within a street leg.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkStep {
    #[serde(default)]
    pub distance: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub relative_direction: Option<RelativeDirection>,
    #[serde(default, deserialize_with = "lenient")]
    pub absolute_direction: Option<AbsoluteDirection>,
    #[serde(default)]
    pub street_name: String,
    #[serde(default)]
    pub exit: Option<String>,
    #[serde(default)]
    pub stay_on: Option<bool>,
    #[serde(default)]
    pub bogus_name: Option<bool>,
    pub lat: f64,
    pub lon: f64,
}

impl WalkStep {
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }
}

/// Travel modes known to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraverseMode {
    Walk,
    Bicycle,
    Car,
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Airplane,
    Transit,
    Trainish,
    Busish,
}

impl TraverseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraverseMode::Walk => "WALK",
            TraverseMode::Bicycle => "BICYCLE",
            TraverseMode::Car => "CAR",
            TraverseMode::Tram => "TRAM",
            TraverseMode::Subway => "SUBWAY",
            TraverseMode::Rail => "RAIL",
            TraverseMode::Bus => "BUS",
            TraverseMode::Ferry => "FERRY",
            TraverseMode::CableCar => "CABLE_CAR",
            TraverseMode::Gondola => "GONDOLA",
            TraverseMode::Funicular => "FUNICULAR",
            TraverseMode::Airplane => "AIRPLANE",
            TraverseMode::Transit => "TRANSIT",
            TraverseMode::Trainish => "TRAINISH",
            TraverseMode::Busish => "BUSISH",
        }
    }

    /// Modes that travel on streets without boarding a vehicle of an agency.
    pub fn is_on_street_non_transit(&self) -> bool {
        matches!(self, TraverseMode::Walk | TraverseMode::Bicycle | TraverseMode::Car)
    }

    fn mask(&self) -> u32 {
        match self {
            TraverseMode::Walk => ModeSet::WALK,
            TraverseMode::Bicycle => ModeSet::BICYCLE,
            TraverseMode::Car => ModeSet::CAR,
            TraverseMode::Tram => ModeSet::TRAM,
            TraverseMode::Subway => ModeSet::SUBWAY,
            TraverseMode::Rail => ModeSet::RAIL,
            TraverseMode::Bus => ModeSet::BUS,
            TraverseMode::Ferry => ModeSet::FERRY,
            TraverseMode::CableCar => ModeSet::CABLE_CAR,
            TraverseMode::Gondola => ModeSet::GONDOLA,
            TraverseMode::Funicular => ModeSet::FUNICULAR,
            TraverseMode::Airplane => ModeSet::AIRPLANE,
            TraverseMode::Transit => ModeSet::TRANSIT,
            TraverseMode::Trainish => ModeSet::TRAINISH,
            TraverseMode::Busish => ModeSet::BUSISH,
        }
    }
}

impl fmt::Display for TraverseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraverseMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "WALK" => TraverseMode::Walk,
            "BICYCLE" => TraverseMode::Bicycle,
            "CAR" => TraverseMode::Car,
            "TRAM" => TraverseMode::Tram,
            "SUBWAY" => TraverseMode::Subway,
            "RAIL" => TraverseMode::Rail,
            "BUS" => TraverseMode::Bus,
            "FERRY" => TraverseMode::Ferry,
            "CABLE_CAR" => TraverseMode::CableCar,
            "GONDOLA" => TraverseMode::Gondola,
            "FUNICULAR" => TraverseMode::Funicular,
            "AIRPLANE" => TraverseMode::Airplane,
            "TRANSIT" => TraverseMode::Transit,
            "TRAINISH" => TraverseMode::Trainish,
            "BUSISH" => TraverseMode::Busish,
            other => return Err(format!("unknown traverse mode: {other}")),
        })
    }
}

/// A set of travel modes, stored as a bitmask.
///
/// Group modes (`TRAINISH`, `BUSISH`, `TRANSIT`) expand to their members,
/// and `contains` is true when any member bit is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeSet(u32);

impl ModeSet {
    const WALK: u32 = 1;
    const BICYCLE: u32 = 1 << 1;
    const CAR: u32 = 1 << 2;
    const TRAM: u32 = 1 << 3;
    const SUBWAY: u32 = 1 << 4;
    const RAIL: u32 = 1 << 5;
    const BUS: u32 = 1 << 6;
    const FERRY: u32 = 1 << 7;
    const CABLE_CAR: u32 = 1 << 8;
    const GONDOLA: u32 = 1 << 9;
    const FUNICULAR: u32 = 1 << 10;
    const AIRPLANE: u32 = 1 << 11;
    const TRAINISH: u32 = Self::TRAM | Self::RAIL | Self::SUBWAY | Self::FUNICULAR | Self::GONDOLA;
    const BUSISH: u32 = Self::BUS | Self::CABLE_CAR;
    const TRANSIT: u32 = Self::TRAINISH | Self::BUSISH | Self::FERRY | Self::AIRPLANE;

    pub fn new(modes: &[TraverseMode]) -> Self {
        ModeSet(modes.iter().fold(0, |acc, m| acc | m.mask()))
    }

    pub fn contains(&self, mode: TraverseMode) -> bool {
        self.0 & mode.mask() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<TraverseMode> for ModeSet {
    fn from(mode: TraverseMode) -> Self {
        ModeSet(mode.mask())
    }
}

/// Turn classification relative to the previous heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeDirection {
    Depart,
    HardLeft,
    Left,
    SlightlyLeft,
    Continue,
    SlightlyRight,
    Right,
    HardRight,
    CircleClockwise,
    CircleCounterclockwise,
    Elevator,
    UturnLeft,
    UturnRight,
}

impl RelativeDirection {
    pub fn is_roundabout(&self) -> bool {
        matches!(self, RelativeDirection::CircleClockwise | RelativeDirection::CircleCounterclockwise)
    }
}

impl FromStr for RelativeDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "DEPART" => RelativeDirection::Depart,
            "HARD_LEFT" => RelativeDirection::HardLeft,
            "LEFT" => RelativeDirection::Left,
            "SLIGHTLY_LEFT" => RelativeDirection::SlightlyLeft,
            "CONTINUE" => RelativeDirection::Continue,
            "SLIGHTLY_RIGHT" => RelativeDirection::SlightlyRight,
            "RIGHT" => RelativeDirection::Right,
            "HARD_RIGHT" => RelativeDirection::HardRight,
            "CIRCLE_CLOCKWISE" => RelativeDirection::CircleClockwise,
            "CIRCLE_COUNTERCLOCKWISE" => RelativeDirection::CircleCounterclockwise,
            "ELEVATOR" => RelativeDirection::Elevator,
            "UTURN_LEFT" => RelativeDirection::UturnLeft,
            "UTURN_RIGHT" => RelativeDirection::UturnRight,
            other => return Err(format!("unknown relative direction: {other}")),
        })
    }
}

/// Compass heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsoluteDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl FromStr for AbsoluteDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "NORTH" => AbsoluteDirection::North,
            "NORTHEAST" => AbsoluteDirection::Northeast,
            "EAST" => AbsoluteDirection::East,
            "SOUTHEAST" => AbsoluteDirection::Southeast,
            "SOUTH" => AbsoluteDirection::South,
            "SOUTHWEST" => AbsoluteDirection::Southwest,
            "WEST" => AbsoluteDirection::West,
            "NORTHWEST" => AbsoluteDirection::Northwest,
            other => return Err(format!("unknown absolute direction: {other}")),
        })
    }
}

/// Unknown enum names become `None` instead of failing the whole plan.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMillis {
    Number(i64),
    Text(String),
}

fn parse_millis(raw: RawMillis) -> std::result::Result<i64, String> {
    match raw {
        RawMillis::Number(n) => Ok(n),
        RawMillis::Text(s) => s.trim().parse().map_err(|_| format!("not a timestamp: {s:?}")),
    }
}

fn millis<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    parse_millis(RawMillis::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

fn optional_millis<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawMillis>::deserialize(deserializer)? {
        Some(raw) => parse_millis(raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parse a planner response from any reader.
pub fn parse_response<R: Read>(reader: R) -> Result<Plan> {
    let response: Response = serde_json::from_reader(reader)?;
    if let Some(err) = response.error {
        return Err(Error::Planner { id: err.id, message: err.msg });
    }
    response
        .plan
        .ok_or_else(|| Error::Planner { id: 0, message: "response carries no plan".into() })
}

/// Parse a planner response from a byte slice.
pub fn parse_bytes(data: &[u8]) -> Result<Plan> {
    parse_response(data)
}

/// Parse a bare JSON array of legs, as handed over by the app for one itinerary.
pub fn parse_legs(data: &[u8]) -> Result<Vec<Leg>> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_JSON: &str = r#"{
  "plan": {
    "date": 1331170440000,
    "from": {"name": "Origin", "lat": 28.033389, "lon": -82.521034},
    "to": {"name": "Destination", "lat": 28.064709, "lon": -82.471618},
    "itineraries": [{
      "duration": 2400,
      "startTime": 1331170440000,
      "endTime": "1331172840000",
      "legs": [
        {
          "mode": "WALK",
          "distance": 320.5,
          "startTime": 1331170440000,
          "endTime": 1331170740000,
          "from": {"name": "Origin", "lat": 28.033389, "lon": -82.521034},
          "to": {"name": "Busch Blvd", "lat": 28.0335, "lon": -82.5201,
                 "stopId": {"agencyId": "HART", "id": "4521"}},
          "steps": [
            {"distance": 120.0, "relativeDirection": "DEPART", "absoluteDirection": "EAST",
             "streetName": "path", "lat": 28.033389, "lon": -82.521034},
            {"distance": 200.5, "relativeDirection": "SIDEWAYS", "streetName": "Busch Blvd",
             "lat": 28.0334, "lon": -82.5205, "stayOn": true}
          ]
        },
        {
          "mode": "BUS",
          "route": "6",
          "agencyName": "HART",
          "tripId": "HART:1234",
          "realTime": true,
          "departureDelay": 120,
          "distance": 5000.0,
          "startTime": 1331170800000,
          "endTime": 1331172000000,
          "from": {"name": "Busch Blvd", "lat": 28.0335, "lon": -82.5201, "stopId": "HART:4521"},
          "to": {"name": "University Area", "lat": 28.0640, "lon": -82.4720, "stopId": "HART:9902"},
          "intermediateStops": [
            {"name": "Armenia Av", "lat": 28.04, "lon": -82.50, "stopId": "HART:4600"}
          ]
        }
      ]
    }]
  }
}"#;

    #[test]
    fn parse_plan() {
        let plan = parse_bytes(PLAN_JSON.as_bytes()).unwrap();
        assert_eq!(plan.itineraries.len(), 1);
        assert_eq!(plan.date, Some(1331170440000));

        let itinerary = &plan.itineraries[0];
        assert_eq!(itinerary.end_time, 1331172840000);
        assert_eq!(itinerary.legs.len(), 2);
    }

    #[test]
    fn parse_walk_leg() {
        let plan = parse_bytes(PLAN_JSON.as_bytes()).unwrap();
        let walk = &plan.itineraries[0].legs[0];

        assert_eq!(walk.traverse_mode(), Some(TraverseMode::Walk));
        let steps = walk.steps.as_ref().unwrap();
        assert_eq!(steps[0].relative_direction, Some(RelativeDirection::Depart));
        assert_eq!(steps[0].absolute_direction, Some(AbsoluteDirection::East));
        // Unknown direction names are dropped, not fatal
        assert_eq!(steps[1].relative_direction, None);
        assert_eq!(steps[1].stay_on, Some(true));
    }

    #[test]
    fn parse_stop_id_forms() {
        let plan = parse_bytes(PLAN_JSON.as_bytes()).unwrap();
        let legs = &plan.itineraries[0].legs;

        let object_form = legs[0].to.stop_id.as_ref().unwrap();
        let text_form = legs[1].from.stop_id.as_ref().unwrap();
        assert_eq!(object_form, text_form);
        assert_eq!(text_form.to_string(), "HART 4521");
    }

    #[test]
    fn parse_transit_leg() {
        let plan = parse_bytes(PLAN_JSON.as_bytes()).unwrap();
        let bus = &plan.itineraries[0].legs[1];

        assert_eq!(bus.traverse_mode(), Some(TraverseMode::Bus));
        assert!(bus.real_time);
        assert_eq!(bus.departure_delay, 120);
        assert_eq!(bus.arrival_delay, 0);
        assert_eq!(bus.stops_in_between().len(), 1);
    }

    #[test]
    fn planner_error_is_surfaced() {
        let json = r#"{"error": {"id": 404, "msg": "No trip found."}}"#;
        match parse_bytes(json.as_bytes()) {
            Err(Error::Planner { id, message }) => {
                assert_eq!(id, 404);
                assert_eq!(message, "No trip found.");
            }
            other => panic!("expected planner error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_returns_error() {
        assert!(parse_bytes(b"not json at all").is_err());
    }

    #[test]
    fn bad_timestamp_text_is_rejected() {
        let json = r#"[{"mode": "WALK", "startTime": "soon", "endTime": 0,
            "from": {"lat": 0, "lon": 0}, "to": {"lat": 0, "lon": 0}}]"#;
        assert!(parse_legs(json.as_bytes()).is_err());
    }

    #[test]
    fn unknown_mode_parses_as_none() {
        let json = r#"[{"mode": "HOVERCRAFT", "startTime": 0, "endTime": 0,
            "from": {"lat": 0, "lon": 0}, "to": {"lat": 0, "lon": 0}}]"#;
        let legs = parse_legs(json.as_bytes()).unwrap();
        assert_eq!(legs[0].traverse_mode(), None);
    }

    #[test]
    fn stops_fall_back_to_legacy_list() {
        let json = r#"[{"mode": "RAIL", "startTime": 0, "endTime": 0,
            "from": {"lat": 0, "lon": 0}, "to": {"lat": 0, "lon": 0},
            "intermediateStops": [],
            "stop": [{"name": "A", "lat": 1, "lon": 1}, {"name": "B", "lat": 2, "lon": 2}]}]"#;
        let legs = parse_legs(json.as_bytes()).unwrap();
        assert_eq!(legs[0].stops_in_between().len(), 2);
    }

    #[test]
    fn mode_set_groups() {
        let rail = ModeSet::from(TraverseMode::Rail);
        assert!(rail.contains(TraverseMode::Trainish));
        assert!(!rail.contains(TraverseMode::Busish));

        let transit = ModeSet::from(TraverseMode::Transit);
        assert!(transit.contains(TraverseMode::Bus));
        assert!(transit.contains(TraverseMode::Ferry));
        assert!(!transit.contains(TraverseMode::Walk));

        let mixed = ModeSet::new(&[TraverseMode::Walk, TraverseMode::CableCar]);
        assert!(mixed.contains(TraverseMode::Busish));
        assert!(mixed.contains(TraverseMode::Walk));
        assert!(ModeSet::default().is_empty());
    }

    #[test]
    fn on_street_modes() {
        assert!(TraverseMode::Walk.is_on_street_non_transit());
        assert!(TraverseMode::Car.is_on_street_non_transit());
        assert!(!TraverseMode::Bus.is_on_street_non_transit());
        assert_eq!("CABLE_CAR".parse::<TraverseMode>(), Ok(TraverseMode::CableCar));
    }
}
