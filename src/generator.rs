//! Step-by-step directions from trip legs.
//!
//! Walks the legs of one itinerary in order and produces display records:
//! one direction per street leg (with a sub-direction per walk step) and a
//! get-on/get-off pair per transit leg. Street names the planner made up are
//! localized and queued for reverse geocoding. When a lookup comes back,
//! `apply_geocoded` patches the friendlier name into the entries that were
//! already built.

use log::{debug, warn};
use serde::Serialize;

use crate::config::Settings;
use crate::direction::{replace_word, Direction, ModeMarker, Name, TextBuilder};
use crate::format::duration_between;
use crate::geo::Point;
use crate::geocode::{GeocodeOutcome, GeocodeRequest, LegEnd, Subject};
use crate::icon::{mode_icon, relative_direction_icon, Icon};
use crate::locale::Phrases;
use crate::otp::{Leg, Place, RelativeDirection, TraverseMode, WalkStep};

/// Everything the list UI needs for one itinerary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub directions: Vec<Direction>,
    pub total_distance: f64,
    pub total_distance_text: String,
    /// Seconds.
    pub total_time: f64,
    pub total_time_text: String,
    pub geocode_requests: Vec<GeocodeRequest>,
}

/// Builds the directions for one itinerary and keeps them in sync with
/// reverse geocoding results.
#[derive(Debug)]
pub struct DirectionsGenerator {
    /// Source legs. Generated names are renamed in place once resolved.
    legs: Vec<Leg>,
    directions: Vec<Direction>,
    /// Set only in marker mode, where directions stay empty.
    markers: Option<Vec<ModeMarker>>,
    total_distance: f64,
    settings: Settings,
    /// Lookups not yet handed out by `take_geocode_requests`.
    pending: Vec<GeocodeRequest>,
}

impl DirectionsGenerator {
    /// Convert `legs` into directions right away.
    pub fn new(legs: Vec<Leg>, settings: Settings) -> Self {
        let mut generator = DirectionsGenerator {
            legs,
            directions: Vec::new(),
            markers: None,
            total_distance: 0.0,
            settings,
            pending: Vec::new(),
        };
        generator.convert_to_direction_list();
        debug!(
            "generated {} directions from {} legs, {} names queued for lookup",
            generator.directions.len(),
            generator.legs.len(),
            generator.pending.len()
        );
        generator
    }

    /// A generator that only keeps map marker titles up to date.
    pub fn with_markers(markers: Vec<ModeMarker>, settings: Settings) -> Self {
        DirectionsGenerator {
            legs: Vec::new(),
            directions: Vec::new(),
            markers: Some(markers),
            total_distance: 0.0,
            settings,
            pending: Vec::new(),
        }
    }

    /// Top-level directions in list order.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Replace the list, e.g. with one restored from saved state.
    pub fn set_directions(&mut self, directions: Vec<Direction>) {
        self.directions = directions;
    }

    pub fn add_direction(&mut self, direction: Direction) {
        self.directions.push(direction);
    }

    /// The legs, with any names resolved so far.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Marker titles, in marker mode only.
    pub fn markers(&self) -> Option<&[ModeMarker]> {
        self.markers.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Meters covered by all converted legs.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Seconds from the first leg's departure to the last leg's arrival.
    pub fn total_time_traveled(&self) -> f64 {
        match (self.legs.first(), self.legs.last()) {
            (Some(first), Some(last)) => duration_between(first.start_time, last.end_time),
            _ => 0.0,
        }
    }

    /// Lookups queued since the last call.
    pub fn take_geocode_requests(&mut self) -> Vec<GeocodeRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Snapshot of directions, totals and lookups still queued.
    pub fn summary(&self) -> Summary {
        let formatter = &self.settings.formatter;
        let total_time = self.total_time_traveled();
        Summary {
            directions: self.directions.clone(),
            total_distance: self.total_distance,
            total_distance_text: formatter.distance(self.total_distance),
            total_time,
            total_time_text: formatter.duration(&self.settings.phrases, total_time),
            geocode_requests: self.pending.clone(),
        }
    }

    /// Patch a finished lookup into the entries built from it.
    ///
    /// Returns how many directions (or marker titles) changed, so the caller
    /// knows whether the list needs redrawing.
    pub fn apply_geocoded(&mut self, outcome: &GeocodeOutcome) -> usize {
        let Some(new_name) = outcome.addresses.first().and_then(|a| a.first_line()) else {
            return 0;
        };
        let request = &outcome.request;
        let tolerance = self.settings.match_tolerance_m;

        if let Some(markers) = &mut self.markers {
            let mut changed = 0;
            for marker in markers.iter_mut() {
                if !marker.trip_info.destination.matches(&request.point, tolerance) {
                    continue;
                }
                if let Some(title) = replace_word(&marker.title, &request.generated_name, new_name) {
                    marker.title = title;
                    changed += 1;
                }
            }
            return changed;
        }

        let mut changed = 0;
        for direction in &mut self.directions {
            changed += patch_direction(direction, request, new_name, tolerance);
            if let Some(subs) = &mut direction.sub_directions {
                for sub in subs {
                    changed += patch_direction(sub, request, new_name, tolerance);
                }
            }
        }

        for subject in &request.subjects {
            self.rename_subject(*subject, new_name);
        }

        debug!("replaced {:?} with {new_name:?} in {changed} entries", request.generated_name);
        changed
    }

    fn rename_subject(&mut self, subject: Subject, new_name: &str) {
        match subject {
            Subject::Step { leg, step } => {
                if let Some(step) = self
                    .legs
                    .get_mut(leg)
                    .and_then(|l| l.steps.as_mut())
                    .and_then(|steps| steps.get_mut(step))
                {
                    step.street_name = new_name.to_string();
                }
            }
            Subject::Place { leg, end } => {
                if let Some(leg) = self.legs.get_mut(leg) {
                    let place = match end {
                        LegEnd::From => &mut leg.from,
                        LegEnd::To => &mut leg.to,
                    };
                    place.name = Some(new_name.to_string());
                }
            }
        }
    }

    fn convert_to_direction_list(&mut self) {
        let mut builder = Builder {
            settings: &self.settings,
            pending: &mut self.pending,
            total_distance: 0.0,
        };
        let mut directions = Vec::with_capacity(self.legs.len());
        let mut index = 0;

        for (leg_index, leg) in self.legs.iter().enumerate() {
            let Some(mode) = leg.traverse_mode() else {
                warn!("skipping leg {leg_index} with unknown mode {:?}", leg.mode);
                continue;
            };

            index += 1;
            builder.total_distance += leg.distance;

            if mode.is_on_street_non_transit() {
                let mut direction = builder.street_direction(leg_index, leg, mode);
                direction.direction_index = index;
                directions.push(direction);
            } else {
                let mut get_on = builder.transit_direction(leg, mode, Stage::GetOn);
                get_on.direction_index = index;
                directions.push(get_on);

                index += 1;
                let mut get_off = builder.transit_direction(leg, mode, Stage::GetOff);
                get_off.direction_index = index;
                directions.push(get_off);
            }
        }

        self.total_distance = builder.total_distance;
        self.directions.extend(directions);
    }
}

fn patch_direction(direction: &mut Direction, request: &GeocodeRequest, new_name: &str, tolerance: f64) -> usize {
    usize::from(direction.replace_generated(&request.point, tolerance, &request.generated_name, new_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    GetOn,
    GetOff,
}

/// Conversion state borrowed from the generator for the duration of one pass.
struct Builder<'a> {
    settings: &'a Settings,
    pending: &'a mut Vec<GeocodeRequest>,
    /// Distance of all legs so far, including the current one.
    total_distance: f64,
}

impl<'a> Builder<'a> {
    fn street_direction(&mut self, leg_index: usize, leg: &Leg, mode: TraverseMode) -> Direction {
        let settings = self.settings;
        let p = &settings.phrases;
        let action = match mode {
            TraverseMode::Bicycle => &p.bicycle_action,
            TraverseMode::Car => &p.car_action,
            _ => &p.walk_action,
        };

        let mut text = TextBuilder::default();
        text.word(action);
        if let Some(name) = self.place_name(&leg.from, Subject::Place { leg: leg_index, end: LegEnd::From }) {
            text.word(&p.from).name(name);
        }
        if let Some(name) = self.place_name(&leg.to, Subject::Place { leg: leg_index, end: LegEnd::To }) {
            text.word(&p.to).name(name);
        }
        if let Some(stop_id) = &leg.to.stop_id {
            text.word(&format!("({stop_id})"));
        }
        text.line(&format!("[{}]", settings.formatter.distance(self.total_distance)));
        let (direction_text, generated_names) = text.finish();

        let mut direction = Direction {
            icon: Some(mode_icon(mode.into())),
            direction_text: Some(direction_text),
            origin: leg.from.point(),
            destination: leg.to.point(),
            generated_names,
            ..Default::default()
        };

        if let Some(steps) = &leg.steps {
            let subs = steps
                .iter()
                .enumerate()
                .map(|(step_index, step)| {
                    self.step_direction(step, action, Subject::Step { leg: leg_index, step: step_index })
                })
                .collect();
            direction.sub_directions = Some(subs);
        }

        direction
    }

    fn step_direction(&mut self, step: &WalkStep, action: &str, subject: Subject) -> Direction {
        let settings = self.settings;
        let p = &settings.phrases;
        let mut icon = Icon::Clear;
        let mut connector = &p.connector_street_name;
        let mut text = TextBuilder::default();

        match step.relative_direction {
            None => {
                text.word(action).word(&p.heading);
                if let Some(heading) = step.absolute_direction {
                    text.word(p.absolute_direction(heading));
                }
            }
            Some(relative) => {
                icon = relative_direction_icon(relative);
                if matches!(relative, RelativeDirection::Left | RelativeDirection::Right) {
                    text.word(&p.turn);
                }
                text.word(p.relative_direction(relative));

                if relative.is_roundabout() {
                    if let Some(exit) = &step.exit {
                        text.word(&exit_text(p, exit)).word(&p.roundabout_exit);
                        connector = &p.connector_street_name_roundabout;
                    }
                }
            }
        }

        let street = Some(step.street_name.as_str()).filter(|s| !s.is_empty());
        if let Some(name) = self.street_name(street, step.point(), subject) {
            text.word(connector).name(name);
        }
        text.line(&format!("[{}]", settings.formatter.distance(step.distance)));
        let (direction_text, generated_names) = text.finish();

        Direction {
            icon: Some(icon),
            direction_text: Some(direction_text),
            origin: step.point(),
            destination: step.point(),
            generated_names,
            ..Default::default()
        }
    }

    fn transit_direction(&mut self, leg: &Leg, mode: TraverseMode, stage: Stage) -> Direction {
        let settings = self.settings;
        let p = &settings.phrases;
        let formatter = &settings.formatter;

        let (action, place, icon, actual, delay) = match stage {
            Stage::GetOn => (&p.get_on, &leg.from, Some(mode_icon(mode.into())), leg.start_time, leg.departure_delay),
            Stage::GetOff => (&p.get_off, &leg.to, None, leg.end_time, leg.arrival_delay),
        };

        let mut direction = Direction {
            icon,
            is_transit: true,
            real_time_info: leg.real_time,
            origin: place.point(),
            destination: place.point(),
            ..Default::default()
        };

        let mut place_text = format!("{} {}", p.connector_stop_name, place.name.as_deref().unwrap_or_default());
        if let Some(stop_id) = &place.stop_id {
            place_text.push_str(&format!(" ({stop_id})"));
        }

        // Only boarding lists the stops passed on the way.
        if stage == Stage::GetOn {
            let stops = leg.stops_in_between();
            let subs = stops
                .iter()
                .enumerate()
                .map(|(i, stop)| {
                    let mut text = format!("{}. {}", i + 1, stop.name.as_deref().unwrap_or_default());
                    if let Some(stop_id) = &stop.stop_id {
                        text.push_str(&format!(" ({stop_id})"));
                    }
                    Direction {
                        icon,
                        direction_text: Some(text),
                        origin: stop.point(),
                        destination: stop.point(),
                        ..Default::default()
                    }
                })
                .collect();
            direction.sub_directions = Some(subs);
            place_text.push_str(&format!("\n{} {}", stops.len(), p.stops_in_between));
        }

        direction.place = Some(place_text);
        direction.service = Some(
            [action.as_str(), leg.agency_name.as_deref().unwrap_or_default(), mode.as_str(), leg.route.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
        );

        let scheduled = actual.saturating_sub(delay.saturating_mul(1000));
        let offset = leg.agency_time_zone_offset;
        if leg.real_time {
            direction.new_time = Some(formatter.time_updated(p, offset, scheduled, actual));
        }
        direction.old_time = Some(formatter.time(offset, scheduled));

        direction
    }

    fn place_name(&mut self, place: &Place, subject: Subject) -> Option<Name> {
        self.street_name(place.name.as_deref(), place.point(), subject)
    }

    /// Localize a planner street name.
    ///
    /// Generic names become the localized street type and `osm:node` ids
    /// become coordinates; both are queued for reverse geocoding. Real names
    /// pass through untouched.
    fn street_name(&mut self, name: Option<&str>, point: Point, subject: Subject) -> Option<Name> {
        let name = name?;
        let generated = if let Some(street_type) = self.settings.phrases.street_type(name) {
            street_type.to_string()
        } else if name.starts_with("osm:node") {
            point.to_short_string()
        } else {
            return Some(Name::Real(name.to_string()));
        };

        if self.settings.geocoding_enabled {
            self.queue_lookup(point, &generated, subject);
        }
        Some(Name::Generated { text: generated, point })
    }

    fn queue_lookup(&mut self, point: Point, generated: &str, subject: Subject) {
        match self
            .pending
            .iter_mut()
            .find(|r| r.point == point && r.generated_name == generated)
        {
            Some(request) => request.subjects.push(subject),
            None => self.pending.push(GeocodeRequest {
                point,
                generated_name: generated.to_string(),
                subjects: vec![subject],
            }),
        }
    }
}

/// Roundabout exit text: an ordinal for 1..=10, "number n" for other
/// integers, the raw text otherwise.
fn exit_text(p: &Phrases, exit: &str) -> String {
    match exit.trim().parse::<i64>() {
        Ok(number) => match p.ordinal(number) {
            Some(ordinal) => ordinal.to_string(),
            None => format!("{} {number}", p.roundabout_number),
        },
        Err(_) => exit.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::direction::TripInfo;
    use crate::geocode::Address;
    use crate::otp::parse_legs;

    // Evening of 2012-03-07 in Tampa (UTC-5).
    const LEGS_JSON: &str = r#"[
  {
    "mode": "WALK",
    "distance": 320.0,
    "startTime": 1331170440000,
    "endTime": 1331170740000,
    "from": {"name": "path", "lat": 28.033389, "lon": -82.521034},
    "to": {"name": "Busch Blvd", "lat": 28.0335, "lon": -82.5201,
           "stopId": {"agencyId": "HART", "id": "4521"}},
    "steps": [
      {"distance": 120.0, "absoluteDirection": "EAST", "streetName": "path",
       "lat": 28.033389, "lon": -82.521034},
      {"distance": 150.0, "relativeDirection": "LEFT", "streetName": "Busch Blvd",
       "lat": 28.0334, "lon": -82.5205},
      {"distance": 50.0, "relativeDirection": "CIRCLE_CLOCKWISE", "exit": "2",
       "streetName": "osm:node:1234", "lat": 28.03352, "lon": -82.52018}
    ]
  },
  {
    "mode": "BUS",
    "route": "6",
    "agencyName": "HART",
    "tripId": "HART:1234",
    "realTime": true,
    "departureDelay": 120,
    "arrivalDelay": -60,
    "agencyTimeZoneOffset": -18000000,
    "distance": 5000.0,
    "startTime": 1331170800000,
    "endTime": 1331172000000,
    "from": {"name": "Busch Blvd", "lat": 28.0335, "lon": -82.5201, "stopId": "HART:4521"},
    "to": {"name": "University Area", "lat": 28.0640, "lon": -82.4720, "stopId": "HART:9902"},
    "intermediateStops": [
      {"name": "Armenia Av", "lat": 28.04, "lon": -82.50, "stopId": "HART:4600"},
      {"name": "Florida Av", "lat": 28.05, "lon": -82.49, "stopId": "HART:4700"}
    ]
  },
  {
    "mode": "BICYCLE",
    "distance": 800.0,
    "startTime": 1331172000000,
    "endTime": 1331172300000,
    "from": {"name": "University Area", "lat": 28.0640, "lon": -82.4720},
    "to": {"name": "footpath", "lat": 28.0647, "lon": -82.4716}
  }
]"#;

    fn generator() -> DirectionsGenerator {
        let legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        DirectionsGenerator::new(legs, Settings::default())
    }

    fn text(direction: &Direction) -> &str {
        direction.direction_text.as_deref().unwrap()
    }

    #[test]
    fn walk_leg_main_direction() {
        let g = generator();
        let walk = &g.directions()[0];

        assert_eq!(walk.direction_index, 1);
        assert_eq!(walk.icon, Some(Icon::ModeWalk));
        assert_eq!(text(walk), "Walk from path to Busch Blvd (HART 4521)\n[320 m]");
        assert_eq!(walk.origin, Point::new(28.033389, -82.521034));
        assert_eq!(walk.destination, Point::new(28.0335, -82.5201));
        assert!(!walk.is_transit);
    }

    #[test]
    fn walk_steps_become_sub_directions() {
        let g = generator();
        let steps = g.directions()[0].sub_directions.as_ref().unwrap();
        assert_eq!(steps.len(), 3);

        assert_eq!(text(&steps[0]), "Walk heading east on path\n[120 m]");
        assert_eq!(steps[0].icon, Some(Icon::Clear));

        assert_eq!(text(&steps[1]), "Turn left on Busch Blvd\n[150 m]");
        assert_eq!(steps[1].icon, Some(Icon::Left));
        assert_eq!(steps[1].origin, steps[1].destination);
    }

    #[test]
    fn roundabout_step_uses_ordinal_and_coordinates() {
        let g = generator();
        let steps = g.directions()[0].sub_directions.as_ref().unwrap();

        assert_eq!(
            text(&steps[2]),
            "Take the roundabout clockwise 2nd exit onto 28.0335, -82.5202\n[50 m]"
        );
        assert_eq!(steps[2].icon, Some(Icon::CircleClockwise));
    }

    #[test]
    fn transit_leg_produces_get_on_and_get_off() {
        let g = generator();
        let get_on = &g.directions()[1];
        let get_off = &g.directions()[2];

        assert_eq!(get_on.direction_index, 2);
        assert_eq!(get_off.direction_index, 3);
        assert!(get_on.is_transit && get_off.is_transit);
        assert!(get_on.real_time_info);

        assert_eq!(get_on.service.as_deref(), Some("Get on HART BUS 6"));
        assert_eq!(get_on.place.as_deref(), Some("at Busch Blvd (HART 4521)\n2 stops in between"));
        assert_eq!(get_on.icon, Some(Icon::ModeBus));

        assert_eq!(get_off.service.as_deref(), Some("Get off HART BUS 6"));
        assert_eq!(get_off.place.as_deref(), Some("at University Area (HART 9902)"));
        assert_eq!(get_off.icon, None);
        assert!(get_off.sub_directions.is_none());
    }

    #[test]
    fn transit_times_in_agency_zone() {
        let g = generator();
        let get_on = &g.directions()[1];
        let get_off = &g.directions()[2];

        // Departs 20:40 local, two minutes behind a 20:38 schedule
        assert_eq!(get_on.old_time.as_deref(), Some("20:38"));
        assert_eq!(get_on.new_time.as_deref(), Some("20:40 (2 min late)"));
        // Arrives 21:00 local, a minute ahead of 21:01
        assert_eq!(get_off.old_time.as_deref(), Some("21:01"));
        assert_eq!(get_off.new_time.as_deref(), Some("21:00 (1 min early)"));
    }

    #[test]
    fn stops_in_between_are_listed() {
        let g = generator();
        let stops = g.directions()[1].sub_directions.as_ref().unwrap();

        assert_eq!(stops.len(), 2);
        assert_eq!(text(&stops[0]), "1. Armenia Av (HART 4600)");
        assert_eq!(text(&stops[1]), "2. Florida Av (HART 4700)");
        assert_eq!(stops[0].icon, Some(Icon::ModeBus));
    }

    #[test]
    fn scheduled_leg_has_no_new_time() {
        let mut legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        legs[1].real_time = false;
        let g = DirectionsGenerator::new(legs, Settings::default());

        assert!(g.directions()[1].new_time.is_none());
        assert_eq!(g.directions()[1].old_time.as_deref(), Some("20:38"));
    }

    #[test]
    fn bicycle_leg_shows_running_distance() {
        let g = generator();
        let bike = &g.directions()[3];

        assert_eq!(bike.direction_index, 4);
        assert_eq!(bike.icon, Some(Icon::ModeBike));
        assert_eq!(text(bike), "Bike from University Area to footpath\n[6.1 km]");
        assert!(bike.sub_directions.is_none());
    }

    #[test]
    fn totals() {
        let g = generator();
        assert_eq!(g.total_distance(), 6120.0);
        assert_eq!(g.total_time_traveled(), 1860.0);

        let summary = g.summary();
        assert_eq!(summary.total_distance_text, "6.1 km");
        assert_eq!(summary.total_time_text, "31 min");
        assert_eq!(summary.directions.len(), 4);
    }

    #[test]
    fn empty_legs() {
        let g = DirectionsGenerator::new(Vec::new(), Settings::default());
        assert!(g.directions().is_empty());
        assert_eq!(g.total_time_traveled(), 0.0);
        assert_eq!(g.total_distance(), 0.0);
    }

    #[test]
    fn unknown_mode_leg_is_skipped() {
        let mut legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        legs[0].mode = "HOVERCRAFT".into();
        let g = DirectionsGenerator::new(legs, Settings::default());

        assert_eq!(g.directions().len(), 3);
        assert_eq!(g.directions()[0].direction_index, 1);
        assert_eq!(g.total_distance(), 5800.0);
    }

    #[test]
    fn generated_names_are_queued_once_per_location() {
        let mut g = generator();
        let requests = g.take_geocode_requests();

        // "path" appears at the leg origin and on the first step, same coordinates
        let path = requests.iter().find(|r| r.generated_name == "path").unwrap();
        assert_eq!(path.subjects, vec![
            Subject::Place { leg: 0, end: LegEnd::From },
            Subject::Step { leg: 0, step: 0 },
        ]);

        assert!(requests.iter().any(|r| r.generated_name == "28.0335, -82.5202"));
        assert!(requests.iter().any(|r| r.generated_name == "footpath"));
        assert_eq!(requests.len(), 3);
        assert!(g.take_geocode_requests().is_empty());
    }

    #[test]
    fn no_lookups_when_geocoding_disabled() {
        let legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        let settings = Settings { geocoding_enabled: false, ..Settings::default() };
        let mut g = DirectionsGenerator::new(legs, settings);

        assert!(g.take_geocode_requests().is_empty());
        assert_eq!(text(&g.directions()[0]), "Walk from path to Busch Blvd (HART 4521)\n[320 m]");
    }

    #[test]
    fn geocoded_name_patches_matching_entries() {
        let mut g = generator();
        let requests = g.take_geocode_requests();
        let path = requests.into_iter().find(|r| r.generated_name == "path").unwrap();

        let changed = g.apply_geocoded(&GeocodeOutcome {
            request: path,
            addresses: vec![Address::new(["4202 E Fowler Ave", "Tampa 33620"])],
        });

        assert_eq!(changed, 2);
        assert_eq!(text(&g.directions()[0]), "Walk from 4202 E Fowler Ave to Busch Blvd (HART 4521)\n[320 m]");
        let steps = g.directions()[0].sub_directions.as_ref().unwrap();
        assert_eq!(text(&steps[0]), "Walk heading east on 4202 E Fowler Ave\n[120 m]");
        // Entries elsewhere are untouched
        assert_eq!(text(&steps[1]), "Turn left on Busch Blvd\n[150 m]");

        assert_eq!(g.legs()[0].from.name.as_deref(), Some("4202 E Fowler Ave"));
        assert_eq!(g.legs()[0].steps.as_ref().unwrap()[0].street_name, "4202 E Fowler Ave");
    }

    #[test]
    fn empty_geocode_result_changes_nothing() {
        let mut g = generator();
        let before = g.directions().to_vec();
        let request = g.take_geocode_requests().remove(0);

        let changed = g.apply_geocoded(&GeocodeOutcome { request, addresses: Vec::new() });

        assert_eq!(changed, 0);
        assert_eq!(g.directions(), before.as_slice());
        assert_eq!(g.legs()[0].from.name.as_deref(), Some("path"));
    }

    #[test]
    fn geocoded_name_ignores_distant_entries() {
        let mut g = generator();
        let before = g.directions().to_vec();
        let request = GeocodeRequest {
            point: Point::new(10.0, 10.0),
            generated_name: "path".into(),
            subjects: Vec::new(),
        };

        let changed = g.apply_geocoded(&GeocodeOutcome {
            request,
            addresses: vec![Address::new(["Elsewhere"])],
        });

        assert_eq!(changed, 0);
        assert_eq!(g.directions(), before.as_slice());
    }

    #[test]
    fn marker_titles_are_patched() {
        let destination = Point::new(28.0647, -82.4716);
        let markers = vec![
            ModeMarker::new("Bike to footpath", TripInfo::new(false, None, destination, None, 0)),
            ModeMarker::new("Bus to footpath", TripInfo::new(true, Some("HART:1".into()), Point::new(1.0, 1.0), None, 60)),
        ];
        let mut g = DirectionsGenerator::with_markers(markers, Settings::default());

        let changed = g.apply_geocoded(&GeocodeOutcome {
            request: GeocodeRequest { point: destination, generated_name: "footpath".into(), subjects: Vec::new() },
            addresses: vec![Address::new(["Sun Dome Walk\nTampa"])],
        });

        assert_eq!(changed, 1);
        let markers = g.markers().unwrap();
        assert_eq!(markers[0].title, "Bike to Sun Dome Walk");
        assert_eq!(markers[1].title, "Bus to footpath");
    }

    // Generic names next to real names that contain them.
    const CONTAINED_NAMES_JSON: &str = r#"[
  {
    "mode": "WALK",
    "distance": 100.0,
    "startTime": 1331170440000,
    "endTime": 1331170500000,
    "from": {"name": "road", "lat": 28.0101, "lon": -82.5101},
    "to": {"name": "Broad St", "lat": 28.0201, "lon": -82.5201}
  },
  {
    "mode": "WALK",
    "distance": 100.0,
    "startTime": 1331170500000,
    "endTime": 1331170560000,
    "from": {"name": "path", "lat": 28.0301, "lon": -82.5301},
    "to": {"name": "footpath", "lat": 28.0401, "lon": -82.5401}
  }
]"#;

    fn found(requests: &[GeocodeRequest], generated: &str, name: &str) -> GeocodeOutcome {
        let request = requests.iter().find(|r| r.generated_name == generated).unwrap().clone();
        GeocodeOutcome { request, addresses: vec![Address::new([name])] }
    }

    #[test]
    fn geocoded_name_leaves_longer_words_alone() {
        let legs = parse_legs(CONTAINED_NAMES_JSON.as_bytes()).unwrap();
        let mut g = DirectionsGenerator::new(legs, Settings::default());
        let requests = g.take_geocode_requests();

        let road = found(&requests, "road", "Main Rd");
        assert_eq!(g.apply_geocoded(&road), 1);
        assert_eq!(text(&g.directions()[0]), "Walk from Main Rd to Broad St\n[100 m]");
    }

    #[test]
    fn geocoded_names_patch_in_any_order() {
        let legs = parse_legs(CONTAINED_NAMES_JSON.as_bytes()).unwrap();
        let mut g = DirectionsGenerator::new(legs, Settings::default());
        let requests = g.take_geocode_requests();

        let path = found(&requests, "path", "Fowler Ave");
        assert_eq!(g.apply_geocoded(&path), 1);
        assert_eq!(text(&g.directions()[1]), "Walk from Fowler Ave to footpath\n[200 m]");

        let footpath = found(&requests, "footpath", "Sun Dome Walk");
        assert_eq!(g.apply_geocoded(&footpath), 1);
        assert_eq!(text(&g.directions()[1]), "Walk from Fowler Ave to Sun Dome Walk\n[200 m]");
        assert_eq!(g.legs()[1].to.name.as_deref(), Some("Sun Dome Walk"));
    }

    #[test]
    fn marker_title_matches_whole_words() {
        let destination = Point::new(28.0647, -82.4716);
        let markers = vec![ModeMarker::new("Bike to footpath", TripInfo::new(false, None, destination, None, 0))];
        let mut g = DirectionsGenerator::with_markers(markers, Settings::default());

        let changed = g.apply_geocoded(&GeocodeOutcome {
            request: GeocodeRequest { point: destination, generated_name: "path".into(), subjects: Vec::new() },
            addresses: vec![Address::new(["Fowler Ave"])],
        });

        assert_eq!(changed, 0);
        assert_eq!(g.markers().unwrap()[0].title, "Bike to footpath");
    }

    #[test]
    fn extreme_delay_does_not_overflow() {
        let mut legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        legs[1].departure_delay = 9_300_000_000_000_000;
        legs[1].arrival_delay = i64::MIN;
        let g = DirectionsGenerator::new(legs, Settings::default());

        let get_on = &g.directions()[1];
        assert_eq!(get_on.old_time.as_deref(), Some("--:--"));
        assert!(get_on.new_time.as_deref().unwrap().starts_with("20:40 ("));
        assert_eq!(g.directions()[2].old_time.as_deref(), Some("--:--"));
    }

    #[test]
    fn trip_info_from_leg() {
        let legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        let info = TripInfo::from_leg(&legs[1]);

        assert!(info.realtime);
        assert_eq!(info.trip_id.as_deref(), Some("HART:1234"));
        assert_eq!(info.destination, Point::new(28.0640, -82.4720));
        assert_eq!(info.delay_in_seconds, -60);
    }

    #[test]
    fn roundabout_exit_fallbacks() {
        let p = Phrases::default();
        assert_eq!(exit_text(&p, "3"), "3rd");
        assert_eq!(exit_text(&p, "12"), "number 12");
        assert_eq!(exit_text(&p, "0"), "number 0");
        assert_eq!(exit_text(&p, "B"), "B");
    }

    #[test]
    fn spanish_directions() {
        let legs = parse_legs(LEGS_JSON.as_bytes()).unwrap();
        let config = Config::from_toml_str("[display]\nlocale = \"es\"").unwrap();
        let g = DirectionsGenerator::new(legs, config.settings().unwrap());

        assert_eq!(text(&g.directions()[0]), "Camine desde camino hasta Busch Blvd (HART 4521)\n[320 m]");
        let steps = g.directions()[0].sub_directions.as_ref().unwrap();
        assert_eq!(text(&steps[1]), "Gire a la izquierda por Busch Blvd\n[150 m]");
        assert_eq!(g.directions()[1].service.as_deref(), Some("Suba al HART BUS 6"));
    }

    #[test]
    fn directions_index_set_and_add() {
        let mut g = DirectionsGenerator::new(Vec::new(), Settings::default());
        g.add_direction(Direction::new(Icon::ModeWalk, "Walk"));
        assert_eq!(g.directions().len(), 1);
        g.set_directions(Vec::new());
        assert!(g.directions().is_empty());
    }
}
