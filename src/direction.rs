//! Display records handed to the list UI and the map.

use std::ops::Range;

use serde::Serialize;

use crate::geo::Point;
use crate::icon::Icon;
use crate::otp::Leg;

/// One entry of the directions list.
///
/// Street legs carry `direction_text`; transit entries carry `service`,
/// `place` and times instead. Sub-directions are the steps of a street
/// leg or the stops passed on a ride.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Direction {
    pub icon: Option<Icon>,
    /// 1-based position in the list. Zero for sub-directions.
    pub direction_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_text: Option<String>,
    /// Transit only: action, agency, mode and route, e.g. "Get on HART BUS 6".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Transit only: the stop, plus the stop count when boarding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    pub origin: Point,
    pub destination: Point,
    /// Scheduled time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_time: Option<String>,
    /// Realtime estimate with its delay note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_time: Option<String>,
    pub is_transit: bool,
    /// Times come from live vehicle data.
    pub real_time_info: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_directions: Option<Vec<Direction>>,
    /// Generated names still present in `direction_text`, in text order.
    #[serde(skip)]
    pub generated_names: Vec<NameSpan>,
}

/// Byte range of a generated name inside a direction's text, and the
/// coordinates it was generated for.
#[derive(Debug, Clone, PartialEq)]
pub struct NameSpan {
    pub point: Point,
    pub range: Range<usize>,
}

/// A street or place name on its way into direction text.
#[derive(Debug, Clone, PartialEq)]
pub enum Name {
    /// Came from the planner as is.
    Real(String),
    /// Made up locally; may be replaced once a lookup for `point` returns.
    Generated { text: String, point: Point },
}

/// Space-separated direction text that remembers where generated names went.
#[derive(Debug, Default)]
pub(crate) struct TextBuilder {
    text: String,
    names: Vec<NameSpan>,
}

impl TextBuilder {
    pub(crate) fn word(&mut self, word: &str) -> &mut Self {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(word);
        self
    }

    pub(crate) fn name(&mut self, name: Name) -> &mut Self {
        match name {
            Name::Real(text) => self.word(&text),
            Name::Generated { text, point } => {
                self.word("");
                let start = self.text.len();
                self.text.push_str(&text);
                self.names.push(NameSpan { point, range: start..self.text.len() });
                self
            }
        }
    }

    /// Start a new line. Nothing after it is a name.
    pub(crate) fn line(&mut self, line: &str) -> &mut Self {
        self.text.push('\n');
        self.text.push_str(line);
        self
    }

    pub(crate) fn finish(self) -> (String, Vec<NameSpan>) {
        (self.text, self.names)
    }
}

impl Direction {
    /// A bare direction with an icon and text.
    pub fn new(icon: Icon, direction_text: impl Into<String>) -> Self {
        Direction {
            icon: Some(icon),
            direction_text: Some(direction_text.into()),
            ..Default::default()
        }
    }

    /// Replace the generated names produced for `point` that still read
    /// `generated`. Other text, including longer words that merely contain
    /// `generated`, is left alone.
    ///
    /// Returns true if the text changed.
    pub fn replace_generated(&mut self, point: &Point, tolerance_m: f64, generated: &str, replacement: &str) -> bool {
        let Some(text) = &mut self.direction_text else {
            return false;
        };

        let mut changed = false;
        let mut i = 0;
        while i < self.generated_names.len() {
            let span = &self.generated_names[i];
            if !span.point.matches(point, tolerance_m) || text.get(span.range.clone()) != Some(generated) {
                i += 1;
                continue;
            }

            let range = span.range.clone();
            text.replace_range(range.clone(), replacement);
            self.generated_names.remove(i);
            for later in &mut self.generated_names[i..] {
                let start = later.range.start - range.len() + replacement.len();
                let end = later.range.end - range.len() + replacement.len();
                later.range = start..end;
            }
            changed = true;
        }
        changed
    }
}

/// Replace every whole-word occurrence of `word` in `text`.
///
/// A match must not touch a letter or digit on either side, so `path`
/// never matches inside `footpath`. Returns `None` when nothing matched.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> Option<String> {
    if word.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut found = false;
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(replacement);
        last = end;
        found = true;
    }

    if !found {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// What the map knows about a transit trip behind a mode marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripInfo {
    pub realtime: bool,
    pub trip_id: Option<String>,
    /// Where the trip ends; marker titles are matched against it.
    pub destination: Point,
    /// Extra line shown under the marker title.
    pub snippet: Option<String>,
    /// Positive when late.
    pub delay_in_seconds: i64,
}

impl TripInfo {
    pub fn new(realtime: bool, trip_id: Option<String>, destination: Point, snippet: Option<String>, delay_in_seconds: i64) -> Self {
        TripInfo { realtime, trip_id, destination, snippet, delay_in_seconds }
    }

    /// Trip info for a leg, using its arrival delay.
    pub fn from_leg(leg: &Leg) -> Self {
        TripInfo {
            realtime: leg.real_time,
            trip_id: leg.trip_id.clone(),
            destination: leg.to.point(),
            snippet: leg.to.name.clone(),
            delay_in_seconds: leg.arrival_delay,
        }
    }
}

/// A map marker whose title may name a generated street.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeMarker {
    pub title: String,
    pub trip_info: TripInfo,
}

impl ModeMarker {
    pub fn new(title: impl Into<String>, trip_info: TripInfo) -> Self {
        ModeMarker { title: title.into(), trip_info }
    }
}
