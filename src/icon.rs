//! Icon selection for directions and notifications.
//!
//! Icons are identified by their drawable resource name, which is what
//! crosses the JNI boundary; the app resolves them to resource ids.

use serde::Serialize;

use crate::otp::{ModeSet, RelativeDirection, TraverseMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    /// Application icon, used when nothing more specific applies.
    #[serde(rename = "icon")]
    App,
    ModeTransit,
    ModeBus,
    ModeTrain,
    ModeFerry,
    ModeMetro,
    ModeWalk,
    ModeBike,
    Clear,
    CircleClockwise,
    CircleCounterclockwise,
    #[serde(rename = "reldir_continue")]
    Continue,
    Elevator,
    HardLeft,
    HardRight,
    Left,
    Right,
    SlightlyLeft,
    SlightlyRight,
    UturnLeft,
    UturnRight,
    TransitNotification,
    BusNotification,
    TrainNotification,
    FerryNotification,
    MetroNotification,
}

/// Icon for a set of travel modes.
pub fn mode_icon(modes: ModeSet) -> Icon {
    use TraverseMode::*;

    if modes.contains(Busish) && modes.contains(Trainish) {
        Icon::ModeTransit
    } else if modes.contains(Busish) {
        Icon::ModeBus
    } else if modes.contains(Trainish) {
        Icon::ModeTrain
    } else if modes.contains(Ferry) || modes.contains(Gondola) {
        Icon::ModeFerry
    } else if modes.contains(Subway) {
        Icon::ModeMetro
    } else if modes.contains(Tram) {
        Icon::ModeTrain
    } else if modes.contains(Walk) {
        Icon::ModeWalk
    } else if modes.contains(Bicycle) {
        Icon::ModeBike
    } else {
        Icon::App
    }
}

/// Small icon for status-bar notifications about a trip.
pub fn notification_icon(modes: ModeSet) -> Icon {
    use TraverseMode::*;

    if modes.contains(Busish) && modes.contains(Trainish) {
        Icon::TransitNotification
    } else if modes.contains(Busish) {
        Icon::BusNotification
    } else if modes.contains(Trainish) {
        Icon::TrainNotification
    } else if modes.contains(Ferry) {
        Icon::FerryNotification
    } else if modes.contains(Subway) {
        Icon::MetroNotification
    } else {
        Icon::App
    }
}

pub fn relative_direction_icon(dir: RelativeDirection) -> Icon {
    match dir {
        RelativeDirection::CircleClockwise => Icon::CircleClockwise,
        RelativeDirection::CircleCounterclockwise => Icon::CircleCounterclockwise,
        RelativeDirection::Continue => Icon::Continue,
        RelativeDirection::Depart => Icon::Clear,
        RelativeDirection::Elevator => Icon::Elevator,
        RelativeDirection::HardLeft => Icon::HardLeft,
        RelativeDirection::HardRight => Icon::HardRight,
        RelativeDirection::Left => Icon::Left,
        RelativeDirection::Right => Icon::Right,
        RelativeDirection::SlightlyLeft => Icon::SlightlyLeft,
        RelativeDirection::SlightlyRight => Icon::SlightlyRight,
        RelativeDirection::UturnLeft => Icon::UturnLeft,
        RelativeDirection::UturnRight => Icon::UturnRight,
    }
}
