use thiserror::Error;

/// Why a traversal of the lane graph failed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TraversalError {
    #[error("s={s} is outside of the lane range [{start}, {end}]")]
    OutOfLane { s: f64, start: f64, end: f64 },
    #[error("no lane is linked beyond the lane boundary")]
    DeadEnd,
    #[error("the traversal entered a lane it had already visited")]
    CycleDetected,
    #[error("the traversal exceeded {0} lanes")]
    HopLimit(usize),
    #[error("the target position {0} does not lie on a lane")]
    UnknownTarget(String),
}

/// An error raised while building a road network.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("unknown road '{0}'")]
    UnknownRoad(String),
    #[error("road '{road}' has no lane {lane} in lane section {section}")]
    UnknownLane {
        road: String,
        section: usize,
        lane: i32,
    },
    #[error("road '{0}' is defined more than once")]
    DuplicateRoad(String),
    #[error("invalid range [{start}, {end}] on road '{road}'")]
    InvalidRange { road: String, start: f64, end: f64 },
    #[error("junction '{0}' has no connections")]
    EmptyJunction(String),
}

/// An error raised while parsing a scenario command.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("action '{action}' is missing parameter '{param}'")]
    MissingParameter { action: String, param: &'static str },
    #[error("action '{action}' has an invalid value for '{param}': {value}")]
    InvalidParameter {
        action: String,
        param: &'static str,
        value: String,
    },
}
