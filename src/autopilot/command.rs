use crate::error::CommandError;
use crate::lane::Position;
use crate::link::PreferredConnections;
use crate::point::RoadPosition;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// An instruction for an autopilot, issued by a trigger or an external controller.
#[derive(Clone, Debug, PartialEq)]
pub enum AutopilotCommand {
    /// Change to the lane with this number in the current lane section.
    SetTargetLane(i32),
    /// Change to the neighbouring lane on the given side.
    ChangeLane(Position),
    /// Replace the preferred junction connections.
    SetRoute(PreferredConnections),
    /// Plan a route to a position and follow it.
    NavigateTo(RoadPosition),
    /// Set the maximum speed in km/h.
    SetMaxSpeed(f64),
}

/// Fires a command when a vehicle passes a position.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionTrigger {
    /// The position which fires the trigger.
    pub position: RoadPosition,
    /// The command issued when the trigger fires.
    pub command: AutopilotCommand,
    /// Whether the vehicle was inside the trigger in the previous tick.
    inside: bool,
}

impl PositionTrigger {
    /// How close to the trigger position a vehicle must be, in m.
    pub const RADIUS: f64 = 0.5;

    pub fn new(position: RoadPosition, command: AutopilotCommand) -> Self {
        Self {
            position,
            command,
            inside: false,
        }
    }

    /// Updates the trigger with a vehicle's position, returning the command
    /// if the vehicle has just reached the trigger.
    pub(crate) fn update(&mut self, road: &str, lane: i32, s: f64) -> Option<&AutopilotCommand> {
        let inside = road == self.position.road
            && lane == self.position.lane
            && (s - self.position.s).abs() < Self::RADIUS;
        let entered = inside && !self.inside;
        self.inside = inside;
        entered.then_some(&self.command)
    }
}

/// Builds a command from its JSON parameters.
pub type CommandFactory = fn(&str, &Value) -> Result<AutopilotCommand, CommandError>;

/// Maps command names to the factories which build them.
#[derive(Clone)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("setTargetLane", |name, params| {
            Ok(AutopilotCommand::SetTargetLane(param(name, params, "lane")?))
        });
        registry.register("changeLane", |name, params| {
            Ok(AutopilotCommand::ChangeLane(param(name, params, "position")?))
        });
        registry.register("setRoute", |name, params| {
            let connections: Vec<(String, String)> = param(name, params, "connections")?;
            Ok(AutopilotCommand::SetRoute(connections.into_iter().collect()))
        });
        registry.register("navigateTo", |name, params| {
            Ok(AutopilotCommand::NavigateTo(RoadPosition::new(
                param::<String>(name, params, "road")?,
                param(name, params, "lane")?,
                param(name, params, "s")?,
            )))
        });
        registry.register("setMaxSpeed", |name, params| {
            let speed: f64 = param(name, params, "speed")?;
            if speed.is_nan() || speed < 0.0 {
                return Err(CommandError::InvalidParameter {
                    action: name.to_owned(),
                    param: "speed",
                    value: speed.to_string(),
                });
            }
            Ok(AutopilotCommand::SetMaxSpeed(speed))
        });
        registry
    }
}

impl CommandRegistry {
    /// Creates a registry with the built-in commands.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a registry without any commands.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command of the same name.
    pub fn register(&mut self, name: impl Into<String>, factory: CommandFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Whether a command of the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds the command `name` from its JSON parameters.
    pub fn create(&self, name: &str, params: &Value) -> Result<AutopilotCommand, CommandError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CommandError::UnknownAction(name.to_owned()))?;
        factory(name, params)
    }
}

/// Reads and deserializes a command parameter.
fn param<T: DeserializeOwned>(
    action: &str,
    params: &Value,
    key: &'static str,
) -> Result<T, CommandError> {
    let value = params.get(key).ok_or_else(|| CommandError::MissingParameter {
        action: action.to_owned(),
        param: key,
    })?;
    serde_json::from_value(value.clone()).map_err(|_| CommandError::InvalidParameter {
        action: action.to_owned(),
        param: key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_builtin_commands() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.create("setTargetLane", &json!({ "lane": -2 })),
            Ok(AutopilotCommand::SetTargetLane(-2))
        );
        assert_eq!(
            registry.create("changeLane", &json!({ "position": "left" })),
            Ok(AutopilotCommand::ChangeLane(Position::Left))
        );
        assert_eq!(
            registry.create("navigateTo", &json!({ "road": "A", "lane": 1, "s": 10.0 })),
            Ok(AutopilotCommand::NavigateTo(RoadPosition::new("A", 1, 10.0)))
        );
        let route = registry
            .create("setRoute", &json!({ "connections": [["J", "0"]] }))
            .unwrap();
        let AutopilotCommand::SetRoute(pc) = &route else {
            panic!("expected a route, got {:?}", route);
        };
        assert!(pc.contains("J", "0"));
    }

    #[test]
    fn reports_bad_parameters() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.create("fly", &json!({})),
            Err(CommandError::UnknownAction("fly".into()))
        );
        assert_eq!(
            registry.create("setMaxSpeed", &json!({})),
            Err(CommandError::MissingParameter {
                action: "setMaxSpeed".into(),
                param: "speed"
            })
        );
        assert!(matches!(
            registry.create("setMaxSpeed", &json!({ "speed": -5.0 })),
            Err(CommandError::InvalidParameter { .. })
        ));
        assert!(matches!(
            registry.create("changeLane", &json!({ "position": "up" })),
            Err(CommandError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn trigger_fires_once_per_pass() {
        let mut trigger = PositionTrigger::new(
            RoadPosition::new("A", 1, 50.0),
            AutopilotCommand::SetMaxSpeed(30.0),
        );
        assert!(trigger.update("A", 1, 49.0).is_none());
        assert!(trigger.update("A", 1, 49.8).is_some());
        assert!(trigger.update("A", 1, 50.2).is_none());
        assert!(trigger.update("A", 2, 50.0).is_none());
        assert!(trigger.update("A", 1, 50.0).is_some());
    }
}
