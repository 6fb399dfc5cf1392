use crate::LaneId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Which end of a lane a link attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactPoint {
    Start,
    End,
}

/// One candidate lane reachable through a [Link].
#[derive(Clone, Debug, PartialEq)]
pub struct LinkData {
    /// The linked lane.
    pub lane: LaneId,
    /// The end of the linked lane which is entered.
    pub contact: ContactPoint,
    /// The junction connection this candidate belongs to, if any.
    pub connection: Option<String>,
}

/// The predecessor or successor of a lane.
///
/// A link either points directly at a single lane, or at a junction
/// which may offer several candidate lanes. A link with more than one
/// candidate is a branch point, resolved with [PreferredConnections].
#[derive(Clone, Debug, Default)]
pub struct Link {
    /// The junction ID, if this link leads into a junction.
    junction: Option<String>,
    /// The candidate lanes.
    targets: SmallVec<[LinkData; 2]>,
}

/// A route hint: the set of junction connections a vehicle prefers to take.
///
/// An empty set means "no preference", and the first candidate is taken
/// at every junction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredConnections {
    connections: Vec<(String, String)>,
}

impl ContactPoint {
    /// Returns the opposite end.
    pub fn opposite(self) -> Self {
        match self {
            ContactPoint::Start => ContactPoint::End,
            ContactPoint::End => ContactPoint::Start,
        }
    }
}

impl Link {
    /// Creates a link to a single lane.
    pub fn to_lane(lane: LaneId, contact: ContactPoint) -> Self {
        let mut link = Self::default();
        link.push(LinkData {
            lane,
            contact,
            connection: None,
        });
        link
    }

    /// Creates a link into a junction with no candidates yet.
    pub fn junction(junction: impl Into<String>) -> Self {
        Self {
            junction: Some(junction.into()),
            targets: SmallVec::new(),
        }
    }

    /// Adds a candidate lane reached through the given junction connection.
    pub fn with_connection(
        mut self,
        lane: LaneId,
        contact: ContactPoint,
        connection: impl Into<String>,
    ) -> Self {
        self.push(LinkData {
            lane,
            contact,
            connection: Some(connection.into()),
        });
        self
    }

    pub(crate) fn push(&mut self, data: LinkData) {
        self.targets.push(data);
    }

    /// Whether the link leads into a junction.
    pub fn is_junction(&self) -> bool {
        self.junction.is_some()
    }

    /// The ID of the junction the link leads into.
    pub fn junction_id(&self) -> Option<&str> {
        self.junction.as_deref()
    }

    /// The candidate lanes.
    pub fn targets(&self) -> &[LinkData] {
        &self.targets
    }

    /// The number of candidate lanes.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Whether the link offers more than one candidate.
    pub fn is_branch(&self) -> bool {
        self.targets.len() > 1
    }

    /// Resolves the link to a single candidate.
    ///
    /// Returns the candidate named by `pc`, or else the first candidate.
    /// The flag is `true` when a branch point had to fall back to the first
    /// candidate because `pc` names none of them.
    pub fn link_data(&self, pc: &PreferredConnections) -> Option<(&LinkData, bool)> {
        if self.is_branch() {
            let junction = self.junction.as_deref().unwrap_or_default();
            let preferred = self.targets.iter().find(|data| {
                data.connection
                    .as_deref()
                    .map_or(false, |conn| pc.contains(junction, conn))
            });
            return match preferred {
                Some(data) => Some((data, false)),
                None => self.targets.first().map(|data| (data, true)),
            };
        }
        self.targets.first().map(|data| (data, false))
    }
}

impl PreferredConnections {
    /// Creates an empty set of preferred connections.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a connection to the set.
    pub fn add_connection(&mut self, junction: impl Into<String>, connection: impl Into<String>) {
        let pair = (junction.into(), connection.into());
        if !self.connections.contains(&pair) {
            self.connections.push(pair);
        }
    }

    /// Whether the set names the given connection of the given junction.
    pub fn contains(&self, junction: &str, connection: &str) -> bool {
        if junction.is_empty() || connection.is_empty() {
            return false;
        }
        self.connections
            .iter()
            .any(|(j, c)| j == junction && c == connection)
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Iterates over the `(junction, connection)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.connections
            .iter()
            .map(|(j, c)| (j.as_str(), c.as_str()))
    }
}

impl<J: Into<String>, C: Into<String>> FromIterator<(J, C)> for PreferredConnections {
    fn from_iter<T: IntoIterator<Item = (J, C)>>(iter: T) -> Self {
        let mut pc = Self::new();
        for (junction, connection) in iter {
            pc.add_connection(junction, connection);
        }
        pc
    }
}

impl fmt::Display for PreferredConnections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (junction, connection) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", junction, connection)?;
            first = false;
        }
        Ok(())
    }
}
