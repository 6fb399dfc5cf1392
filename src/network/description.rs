//! The road description data model handed over by a road-description loader.

use super::RoadNetwork;
use crate::error::BuildError;
use crate::geometry::Geometry;
use crate::lane::{LaneAttributes, LaneType, LaneWidth, RoadMark};
use crate::link::{ContactPoint, Link, LinkData};
use crate::math::CubicRecord;
use crate::road::{RoadAttributes, SpeedRecord};
use crate::util::Interval;
use crate::{LaneId, RoadId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete road network.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescription {
    #[serde(default)]
    pub roads: Vec<RoadDescription>,
    #[serde(default)]
    pub junctions: Vec<JunctionDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadDescription {
    pub id: String,
    /// The junction the road belongs to, if it is a connecting road.
    #[serde(default)]
    pub junction: Option<String>,
    pub geometry: Vec<Geometry>,
    #[serde(default)]
    pub lane_offset: Vec<CubicRecord>,
    #[serde(default)]
    pub elevation: Vec<CubicRecord>,
    #[serde(default)]
    pub speed: Vec<SpeedRecord>,
    #[serde(default)]
    pub predecessor: Option<RoadLink>,
    #[serde(default)]
    pub successor: Option<RoadLink>,
    pub lane_sections: Vec<LaneSectionDescription>,
}

/// What lies beyond one end of a road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "elementType", rename_all = "camelCase")]
pub enum RoadLink {
    #[serde(rename_all = "camelCase")]
    Road {
        id: String,
        contact_point: ContactPoint,
    },
    Junction {
        id: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneSectionDescription {
    /// The arc-length at which the lane section starts.
    pub s: f64,
    #[serde(default)]
    pub center_road_marks: Vec<RoadMark>,
    pub lanes: Vec<LaneDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneDescription {
    pub id: i32,
    #[serde(rename = "type", default)]
    pub kind: LaneType,
    #[serde(default)]
    pub widths: Vec<LaneWidth>,
    #[serde(default)]
    pub road_marks: Vec<RoadMark>,
    #[serde(default)]
    pub speed: Vec<SpeedRecord>,
    /// The number of the lane linked at the start of this lane.
    #[serde(default)]
    pub predecessor: Option<i32>,
    /// The number of the lane linked at the end of this lane.
    #[serde(default)]
    pub successor: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionDescription {
    pub id: String,
    pub connections: Vec<ConnectionDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescription {
    pub id: String,
    pub incoming_road: String,
    pub connecting_road: String,
    /// The end of the connecting road which is entered.
    pub contact_point: ContactPoint,
    pub lane_links: Vec<LaneLinkDescription>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LaneLinkDescription {
    pub from: i32,
    pub to: i32,
}

/// Which end of a lane a link leaves from.
#[derive(Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    End,
}

impl RoadNetwork {
    /// Builds a road network from its description.
    pub fn from_description(desc: &NetworkDescription) -> Result<Self, BuildError> {
        let mut net = RoadNetwork::new();

        for road in &desc.roads {
            net.add_described_road(road)?;
        }

        let junctions = desc
            .junctions
            .iter()
            .map(|j| (j.id.as_str(), j))
            .collect::<HashMap<_, _>>();
        for junction in &desc.junctions {
            if junction.connections.is_empty() {
                return Err(BuildError::EmptyJunction(junction.id.clone()));
            }
        }

        for road in &desc.roads {
            net.link_described_road(road, &junctions)?;
        }

        Ok(net)
    }

    fn add_described_road(&mut self, desc: &RoadDescription) -> Result<RoadId, BuildError> {
        let road_id = self.add_road(&RoadAttributes {
            name: &desc.id,
            geometry: &desc.geometry,
            lane_offset: &desc.lane_offset,
            elevation: &desc.elevation,
            speed_limits: &desc.speed,
            junction: desc.junction.as_deref(),
        })?;
        let length = self.road(road_id).length();

        for (idx, section) in desc.lane_sections.iter().enumerate() {
            let end = desc
                .lane_sections
                .get(idx + 1)
                .map_or(length, |next| next.s);
            let section_id = self.add_lane_section(
                road_id,
                Interval::new(section.s, end),
                &section.center_road_marks,
            )?;
            for lane in &section.lanes {
                self.add_lane(
                    section_id,
                    &LaneAttributes {
                        number: lane.id,
                        kind: lane.kind,
                        widths: &lane.widths,
                        road_marks: &lane.road_marks,
                        speed_limits: &lane.speed,
                    },
                )?;
            }
        }

        Ok(road_id)
    }

    fn link_described_road(
        &mut self,
        desc: &RoadDescription,
        junctions: &HashMap<&str, &JunctionDescription>,
    ) -> Result<(), BuildError> {
        let road_id = self
            .road_by_name(&desc.id)
            .ok_or_else(|| BuildError::UnknownRoad(desc.id.clone()))?;
        let last = self.road(road_id).sections().len().saturating_sub(1);

        for (idx, section) in desc.lane_sections.iter().enumerate() {
            for lane in &section.lanes {
                let lane_id = self.described_lane(&desc.id, idx, lane.id)?;

                // Successor
                let successor = match (idx < last, lane.successor) {
                    (true, Some(number)) => Some(Link::to_lane(
                        self.described_lane(&desc.id, idx + 1, number)?,
                        ContactPoint::Start,
                    )),
                    (true, None) => None,
                    (false, _) => self.road_link(desc, &desc.successor, lane, End::End, junctions)?,
                };
                if let Some(link) = successor {
                    self.set_successor(lane_id, link);
                }

                // Predecessor
                let predecessor = match (idx > 0, lane.predecessor) {
                    (true, Some(number)) => Some(Link::to_lane(
                        self.described_lane(&desc.id, idx - 1, number)?,
                        ContactPoint::End,
                    )),
                    (true, None) => None,
                    (false, _) => {
                        self.road_link(desc, &desc.predecessor, lane, End::Start, junctions)?
                    }
                };
                if let Some(link) = predecessor {
                    self.set_predecessor(lane_id, link);
                }
            }
        }

        Ok(())
    }

    /// Builds the link leaving a lane across the end of its road.
    fn road_link(
        &self,
        road: &RoadDescription,
        road_link: &Option<RoadLink>,
        lane: &LaneDescription,
        end: End,
        junctions: &HashMap<&str, &JunctionDescription>,
    ) -> Result<Option<Link>, BuildError> {
        match road_link {
            None => Ok(None),
            Some(RoadLink::Road { id, contact_point }) => {
                let number = match end {
                    End::End => lane.successor,
                    End::Start => lane.predecessor,
                };
                let Some(number) = number else {
                    return Ok(None);
                };
                let target = self.boundary_lane(id, *contact_point, number)?;
                Ok(Some(Link::to_lane(target, *contact_point)))
            }
            Some(RoadLink::Junction { id }) => {
                let junction = junctions
                    .get(id.as_str())
                    .ok_or_else(|| BuildError::EmptyJunction(id.clone()))?;
                let mut link = Link::junction(id.as_str());
                let connections = junction
                    .connections
                    .iter()
                    .filter(|conn| conn.incoming_road == road.id);
                for conn in connections {
                    for lane_link in conn.lane_links.iter().filter(|ll| ll.from == lane.id) {
                        let target =
                            self.boundary_lane(&conn.connecting_road, conn.contact_point, lane_link.to)?;
                        link.push(LinkData {
                            lane: target,
                            contact: conn.contact_point,
                            connection: Some(conn.id.clone()),
                        });
                    }
                }
                if link.target_count() == 0 {
                    debug!(
                        "lane {} of road '{}' has no connection through junction '{}'",
                        lane.id, road.id, id
                    );
                    return Ok(None);
                }
                Ok(Some(link))
            }
        }
    }

    /// Finds a lane in the first (`Start`) or last (`End`) lane section of a road.
    fn boundary_lane(
        &self,
        road: &str,
        contact: ContactPoint,
        number: i32,
    ) -> Result<LaneId, BuildError> {
        let road_id = self
            .road_by_name(road)
            .ok_or_else(|| BuildError::UnknownRoad(road.to_owned()))?;
        let count = self.road(road_id).sections().len();
        let idx = match contact {
            ContactPoint::Start => 0,
            ContactPoint::End => count.saturating_sub(1),
        };
        self.described_lane(road, idx, number)
    }

    fn described_lane(&self, road: &str, section: usize, number: i32) -> Result<LaneId, BuildError> {
        let unknown = || BuildError::UnknownLane {
            road: road.to_owned(),
            section,
            lane: number,
        };
        let road_id = self
            .road_by_name(road)
            .ok_or_else(|| BuildError::UnknownRoad(road.to_owned()))?;
        let section_id = *self.road(road_id).sections().get(section).ok_or_else(unknown)?;
        self.section(section_id).lane(number).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::link::PreferredConnections;
    use assert_approx_eq::assert_approx_eq;

    const JSON: &str = r#"{
        "roads": [
            {
                "id": "A",
                "geometry": [{ "s": 0, "x": 0, "y": 0, "hdg": 0, "length": 100, "kind": { "type": "line" } }],
                "speed": [{ "max": 50 }],
                "successor": { "elementType": "junction", "id": "J" },
                "laneSections": [
                    { "s": 0, "lanes": [
                        { "id": 1, "widths": [{ "width": { "a": 3.5 } }], "successor": 1 }
                    ] },
                    { "s": 60, "lanes": [
                        { "id": 1, "widths": [{ "width": { "a": 3.5 } }], "predecessor": 1 }
                    ] }
                ]
            },
            {
                "id": "B",
                "junction": "J",
                "geometry": [{ "s": 0, "x": 100, "y": 0, "hdg": 0, "length": 20, "kind": { "type": "arc", "curvature": 0.01 } }],
                "laneSections": [{ "s": 0, "lanes": [{ "id": 1, "widths": [{ "width": { "a": 3.5 } }] }] }]
            },
            {
                "id": "C",
                "junction": "J",
                "geometry": [{ "s": 0, "x": 100, "y": 0, "hdg": 0, "length": 20, "kind": { "type": "line" } }],
                "laneSections": [{ "s": 0, "lanes": [{ "id": -1, "widths": [{ "width": { "a": 3.5 } }] }] }]
            }
        ],
        "junctions": [
            { "id": "J", "connections": [
                { "id": "0", "incomingRoad": "A", "connectingRoad": "B", "contactPoint": "start", "laneLinks": [{ "from": 1, "to": 1 }] },
                { "id": "1", "incomingRoad": "A", "connectingRoad": "C", "contactPoint": "end", "laneLinks": [{ "from": 1, "to": -1 }] }
            ] }
        ]
    }"#;

    #[test]
    fn builds_lanes_and_links() {
        let desc: NetworkDescription = serde_json::from_str(JSON).unwrap();
        let net = RoadNetwork::from_description(&desc).unwrap();

        let first = net.lane_at("A", 1, 10.0).unwrap();
        let second = net.lane_at("A", 1, 80.0).unwrap();
        assert_ne!(first, second);
        assert_approx_eq!(net.lane(second).start_s(), 60.0);
        assert_eq!(net.lane(first).speed_limit_kmh(10.0, &net), Some(50.0));

        let pc = PreferredConnections::new();
        let link = net.lane(first).successor().unwrap();
        assert_eq!(net.resolve_link(link, &pc).unwrap().lane, second);
        let link = net.lane(second).predecessor().unwrap();
        assert_eq!(net.resolve_link(link, &pc).unwrap().lane, first);

        let link = net.lane(second).successor().unwrap();
        assert_eq!(link.junction_id(), Some("J"));
        assert_eq!(link.target_count(), 2);
        assert_eq!(link.targets()[1].lane, net.lane_at("C", -1, 0.0).unwrap());
        assert_eq!(link.targets()[1].contact, ContactPoint::End);
    }

    #[test]
    fn rejects_links_to_unknown_roads() {
        let mut desc: NetworkDescription = serde_json::from_str(JSON).unwrap();
        desc.junctions[0].connections[0].connecting_road = "X".into();
        assert_eq!(
            RoadNetwork::from_description(&desc).err(),
            Some(BuildError::UnknownRoad("X".into()))
        );
    }

    #[test]
    fn rejects_duplicate_roads() {
        let mut desc: NetworkDescription = serde_json::from_str(JSON).unwrap();
        desc.roads[2].id = "B".into();
        assert_eq!(
            RoadNetwork::from_description(&desc).err(),
            Some(BuildError::DuplicateRoad("B".into()))
        );
    }
}
