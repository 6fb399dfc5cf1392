use crate::error::BuildError;
use crate::lane::{Lane, LaneAttributes, RoadMark};
use crate::link::{Link, LinkData, PreferredConnections};
use crate::road::{Road, RoadAttributes};
use crate::section::LaneSection;
use crate::util::Interval;
use crate::{LaneId, RoadId, SectionId};
use log::{debug, warn};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub mod description;
mod route;

/// Lane sections may start or end this far outside of their road, in m.
const RANGE_TOLERANCE: f64 = 1e-6;

/// A road network: roads, their lane sections and lanes, and the links
/// between lanes.
///
/// The network is built once and is read-only afterwards, so it may be shared
/// between vehicles which are updated concurrently.
#[derive(Default)]
pub struct RoadNetwork {
    /// The roads in the network.
    roads: SlotMap<RoadId, Road>,
    /// The lane sections of every road.
    sections: SlotMap<SectionId, LaneSection>,
    /// The lanes of every lane section.
    lanes: SlotMap<LaneId, Lane>,
    /// Road IDs by name.
    road_names: HashMap<String, RoadId>,
    /// The number of junction branches resolved without a matching route hint.
    ambiguous: AtomicUsize,
}

impl RoadNetwork {
    /// Creates an empty road network.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a road to the network.
    pub fn add_road(&mut self, attributes: &RoadAttributes) -> Result<RoadId, BuildError> {
        if self.road_names.contains_key(attributes.name) {
            return Err(BuildError::DuplicateRoad(attributes.name.to_owned()));
        }
        let id = self.roads.insert_with_key(|id| Road::new(id, attributes));
        self.road_names.insert(attributes.name.to_owned(), id);
        Ok(id)
    }

    /// Adds a lane section to the end of a road.
    ///
    /// Lane sections must be added in order of increasing `s`.
    pub fn add_lane_section(
        &mut self,
        road_id: RoadId,
        range: Interval<f64>,
        center_marks: &[RoadMark],
    ) -> Result<SectionId, BuildError> {
        let road = &self.roads[road_id];
        let prev_start = road
            .sections()
            .last()
            .map_or(f64::NEG_INFINITY, |id| self.sections[*id].range().min);
        if !range.is_valid()
            || range.min < -RANGE_TOLERANCE
            || range.max > road.length() + RANGE_TOLERANCE
            || range.min < prev_start
        {
            return Err(BuildError::InvalidRange {
                road: road.name().to_owned(),
                start: range.min,
                end: range.max,
            });
        }
        let index = road.sections().len();
        let id = self
            .sections
            .insert_with_key(|id| LaneSection::new(id, road_id, index, range, center_marks));
        self.roads[road_id].push_section(id);
        Ok(id)
    }

    /// Adds a lane to a lane section.
    pub fn add_lane(
        &mut self,
        section_id: SectionId,
        attributes: &LaneAttributes,
    ) -> Result<LaneId, BuildError> {
        let section = &self.sections[section_id];
        if attributes.number == 0 || section.lane(attributes.number).is_some() {
            return Err(BuildError::UnknownLane {
                road: self.roads[section.road()].name().to_owned(),
                section: section.index(),
                lane: attributes.number,
            });
        }
        let (road, range) = (section.road(), section.range());
        let id = self
            .lanes
            .insert_with_key(|id| Lane::new(id, road, section_id, range, attributes));
        self.sections[section_id].insert_lane(attributes.number, id);
        Ok(id)
    }

    /// Specifies the lane(s) reached at the end of `lane`.
    pub fn set_successor(&mut self, lane: LaneId, link: Link) {
        self.lanes[lane].set_successor(link);
    }

    /// Specifies the lane(s) reached at the start of `lane`.
    pub fn set_predecessor(&mut self, lane: LaneId, link: Link) {
        self.lanes[lane].set_predecessor(link);
    }

    /// Gets a reference to the road with the given ID.
    pub fn road(&self, id: RoadId) -> &Road {
        &self.roads[id]
    }

    /// Gets a reference to the lane section with the given ID.
    pub fn section(&self, id: SectionId) -> &LaneSection {
        &self.sections[id]
    }

    /// Gets a reference to the lane with the given ID.
    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id]
    }

    /// Finds a road by name.
    pub fn road_by_name(&self, name: &str) -> Option<RoadId> {
        self.road_names.get(name).copied()
    }

    /// Iterates over the roads in the network.
    pub fn roads(&self) -> impl Iterator<Item = &Road> {
        self.roads.values()
    }

    /// Iterates over the lanes in the network.
    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Finds the lane section of a road which contains `s`.
    pub fn section_at(&self, road: RoadId, s: f64) -> Option<SectionId> {
        self.roads
            .get(road)?
            .sections()
            .iter()
            .copied()
            .find(|id| self.sections[*id].range().contains(s))
    }

    /// Finds a lane by road name, lane number and arc-length.
    pub fn lane_at(&self, road: &str, number: i32, s: f64) -> Option<LaneId> {
        let road = self.road_by_name(road)?;
        self.section(self.section_at(road, s)?).lane(number)
    }

    /// Resolves a link to one candidate lane, preferring the connections in `pc`.
    ///
    /// When a junction offers several candidates but `pc` names none of them,
    /// the first candidate is taken and the fallback is counted.
    pub fn resolve_link<'a>(&self, link: &'a Link, pc: &PreferredConnections) -> Option<&'a LinkData> {
        let Some((data, ambiguous)) = link.link_data(pc) else {
            if link.is_junction() {
                warn!(
                    "junction '{}' has no candidate lanes",
                    link.junction_id().unwrap_or_default()
                );
            }
            return None;
        };
        if ambiguous {
            self.ambiguous.fetch_add(1, Ordering::Relaxed);
            debug!(
                "no preferred connection for junction '{}' ({} candidates); taking the first",
                link.junction_id().unwrap_or_default(),
                link.target_count()
            );
        }
        Some(data)
    }

    /// The number of junction branches resolved by falling back to the first candidate.
    pub fn ambiguous_resolutions(&self) -> usize {
        self.ambiguous.load(Ordering::Relaxed)
    }
}
