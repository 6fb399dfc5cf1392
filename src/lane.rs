use crate::link::Link;
use crate::math::{CubicFn, CubicRecord};
use crate::point::ArcPoint;
use crate::road::{sign_at, speed_signs, SpeedRecord, SpeedSign};
use crate::traffic::TrafficObject;
use crate::util::Interval;
use crate::{LaneId, RoadId, RoadNetwork, SectionId};
use serde::{Deserialize, Serialize};

pub use lookahead::MAX_HOPS;

mod lookahead;

/// A lane: one strip of a lane section, driven in a fixed direction.
///
/// Lanes with a positive number lie left of the road's reference line and
/// are driven towards increasing `s`; lanes with a negative number lie on
/// the right and are driven towards decreasing `s`.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane's ID.
    id: LaneId,
    /// The road the lane belongs to.
    road: RoadId,
    /// The lane section the lane belongs to.
    section: SectionId,
    /// The lane number within its lane section.
    number: i32,
    /// The side of the reference line the lane lies on.
    side: LaneSide,
    /// The type of lane.
    kind: LaneType,
    /// The arc-length range of the lane, inherited from its lane section.
    range: Interval<f64>,
    /// The width or outer border functions, ordered by start.
    widths: Vec<(WidthKind, CubicFn)>,
    /// The road marks on the outer border, with their absolute start.
    road_marks: Vec<(f64, RoadMark)>,
    /// The lane's speed signs.
    speed_signs: Vec<SpeedSign>,
    /// Whether the first speed sign starts after the lane does.
    speed_gap: bool,
    /// The lane reached at the start of this lane.
    predecessor: Option<Link>,
    /// The lane reached at the end of this lane.
    successor: Option<Link>,
}

/// The attributes of a lane.
#[derive(Clone, Copy)]
pub struct LaneAttributes<'a> {
    /// The lane number; must not be zero.
    pub number: i32,
    /// The type of lane.
    pub kind: LaneType,
    /// The width or border records, relative to the start of the lane section.
    pub widths: &'a [LaneWidth],
    /// The road marks, relative to the start of the lane section.
    pub road_marks: &'a [RoadMark],
    /// The speed limits, relative to the start of the lane section.
    pub speed_limits: &'a [SpeedRecord],
}

/// The side of the reference line a lane lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneSide {
    Left,
    Right,
}

/// A position relative to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Left,
    Right,
}

/// The type of a lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneType {
    #[default]
    Driving,
    Sidewalk,
    Border,
    Shoulder,
    Restricted,
    Parking,
    Biking,
    Stop,
    Median,
    Entry,
    Exit,
    OnRamp,
    OffRamp,
    None,
}

/// The lateral extent of a lane, given either as a width or as the
/// position of the outer border relative to the lane reference line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneWidth {
    Width(CubicRecord),
    Border(CubicRecord),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WidthKind {
    Width,
    Border,
}

/// The type of a road mark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoadMarkType {
    #[default]
    None,
    Solid,
    Broken,
    SolidSolid,
    SolidBroken,
    BrokenSolid,
    BrokenBroken,
    BottsDots,
    Grass,
    Curb,
}

/// Which lane changes a road mark permits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeRule {
    Increase,
    Decrease,
    #[default]
    Both,
    None,
}

/// A road mark on the outer border of a lane, or on the centre line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoadMark {
    /// The start of the road mark, relative to the start of the lane section.
    pub s_offset: f64,
    #[serde(rename = "type")]
    pub kind: RoadMarkType,
    /// The width of the painted line in m.
    pub width: f64,
    pub lane_change: LaneChangeRule,
}

/// Lane classification as reported to driver assistance systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdasLaneType {
    Unknown,
    EmergencyLane,
    SingleLaneRoad,
    LeftMostLane,
    RightMostLane,
    MiddleLane,
}

/// Line classification as reported to driver assistance systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdasLineType {
    Dashed,
    Solid,
    Undecided,
    RoadEdge,
    Double,
    BottsDots,
    NotVisible,
    Invalid,
}

/// Occupancy of a neighbouring lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdasLaneInformation {
    NotAvailable,
    Occupied,
    Free,
}

impl LaneSide {
    /// Gets the side of a lane from its number.
    pub fn of(number: i32) -> Self {
        if number > 0 {
            LaneSide::Left
        } else {
            LaneSide::Right
        }
    }

    /// Returns the opposite side.
    pub fn invert(self) -> Self {
        match self {
            LaneSide::Left => LaneSide::Right,
            LaneSide::Right => LaneSide::Left,
        }
    }
}

impl Default for RoadMark {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl RoadMark {
    /// The road mark used when a lane specifies none.
    pub const DEFAULT: RoadMark = RoadMark {
        s_offset: 0.0,
        kind: RoadMarkType::None,
        width: 0.13,
        lane_change: LaneChangeRule::Both,
    };
}

/// Finds the road mark which applies at `s`.
pub(crate) fn road_mark_at(marks: &[(f64, RoadMark)], s: f64) -> Option<RoadMark> {
    marks
        .iter()
        .rev()
        .find(|(start, _)| s >= *start)
        .map(|(_, mark)| *mark)
}

impl Lane {
    pub(crate) fn new(
        id: LaneId,
        road: RoadId,
        section: SectionId,
        range: Interval<f64>,
        attribs: &LaneAttributes,
    ) -> Self {
        let base_s = range.min;
        let widths = attribs
            .widths
            .iter()
            .map(|w| match w {
                LaneWidth::Width(r) => (WidthKind::Width, r.to_fn(base_s)),
                LaneWidth::Border(r) => (WidthKind::Border, r.to_fn(base_s)),
            })
            .collect();
        let mut road_marks = attribs
            .road_marks
            .iter()
            .map(|m| (base_s + m.s_offset, *m))
            .collect::<Vec<_>>();
        if road_marks.is_empty() {
            road_marks.push((base_s, RoadMark::DEFAULT));
        }
        let speed_signs = speed_signs(attribs.speed_limits, base_s);
        let speed_gap = speed_signs.first().map_or(true, |sign| sign.start > base_s);

        Self {
            id,
            road,
            section,
            number: attribs.number,
            side: LaneSide::of(attribs.number),
            kind: attribs.kind,
            range,
            widths,
            road_marks,
            speed_signs,
            speed_gap,
            predecessor: None,
            successor: None,
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// Gets the ID of the road the lane belongs to.
    pub fn road(&self) -> RoadId {
        self.road
    }

    /// Gets the ID of the lane section the lane belongs to.
    pub fn section(&self) -> SectionId {
        self.section
    }

    /// Gets the lane number within its lane section.
    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn side(&self) -> LaneSide {
        self.side
    }

    pub fn kind(&self) -> LaneType {
        self.kind
    }

    pub fn is_driving(&self) -> bool {
        self.kind == LaneType::Driving
    }

    /// The arc-length range `[start_s, end_s]` of the lane.
    pub fn range(&self) -> Interval<f64> {
        self.range
    }

    pub fn start_s(&self) -> f64 {
        self.range.min
    }

    pub fn end_s(&self) -> f64 {
        self.range.max
    }

    /// Gets the length of the lane along the reference line in m.
    pub fn length(&self) -> f64 {
        self.range.length()
    }

    pub fn predecessor(&self) -> Option<&Link> {
        self.predecessor.as_ref()
    }

    pub fn successor(&self) -> Option<&Link> {
        self.successor.as_ref()
    }

    pub(crate) fn set_predecessor(&mut self, link: Link) {
        self.predecessor = Some(link);
    }

    pub(crate) fn set_successor(&mut self, link: Link) {
        self.successor = Some(link);
    }

    /// Whether this lane and `other` lie on opposite sides of the reference line.
    pub fn is_opposite_to(&self, other: &Lane) -> bool {
        self.number * other.number < 0
    }

    /// Whether moving "ahead" on this lane means moving towards increasing `s`.
    pub fn increasing_s(&self, is_wrong_way: bool) -> bool {
        (self.number > 0) != is_wrong_way
    }

    /// Gets the width of the lane at `s` in m.
    pub fn width(&self, s: f64, net: &RoadNetwork) -> f64 {
        let Some((kind, poly)) = self.widths.iter().rev().find(|(_, f)| s >= f.origin()) else {
            return 0.0;
        };
        match kind {
            WidthKind::Width => poly.y(s),
            WidthKind::Border => {
                let outer = match self.side {
                    LaneSide::Left => poly.y(s),
                    LaneSide::Right => -poly.y(s),
                };
                let inner = net
                    .section(self.section)
                    .distance_from_center_line(self, s, net);
                outer - inner
            }
        }
    }

    /// Gets the road mark on the outer border of the lane at `s`.
    pub fn road_mark(&self, s: f64) -> Option<RoadMark> {
        road_mark_at(&self.road_marks, s)
    }

    /// Gets the speed limit at `s` in km/h, falling back to the road's
    /// speed limit. Returns `None` if unlimited.
    pub fn speed_limit_kmh(&self, s: f64, net: &RoadNetwork) -> Option<f64> {
        match sign_at(&self.speed_signs, s) {
            Some(sign) => sign.kmh,
            None => net.road(self.road).speed_limit_kmh(s),
        }
    }

    /// Samples the centre line of the lane at `s`.
    pub fn center_point(&self, s: f64, net: &RoadNetwork) -> Option<ArcPoint> {
        net.section(self.section).lane_center_point(self, s, net)
    }

    /// The neighbouring lane closer to the reference line, crossing it if necessary.
    pub fn inner_neighbor(&self, net: &RoadNetwork) -> Option<LaneId> {
        let section = net.section(self.section);
        match self.number {
            1 => section.lane(-1),
            -1 => section.lane(1),
            n if n > 0 => section.lane(n - 1),
            n => section.lane(n + 1),
        }
    }

    /// The neighbouring lane farther away from the reference line.
    pub fn outer_neighbor(&self, net: &RoadNetwork) -> Option<LaneId> {
        let section = net.section(self.section);
        match self.side {
            LaneSide::Left => section.lane(self.number + 1),
            LaneSide::Right => section.lane(self.number - 1),
        }
    }

    fn has_driving_neighbor(&self, lane: Option<LaneId>, s: f64, net: &RoadNetwork) -> bool {
        lane.map(|id| net.lane(id))
            .map_or(false, |lane| lane.is_driving() && lane.width(s, net) > 0.0)
    }

    /// Gets the lane to the driver's left or right, skipping lanes of zero width.
    pub fn neighbor(
        &self,
        position: Position,
        s: f64,
        is_wrong_way: bool,
        net: &RoadNetwork,
    ) -> Option<LaneId> {
        // The reference line lies to the driver's right
        let mut outward = (position == Position::Left) != is_wrong_way;
        let mut lane = self;
        for _ in 0..net.section(self.section).lane_count() {
            let next = match outward {
                true => lane.outer_neighbor(net),
                false => lane.inner_neighbor(net),
            }?;
            let next_lane = net.lane(next);
            if next_lane.width(s, net) != 0.0 {
                return Some(next);
            }
            if next_lane.side != lane.side {
                outward = !outward;
            }
            lane = next_lane;
        }
        None
    }

    /// Classifies the lane for driver assistance systems.
    pub fn adas_lane_type(&self, s: f64, is_wrong_way: bool, net: &RoadNetwork) -> AdasLaneType {
        match self.kind {
            LaneType::Driving => {
                let inner = self.has_driving_neighbor(self.inner_neighbor(net), s, net);
                let outer = self.has_driving_neighbor(self.outer_neighbor(net), s, net);
                match (inner, outer, is_wrong_way) {
                    (true, true, _) => AdasLaneType::MiddleLane,
                    (true, false, false) | (false, true, true) => AdasLaneType::LeftMostLane,
                    (true, false, true) | (false, true, false) => AdasLaneType::RightMostLane,
                    (false, false, _) => AdasLaneType::SingleLaneRoad,
                }
            }
            LaneType::Shoulder => AdasLaneType::EmergencyLane,
            _ => AdasLaneType::Unknown,
        }
    }

    /// Classifies the line to the driver's left or right.
    pub fn line_type(
        &self,
        position: Position,
        s: f64,
        is_wrong_way: bool,
        net: &RoadNetwork,
    ) -> AdasLineType {
        if !self.is_driving() {
            return AdasLineType::Invalid;
        }
        let neighbor = match self.neighbor(position, s, is_wrong_way, net) {
            Some(id) if net.lane(id).is_driving() => net.lane(id),
            _ => return AdasLineType::RoadEdge,
        };

        // Road marks lie on the outer border of their lane
        let own_border = (position == Position::Left) != is_wrong_way;
        let mark = if own_border {
            self.road_mark(s)
        } else if neighbor.side != self.side {
            net.section(self.section).center_road_mark(s)
        } else {
            neighbor.road_mark(s)
        };

        match mark.map(|m| m.kind) {
            Some(RoadMarkType::BottsDots) => AdasLineType::BottsDots,
            Some(RoadMarkType::Broken | RoadMarkType::BrokenBroken) => AdasLineType::Dashed,
            Some(RoadMarkType::Solid) => AdasLineType::Solid,
            Some(RoadMarkType::SolidSolid) => AdasLineType::Double,
            Some(RoadMarkType::Curb | RoadMarkType::Grass) => AdasLineType::RoadEdge,
            Some(RoadMarkType::None) => AdasLineType::NotVisible,
            _ => AdasLineType::Undecided,
        }
    }

    /// Reports whether the lane to the driver's left or right exists and
    /// whether any traffic lies on it within `distance_ahead` in front of or
    /// `distance_behind` behind the vehicle.
    #[allow(clippy::too_many_arguments)]
    pub fn lane_information(
        &self,
        position: Position,
        s: f64,
        is_wrong_way: bool,
        distance_ahead: f64,
        distance_behind: f64,
        traffic: &[TrafficObject],
        net: &RoadNetwork,
    ) -> AdasLaneInformation {
        let neighbor = match self.neighbor(position, s, is_wrong_way, net) {
            Some(id) if net.lane(id).is_driving() => net.lane(id),
            _ => return AdasLaneInformation::NotAvailable,
        };
        let increasing = self.increasing_s(is_wrong_way);
        if neighbor.has_traffic(s, increasing, distance_ahead, distance_behind, traffic, net) {
            AdasLaneInformation::Occupied
        } else {
            AdasLaneInformation::Free
        }
    }
}
