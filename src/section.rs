use crate::lane::{road_mark_at, Lane, LaneSide, RoadMark};
use crate::point::ArcPoint;
use crate::projection::{LaneBorders, ProjectionCache};
use crate::util::Interval;
use crate::{LaneId, RoadId, RoadNetwork, SectionId};
use std::collections::BTreeMap;

/// A slice of a road in which the set of lanes does not change.
#[derive(Clone, Debug)]
pub struct LaneSection {
    /// The lane section's ID.
    id: SectionId,
    /// The road the lane section belongs to.
    road: RoadId,
    /// The index of the lane section within its road.
    index: usize,
    /// The arc-length range of the lane section.
    range: Interval<f64>,
    /// The lanes left of the reference line, keyed by lane number.
    left: BTreeMap<i32, LaneId>,
    /// The lanes right of the reference line, keyed by lane number.
    right: BTreeMap<i32, LaneId>,
    /// The road marks on the centre line, with their absolute start.
    center_marks: Vec<(f64, RoadMark)>,
}

impl LaneSection {
    pub(crate) fn new(
        id: SectionId,
        road: RoadId,
        index: usize,
        range: Interval<f64>,
        center_marks: &[RoadMark],
    ) -> Self {
        Self {
            id,
            road,
            index,
            range,
            left: BTreeMap::new(),
            right: BTreeMap::new(),
            center_marks: center_marks
                .iter()
                .map(|m| (range.min + m.s_offset, *m))
                .collect(),
        }
    }

    pub(crate) fn insert_lane(&mut self, number: i32, lane: LaneId) {
        match LaneSide::of(number) {
            LaneSide::Left => self.left.insert(number, lane),
            LaneSide::Right => self.right.insert(number, lane),
        };
    }

    /// Gets the lane section's ID.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Gets the ID of the road the lane section belongs to.
    pub fn road(&self) -> RoadId {
        self.road
    }

    /// Gets the index of the lane section within its road.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The arc-length range of the lane section.
    pub fn range(&self) -> Interval<f64> {
        self.range
    }

    /// Gets the lane with the given number.
    pub fn lane(&self, number: i32) -> Option<LaneId> {
        match LaneSide::of(number) {
            LaneSide::Left => self.left.get(&number).copied(),
            LaneSide::Right => self.right.get(&number).copied(),
        }
    }

    /// The number of lanes in the lane section.
    pub fn lane_count(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Iterates over the lanes on one side, from the reference line outwards.
    pub fn lanes_on(&self, side: LaneSide) -> impl Iterator<Item = LaneId> + '_ {
        let (left, right) = match side {
            LaneSide::Left => (Some(self.left.values()), None),
            LaneSide::Right => (None, Some(self.right.values().rev())),
        };
        left.into_iter()
            .flatten()
            .chain(right.into_iter().flatten())
            .copied()
    }

    /// Iterates over all lanes, left lanes first.
    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.lanes_on(LaneSide::Left)
            .chain(self.lanes_on(LaneSide::Right))
    }

    /// Gets the centre line road mark at `s`.
    pub fn center_road_mark(&self, s: f64) -> Option<RoadMark> {
        if !self.range.contains(s) {
            return None;
        }
        road_mark_at(&self.center_marks, s)
    }

    /// The distance from the lane reference line to the inner border of `lane` at `s`.
    pub fn distance_from_center_line(&self, lane: &Lane, s: f64, net: &RoadNetwork) -> f64 {
        let number = lane.number();
        let inner = match lane.side() {
            LaneSide::Left => self.left.range(1..number),
            LaneSide::Right => self.right.range(number + 1..0),
        };
        inner.map(|(_, id)| net.lane(*id).width(s, net)).sum()
    }

    /// The signed lateral offset of the centre of `lane` from the road
    /// reference line at `s`, positive to the left.
    pub fn lane_center_offset(&self, lane: &Lane, s: f64, net: &RoadNetwork) -> f64 {
        let dist = self.distance_from_center_line(lane, s, net) + 0.5 * lane.width(s, net);
        let road_offset = net.road(self.road).lane_offset(s);
        match lane.side() {
            LaneSide::Left => road_offset + dist,
            LaneSide::Right => road_offset - dist,
        }
    }

    /// Samples the centre line of `lane` at `s`.
    pub fn lane_center_point(&self, lane: &Lane, s: f64, net: &RoadNetwork) -> Option<ArcPoint> {
        let point = net.road(self.road).point_on_reference_line(s)?;
        let offset = self.lane_center_offset(lane, s, net);
        let id = format!("{}_{}", point.id, lane.number());
        Some(point.offset(id, offset, Some(lane.id())))
    }

    /// Counts the driving lanes of non-zero width on one side at `s`.
    pub fn driving_lane_count(&self, s: f64, side: LaneSide, net: &RoadNetwork) -> usize {
        self.lanes_on(side)
            .map(|id| net.lane(id))
            .filter(|lane| lane.is_driving() && lane.width(s, net) > 0.0)
            .count()
    }

    /// Projects a road reference point onto the borders of every lane in the
    /// lane section, storing the result in `cache`.
    pub fn project_borders(
        &self,
        reference: &ArcPoint,
        cache: &mut ProjectionCache,
        net: &RoadNetwork,
    ) {
        let s = reference.s;
        let road = net.road(self.road);
        let lane_ref = reference.offset(reference.id.clone(), road.lane_offset(s), None);

        for side in [LaneSide::Left, LaneSide::Right] {
            let sign = match side {
                LaneSide::Left => 1.0,
                LaneSide::Right => -1.0,
            };
            let mut inner = lane_ref.clone();
            for id in self.lanes_on(side) {
                let lane = net.lane(id);
                let point_id = format!("{}_{}", reference.id, lane.number());
                let outer = inner.offset(point_id, sign * lane.width(s, net), Some(id));
                let borders = LaneBorders::new(
                    ArcPoint {
                        lane: Some(id),
                        ..inner
                    },
                    outer.clone(),
                    side,
                );
                cache.insert(id, borders);
                inner = outer;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::geometry::Geometry;
    use crate::lane::{LaneAttributes, LaneSide, LaneType, LaneWidth};
    use crate::math::{CubicRecord, Point2d};
    use crate::projection::ProjectionCache;
    use crate::road::RoadAttributes;
    use crate::util::Interval;
    use crate::{LaneId, RoadNetwork, SectionId};
    use assert_approx_eq::assert_approx_eq;

    fn network() -> (RoadNetwork, SectionId, [LaneId; 4]) {
        let mut net = RoadNetwork::new();
        let geometry = [Geometry::line(0.0, Point2d::new(0.0, 0.0), 0.0, 100.0)];
        let lane_offset = [CubicRecord::constant(0.0, 0.5)];
        let road = net
            .add_road(&RoadAttributes {
                name: "r1",
                geometry: &geometry,
                lane_offset: &lane_offset,
                ..Default::default()
            })
            .unwrap();
        let section = net
            .add_lane_section(road, Interval::new(0.0, 100.0), &[])
            .unwrap();
        let widths = [3.0, 3.5, 0.0, 2.0];
        let lanes = [(1, widths[0]), (2, widths[1]), (-1, widths[2]), (-2, widths[3])].map(
            |(number, width)| {
                let widths = [LaneWidth::Width(CubicRecord::constant(0.0, width))];
                net.add_lane(
                    section,
                    &LaneAttributes {
                        number,
                        kind: LaneType::Driving,
                        widths: &widths,
                        road_marks: &[],
                        speed_limits: &[],
                    },
                )
                .unwrap()
            },
        );
        (net, section, lanes)
    }

    #[test]
    fn lane_centres_accumulate_widths() {
        let (net, _, [l1, l2, r1, r2]) = network();
        let y = |id| net.lane(id).center_point(40.0, &net).unwrap().position.y;
        assert_approx_eq!(y(l1), 0.5 + 1.5);
        assert_approx_eq!(y(l2), 0.5 + 3.0 + 1.75);
        assert_approx_eq!(y(r1), 0.5);
        assert_approx_eq!(y(r2), 0.5 - 1.0);
        assert_eq!(net.lane(l2).center_point(40.0, &net).unwrap().lane, Some(l2));
    }

    #[test]
    fn driving_lane_count_skips_zero_width() {
        let (net, section, _) = network();
        let section = net.section(section);
        assert_eq!(section.driving_lane_count(10.0, LaneSide::Left, &net), 2);
        assert_eq!(section.driving_lane_count(10.0, LaneSide::Right, &net), 1);
    }

    #[test]
    fn borders_are_projected_per_lane() {
        let (net, section, [l1, l2, _, r2]) = network();
        let section = net.section(section);
        let reference = net.road(section.road()).point_on_reference_line(25.0).unwrap();
        let mut cache = ProjectionCache::new();
        section.project_borders(&reference, &mut cache, &net);

        assert_eq!(cache.len(), 4);
        assert_approx_eq!(cache.get(l1).unwrap().width(), 3.0);
        assert_approx_eq!(cache.get(l2).unwrap().inner.position.y, 3.5);
        assert_approx_eq!(cache.get(r2).unwrap().outer.position.y, -1.5);
        assert_approx_eq!(cache.get(r2).unwrap().inner.s, 25.0);
    }
}
