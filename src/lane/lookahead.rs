//! Queries which look along a lane and across its boundaries into
//! linked lanes.

use super::Lane;
use crate::error::TraversalError;
use crate::link::{ContactPoint, PreferredConnections};
use crate::point::{ArcPoint, Intersection, RoadPosition, SpeedLimit};
use crate::traffic::TrafficObject;
use crate::util::Interval;
use crate::{LaneId, RoadNetwork};
use itertools::Itertools;
use log::{debug, warn};
use smallvec::SmallVec;

/// The maximum number of lanes a single traversal may enter.
pub const MAX_HOPS: usize = 100;

/// A position reached while walking the lane graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cursor {
    /// The lane walked along.
    pub lane: LaneId,
    /// The arc-length at which the lane was entered.
    pub s: f64,
    /// Whether the lane is walked towards increasing `s`.
    pub increasing: bool,
    /// The distance walked before entering the lane.
    pub traveled: f64,
}

impl Cursor {
    /// The remaining distance to the boundary the cursor is walking towards.
    pub fn to_boundary(&self, net: &RoadNetwork) -> f64 {
        let lane = net.lane(self.lane);
        match self.increasing {
            true => lane.end_s() - self.s,
            false => self.s - lane.start_s(),
        }
        .max(0.0)
    }

    /// The arc-length reached after moving `dist` further along the lane.
    pub fn advance(&self, dist: f64) -> f64 {
        match self.increasing {
            true => self.s + dist,
            false => self.s - dist,
        }
    }
}

/// Crosses the boundary `cursor` is walking towards into the linked lane.
pub(crate) fn step(
    cursor: &Cursor,
    pc: &PreferredConnections,
    net: &RoadNetwork,
) -> Result<Cursor, TraversalError> {
    let lane = net.lane(cursor.lane);
    let link = match cursor.increasing {
        true => lane.successor(),
        false => lane.predecessor(),
    };
    let Some(data) = link.and_then(|link| net.resolve_link(link, pc)) else {
        debug!(
            "no {} available (lane {}; road {})",
            if cursor.increasing { "successor" } else { "predecessor" },
            lane.number(),
            net.road(lane.road()).name()
        );
        return Err(TraversalError::DeadEnd);
    };

    // Entering at the start means moving towards increasing s
    let next = net.lane(data.lane);
    let (s, increasing) = match data.contact {
        ContactPoint::Start => (next.start_s(), true),
        ContactPoint::End => (next.end_s(), false),
    };
    Ok(Cursor {
        lane: data.lane,
        s,
        increasing,
        traveled: cursor.traveled + cursor.to_boundary(net),
    })
}

/// Walks the lane graph from a starting cursor, yielding the cursor of every
/// lane entered. Never enters a lane twice, and never more than [MAX_HOPS]
/// lanes.
pub(crate) struct Walk<'a> {
    net: &'a RoadNetwork,
    pc: &'a PreferredConnections,
    next: Option<Cursor>,
    last: Option<Cursor>,
    visited: SmallVec<[LaneId; 8]>,
    /// Why the walk stopped, once it has.
    pub stop: Option<TraversalError>,
    /// The cursor refused by a cycle or the hop limit.
    pub refused: Option<Cursor>,
}

impl<'a> Walk<'a> {
    pub fn new(start: Cursor, pc: &'a PreferredConnections, net: &'a RoadNetwork) -> Self {
        Self {
            net,
            pc,
            next: Some(start),
            last: None,
            visited: SmallVec::new(),
            stop: None,
            refused: None,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Cursor> {
        if self.stop.is_some() {
            return None;
        }
        let cursor = match (self.next.take(), self.last) {
            (Some(cursor), _) => cursor,
            (None, Some(last)) => match step(&last, self.pc, self.net) {
                Ok(cursor) => cursor,
                Err(err) => {
                    self.stop = Some(err);
                    return None;
                }
            },
            (None, None) => return None,
        };
        if self.visited.contains(&cursor.lane) {
            warn!("cycle detected while walking the lane graph");
            self.stop = Some(TraversalError::CycleDetected);
            self.refused = Some(cursor);
            return None;
        }
        if self.visited.len() >= MAX_HOPS {
            warn!("lane graph walk exceeded {} lanes", MAX_HOPS);
            self.stop = Some(TraversalError::HopLimit(MAX_HOPS));
            self.refused = Some(cursor);
            return None;
        }
        self.visited.push(cursor.lane);
        self.last = Some(cursor);
        Some(cursor)
    }
}

impl Lane {
    /// Creates a cursor at `s` on this lane, or `None` if `s` lies outside of it.
    fn cursor(&self, s: f64, increasing: bool, query: &str) -> Option<Cursor> {
        if !self.range.contains(s) {
            debug!(
                "s={} is out of lane {} [{}, {}] ({})",
                s, self.number, self.range.min, self.range.max, query
            );
            return None;
        }
        Some(Cursor {
            lane: self.id,
            s,
            increasing,
            traveled: 0.0,
        })
    }

    /// Walks `range` m from `s` and returns where that ends, along with the
    /// lanes walked through, in order.
    fn walk_to(
        &self,
        s: f64,
        range: f64,
        increasing: bool,
        pc: &PreferredConnections,
        net: &RoadNetwork,
        query: &str,
    ) -> Option<(LaneId, f64, SmallVec<[LaneId; 8]>)> {
        let (increasing, range) = match range < 0.0 {
            true => (!increasing, -range),
            false => (increasing, range),
        };
        let start = self.cursor(s, increasing, query)?;
        let mut walk = Walk::new(start, pc, net);
        while let Some(cursor) = walk.next() {
            let remaining = range - cursor.traveled;
            if remaining <= cursor.to_boundary(net) {
                return Some((cursor.lane, cursor.advance(remaining), walk.visited.clone()));
            }
        }
        None
    }

    /// Finds the point on the centre of the lane graph `range` m ahead of `s`.
    ///
    /// The walk crosses into linked lanes as needed, choosing branches
    /// with `pc`. A negative `range` looks behind instead.
    pub fn point_ahead(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Option<ArcPoint> {
        self.point_ahead_traversed(is_wrong_way, s, range, pc, net)
            .map(|(point, _)| point)
    }

    /// Like [Lane::point_ahead], but also returns every lane between this
    /// lane and the lane of the point, inclusive, in order.
    pub fn point_ahead_traversed(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Option<(ArcPoint, Vec<LaneId>)> {
        let increasing = self.increasing_s(is_wrong_way);
        let (lane, s, traversed) = self.walk_to(s, range, increasing, pc, net, "point_ahead")?;
        let point = net.lane(lane).center_point(s, net)?;
        Some((point, traversed.into_vec()))
    }

    /// Finds the point on the centre of the lane graph `range` m behind `s`.
    pub fn point_behind(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Option<ArcPoint> {
        self.point_ahead(is_wrong_way, s, -range, pc, net)
    }

    /// Finds the point on the reference line of the road `range` m ahead of `s`.
    pub fn reference_point_ahead(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Option<ArcPoint> {
        let increasing = self.increasing_s(is_wrong_way);
        let (lane, s, _) = self.walk_to(s, range, increasing, pc, net, "reference_point_ahead")?;
        net.road(net.lane(lane).road()).point_on_reference_line(s)
    }

    /// Gets the lane entered at the boundary ahead.
    pub fn lane_ahead(
        &self,
        is_wrong_way: bool,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Option<LaneId> {
        let increasing = self.increasing_s(is_wrong_way);
        let s = match increasing {
            true => self.end_s(),
            false => self.start_s(),
        };
        let cursor = self.cursor(s, increasing, "lane_ahead")?;
        step(&cursor, pc, net).ok().map(|c| c.lane)
    }

    /// Lists the changes in speed limit within `range` m ahead of `s`.
    ///
    /// The first entry always lies at distance 0 and holds the speed limit
    /// which currently applies. Each further entry marks a change.
    pub fn speed_limits_ahead(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Vec<SpeedLimit> {
        let increasing = self.increasing_s(is_wrong_way);
        let Some(start) = self.cursor(s, increasing, "speed_limits_ahead") else {
            return vec![];
        };
        let mut limits = vec![];
        for cursor in Walk::new(start, pc, net) {
            net.lane(cursor.lane).push_speed_limits(&cursor, &mut limits, net);
            if cursor.traveled + cursor.to_boundary(net) >= range {
                break;
            }
        }
        trim_speed_limits(limits, range)
    }

    /// Lists the speed signs of this lane, relative to `cursor`.
    ///
    /// Where the lane has no sign of its own, the road's limits apply, and
    /// every change in the road's limit is listed too.
    fn push_speed_limits(&self, cursor: &Cursor, limits: &mut Vec<SpeedLimit>, net: &RoadNetwork) {
        let base = cursor.traveled;
        let signs = &self.speed_signs;
        let unsigned = match self.speed_gap {
            true => {
                let end = signs.first().map_or(self.end_s(), |sign| sign.start);
                Some(Interval::new(self.start_s(), end))
            }
            false => None,
        };
        if cursor.increasing {
            limits.extend(signs.iter().map(|sign| SpeedLimit {
                distance: base + sign.start - cursor.s,
                speed: sign.kmh,
            }));
        } else {
            // Each sign applies until the next one, so it is reached at its end
            let ends = signs
                .iter()
                .skip(1)
                .map(|sign| sign.start)
                .chain(Some(self.end_s()));
            limits.extend(signs.iter().zip(ends).map(|(sign, end)| SpeedLimit {
                distance: base + cursor.s - end,
                speed: sign.kmh,
            }));
        }

        let Some(unsigned) = unsigned else {
            return;
        };
        let road = net.road(self.road);
        let bounds: SmallVec<[f64; 4]> = Some(unsigned.min)
            .into_iter()
            .chain(road.speed_changes(unsigned))
            .chain(Some(unsigned.max))
            .collect();
        limits.extend(bounds.iter().tuple_windows().map(|(start, end)| {
            let distance = match cursor.increasing {
                true => base + start - cursor.s,
                false => base + cursor.s - end,
            };
            SpeedLimit {
                distance,
                speed: road.speed_limit_kmh(*start),
            }
        }));
    }

    /// Lists the junctions with more than one way onwards within `range` m ahead of `s`.
    pub fn intersections_ahead(
        &self,
        is_wrong_way: bool,
        s: f64,
        range: f64,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> Vec<Intersection> {
        let increasing = self.increasing_s(is_wrong_way);
        let Some(start) = self.cursor(s, increasing, "intersections_ahead") else {
            return vec![];
        };
        let mut intersections = vec![];
        for cursor in Walk::new(start, pc, net) {
            let distance = cursor.traveled + cursor.to_boundary(net);
            if distance > range {
                break;
            }
            let lane = net.lane(cursor.lane);
            let link = match cursor.increasing {
                true => lane.successor(),
                false => lane.predecessor(),
            };
            if let Some(link) = link.filter(|link| link.is_branch()) {
                intersections.push(Intersection {
                    distance,
                    junction: link.junction_id().unwrap_or_default().to_owned(),
                });
            }
        }
        intersections.retain(|i| i.distance > 0.0 && i.distance <= range);
        intersections.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        intersections
    }

    /// Gets the distance from `s` to a target position ahead.
    ///
    /// Fails if the target does not lie on a lane, or if the target is not
    /// reached before a dead end, a lane is entered twice or [MAX_HOPS]
    /// lanes were entered.
    pub fn distance_to_target(
        &self,
        is_wrong_way: bool,
        s: f64,
        pc: &PreferredConnections,
        target: &RoadPosition,
        net: &RoadNetwork,
    ) -> Result<f64, TraversalError> {
        let target_lane = net
            .lane_at(&target.road, target.lane, target.s)
            .ok_or_else(|| TraversalError::UnknownTarget(target.to_string()))?;
        let start = self
            .cursor(s, self.increasing_s(is_wrong_way), "distance_to_target")
            .ok_or(TraversalError::OutOfLane {
                s,
                start: self.start_s(),
                end: self.end_s(),
            })?;
        let reached = |cursor: &Cursor| {
            if cursor.lane != target_lane {
                return None;
            }
            let dist = match cursor.increasing {
                true => target.s - cursor.s,
                false => cursor.s - target.s,
            };
            (dist >= 0.0).then_some(cursor.traveled + dist)
        };

        let mut walk = Walk::new(start, pc, net);
        while let Some(cursor) = walk.next() {
            if let Some(distance) = reached(&cursor) {
                return Ok(distance);
            }
        }
        // A target behind the start is still reached by coming round again
        if let Some(distance) = walk.refused.as_ref().and_then(reached) {
            return Ok(distance);
        }
        debug!("{} not reached", target);
        Err(walk.stop.take().unwrap_or(TraversalError::DeadEnd))
    }

    /// Whether `traffic_lane` holds traffic at `traffic_s` within `range` m
    /// from `s`, walking towards increasing `s` if `increasing` is set.
    #[allow(clippy::too_many_arguments)]
    pub fn is_traffic_ahead(
        &self,
        s: f64,
        range: f64,
        increasing: bool,
        pc: &PreferredConnections,
        traffic_lane: LaneId,
        traffic_s: f64,
        net: &RoadNetwork,
    ) -> bool {
        let Some(start) = self.cursor(s, increasing, "is_traffic_ahead") else {
            return false;
        };
        for cursor in Walk::new(start, pc, net) {
            let remaining = range - cursor.traveled;
            if cursor.lane == traffic_lane {
                let end = cursor.advance(remaining);
                let (min, max) = match cursor.increasing {
                    true => (cursor.s, end),
                    false => (end, cursor.s),
                };
                if min <= traffic_s && traffic_s <= max {
                    return true;
                }
            }
            if remaining <= cursor.to_boundary(net) {
                break;
            }
        }
        false
    }

    /// Whether any of `traffic` lies on this lane within `distance_ahead` m
    /// ahead of or `distance_behind` m behind `s`.
    pub fn has_traffic(
        &self,
        s: f64,
        increasing: bool,
        distance_ahead: f64,
        distance_behind: f64,
        traffic: &[TrafficObject],
        net: &RoadNetwork,
    ) -> bool {
        let pc = PreferredConnections::new();
        traffic.iter().any(|obj| {
            let Some(lane) = obj.lane else {
                return false;
            };
            self.is_traffic_ahead(s, distance_ahead, increasing, &pc, lane, obj.s, net)
                || self.is_traffic_ahead(s, distance_behind, !increasing, &pc, lane, obj.s, net)
        })
    }
}

/// Orders a list of speed limits and reduces it to the changes within `range`.
fn trim_speed_limits(mut limits: Vec<SpeedLimit>, range: f64) -> Vec<SpeedLimit> {
    limits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    // Everything at or behind the origin collapses into the limit that applies there
    let current = limits
        .iter()
        .rev()
        .find(|limit| limit.distance <= 0.0)
        .map(|limit| limit.speed);
    let ahead = limits
        .into_iter()
        .filter(|limit| limit.distance > 0.0 && limit.distance <= range);

    current
        .map(|speed| SpeedLimit {
            distance: 0.0,
            speed,
        })
        .into_iter()
        .chain(ahead)
        .dedup_by(|a, b| a.speed == b.speed)
        .collect()
}
