use crate::lane::Lane;
use crate::link::PreferredConnections;
use crate::network::RoadNetwork;
use crate::point::ArcPoint;
use crate::{LaneId, MAX_HOPS};
use cgmath::{EuclideanSpace, VectorSpace};
use log::info;

/// The progress of a lane change.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LaneChangeState {
    /// No lane change is in progress.
    #[default]
    Idle,
    /// The vehicle is moving from `start` to `target`.
    InProgress {
        start: LaneId,
        target: LaneId,
        /// How far the lateral move has progressed, from 0 to 1.
        travel: f64,
    },
}

impl LaneChangeState {
    /// Whether no lane change is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The progress of the lane change in progress, if any.
    pub fn travel(&self) -> Option<f64> {
        match self {
            Self::Idle => None,
            Self::InProgress { travel, .. } => Some(*travel),
        }
    }

    /// The lane being changed to, if any.
    pub fn target(&self) -> Option<LaneId> {
        match self {
            Self::Idle => None,
            Self::InProgress { target, .. } => Some(*target),
        }
    }

    /// Whether a new lane change may be started.
    pub fn can_start(&self, allow_overlapping: bool) -> bool {
        allow_overlapping || self.is_idle()
    }

    /// Starts a lane change from `current` to `target`.
    ///
    /// Returns whether the request was accepted.
    pub fn request(&mut self, current: LaneId, target: LaneId, allow_overlapping: bool) -> bool {
        if current == target || !self.can_start(allow_overlapping) {
            return false;
        }
        *self = Self::InProgress {
            start: current,
            target,
            travel: 0.0,
        };
        true
    }

    /// Moves the start and target lanes forward until they share the lane
    /// section of `current`.
    ///
    /// Abandons the lane change if either lane cannot be extended.
    pub fn extend(
        &mut self,
        current: &Lane,
        is_wrong_way: bool,
        pc: &PreferredConnections,
        net: &RoadNetwork,
    ) -> bool {
        let Self::InProgress { start, target, .. } = self else {
            return false;
        };
        let lanes = extend_lane(*start, current, is_wrong_way, pc, net)
            .zip(extend_lane(*target, current, is_wrong_way, pc, net));
        match lanes {
            Some((new_start, new_target)) => {
                *start = new_start;
                *target = new_target;
                true
            }
            None => {
                info!(
                    "abandoning lane change: lanes do not reach section of lane {}",
                    current.number()
                );
                *self = Self::Idle;
                false
            }
        }
    }

    /// Advances the lane change by one tick of `tpf` seconds.
    ///
    /// `distance` is the lateral distance between the start and target lanes.
    pub fn advance(&mut self, tpf: f64, lateral_speed: f64, distance: f64) -> f64 {
        let Self::InProgress { travel, .. } = self else {
            return 1.0;
        };
        if *travel < 1.0 {
            let step = match distance > 0.0 {
                true => tpf * lateral_speed / distance,
                false => 1.0,
            };
            *travel = f64::min(*travel + step, 1.0);
        }
        *travel
    }

    /// Ends the lane change once it is complete and the vehicle is on the
    /// target lane.
    pub fn finish(&mut self, current: LaneId) -> bool {
        match *self {
            Self::InProgress { target, travel, .. } if travel >= 1.0 && current == target => {
                *self = Self::Idle;
                true
            }
            _ => false,
        }
    }
}

/// Follows links from `lane` until reaching the lane section of `current`.
fn extend_lane(
    mut lane: LaneId,
    current: &Lane,
    is_wrong_way: bool,
    pc: &PreferredConnections,
    net: &RoadNetwork,
) -> Option<LaneId> {
    for _ in 0..=MAX_HOPS {
        let l = net.lane(lane);
        if l.section() == current.section() {
            return Some(lane);
        }
        let is_wrong_way = is_wrong_way != l.is_opposite_to(current);
        lane = l.lane_ahead(is_wrong_way, pc, net)?;
    }
    None
}

/// Blends the follow points of the start and target lanes of a lane change.
pub fn interpolate(start: &ArcPoint, target: &ArcPoint, travel: f64, lane: LaneId) -> ArcPoint {
    let position = start
        .position
        .to_vec()
        .lerp(target.position.to_vec(), travel);
    ArcPoint {
        id: format!("{}_offset", target.id),
        position: EuclideanSpace::from_vec(position),
        lane: Some(lane),
        ..target.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point3d;
    use assert_approx_eq::assert_approx_eq;
    use slotmap::KeyData;

    fn lane(n: u64) -> LaneId {
        KeyData::from_ffi((1 << 32) | n).into()
    }

    #[test]
    fn completes_after_distance_over_lateral_speed() {
        let (start, target) = (lane(1), lane(2));
        let mut state = LaneChangeState::Idle;
        assert!(state.request(start, target, false));

        let mut ticks = 0;
        while state.advance(0.1, 1.5, 3.0) < 1.0 {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(state.travel(), Some(1.0));
        assert!((19..=21).contains(&ticks));

        assert!(!state.finish(start));
        assert!(state.finish(target));
        assert!(state.is_idle());
    }

    #[test]
    fn overlapping_requests_are_refused() {
        let mut state = LaneChangeState::Idle;
        assert!(state.request(lane(1), lane(2), false));
        assert!(!state.request(lane(1), lane(3), false));
        assert!(state.request(lane(1), lane(3), true));
        assert_eq!(state.target(), Some(lane(3)));
        assert!(!LaneChangeState::Idle.request(lane(1), lane(1), true));
    }

    #[test]
    fn zero_distance_completes_at_once() {
        let mut state = LaneChangeState::Idle;
        state.request(lane(1), lane(2), false);
        assert_eq!(state.advance(0.1, 1.5, 0.0), 1.0);
    }

    #[test]
    fn interpolates_between_lanes() {
        let point = |y: f64| ArcPoint {
            id: "p".into(),
            s: 10.0,
            position: Point3d::new(10.0, y, 0.0),
            ortho: 0.0,
            curvature: None,
            geometry: None,
            lane: None,
        };
        let mid = interpolate(&point(0.0), &point(4.0), 0.25, lane(1));
        assert_approx_eq!(mid.position.y, 1.0);
        assert_eq!(mid.lane, Some(lane(1)));
        assert_eq!(mid.id, "p_offset");
    }
}
