use super::RoadNetwork;
use crate::link::{ContactPoint, PreferredConnections};
use crate::point::RoadPosition;
use crate::LaneId;
use log::{debug, info};
use pathfinding::directed::dijkstra::dijkstra;

/// A lane and the direction it is travelled in (`true` = increasing `s`).
type Node = (LaneId, bool);

impl RoadNetwork {
    /// Finds the shortest route between two positions, expressed as the
    /// junction connections to take along the way.
    ///
    /// The route sets off against the start lane's direction of travel if
    /// `is_wrong_way` is set.
    ///
    /// Returns `None` if either position does not lie on a lane, or if the
    /// target cannot be reached.
    pub fn shortest_route(
        &self,
        start: &RoadPosition,
        target: &RoadPosition,
        is_wrong_way: bool,
    ) -> Option<PreferredConnections> {
        let start_lane = self.lane_at(&start.road, start.lane, start.s)?;
        let target_lane = self.lane_at(&target.road, target.lane, target.s)?;
        let start_node = (start_lane, self.lane(start_lane).increasing_s(is_wrong_way));

        let result = dijkstra(
            &start_node,
            |node| self.route_successors(*node),
            |node| node.0 == target_lane,
        );
        let Some((path, cost)) = result else {
            info!("no route from {} to {}", start, target);
            return None;
        };
        debug!(
            "route from {} to {} crosses {} lanes ({} mm)",
            start,
            target,
            path.len(),
            cost
        );

        let mut pc = PreferredConnections::new();
        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let lane = self.lane(from.0);
            let link = match from.1 {
                true => lane.successor(),
                false => lane.predecessor(),
            };
            let Some(link) = link else { continue };
            let Some(junction) = link.junction_id() else { continue };
            let data = link
                .targets()
                .iter()
                .find(|data| data.lane == to.0 && (data.contact == ContactPoint::Start) == to.1);
            if let Some(connection) = data.and_then(|data| data.connection.as_deref()) {
                pc.add_connection(junction, connection);
            }
        }
        Some(pc)
    }

    /// The lanes reachable by leaving a lane at the end it is travelled towards,
    /// weighted by the lane's length in mm.
    fn route_successors(&self, (id, increasing): Node) -> Vec<(Node, u64)> {
        let lane = self.lane(id);
        let link = match increasing {
            true => lane.successor(),
            false => lane.predecessor(),
        };
        let cost = (1000.0 * lane.length()) as u64;
        link.map(|link| {
            link.targets()
                .iter()
                .map(|data| ((data.lane, data.contact == ContactPoint::Start), cost))
                .collect()
        })
        .unwrap_or_default()
    }
}
