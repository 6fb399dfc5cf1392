use crate::geometry::Geometry;
use crate::math::{CubicRecord, PiecewiseCubic, Point3d};
use crate::point::ArcPoint;
use crate::util::Interval;
use crate::{RoadId, SectionId};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Queries this far beyond either end of a road still sample its end points, in m.
const S_TOLERANCE: f64 = 1e-6;

/// Conversion factor from mph to km/h.
const MPH_TO_KMH: f64 = 1.609344;

/// Conversion factor from m/s to km/h.
const MS_TO_KMH: f64 = 3.6;

/// A road: one arc-length axis shared by an ordered list of lane sections.
#[derive(Clone, Debug)]
pub struct Road {
    /// The road's ID.
    id: RoadId,
    /// The road's name in the road description.
    name: String,
    /// The length of the road's reference line in m.
    length: f64,
    /// The plan view, ordered by `s`.
    geometry: Vec<Geometry>,
    /// Lateral shift of the lane reference line from the road reference line.
    lane_offset: PiecewiseCubic,
    /// Height of the reference line above the ground plane.
    elevation: PiecewiseCubic,
    /// Speed limits along the road, in km/h.
    speed_signs: Vec<SpeedSign>,
    /// The lane sections, ordered by `s`.
    sections: Vec<SectionId>,
    /// The junction this road belongs to, if any.
    junction: Option<String>,
}

/// The attributes of a road.
#[derive(Clone, Copy, Default)]
pub struct RoadAttributes<'a> {
    /// The road's name, unique within a network.
    pub name: &'a str,
    /// The plan view of the reference line.
    pub geometry: &'a [Geometry],
    /// The lane offset records, relative to `s = 0`.
    pub lane_offset: &'a [CubicRecord],
    /// The elevation records, relative to `s = 0`.
    pub elevation: &'a [CubicRecord],
    /// The speed limits of the road, relative to `s = 0`.
    pub speed_limits: &'a [SpeedRecord],
    /// The junction the road belongs to.
    pub junction: Option<&'a str>,
}

/// A speed sign as found in a road description.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedRecord {
    /// The start of the record, relative to its road or lane section.
    #[serde(default)]
    pub s_offset: f64,
    /// The speed limit, or `None` if unlimited.
    pub max: Option<f64>,
    /// The unit of `max`.
    #[serde(default)]
    pub unit: SpeedUnit,
}

/// The unit of a [SpeedRecord].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "km/h")]
    Kmh,
    #[serde(rename = "mph")]
    Mph,
    #[serde(rename = "m/s")]
    Ms,
}

/// A speed limit which applies from `start` onwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SpeedSign {
    /// The absolute arc-length at which the sign applies.
    pub start: f64,
    /// The speed limit in km/h, or `None` if unlimited.
    pub kmh: Option<f64>,
}

impl SpeedRecord {
    /// The speed limit converted to km/h.
    pub fn kmh(&self) -> Option<f64> {
        let factor = match self.unit {
            SpeedUnit::Kmh => 1.0,
            SpeedUnit::Mph => MPH_TO_KMH,
            SpeedUnit::Ms => MS_TO_KMH,
        };
        self.max.map(|max| factor * max)
    }
}

/// Converts speed records into signs at absolute arc-lengths, ordered by `start`.
pub(crate) fn speed_signs(records: &[SpeedRecord], base_s: f64) -> Vec<SpeedSign> {
    let mut signs = records
        .iter()
        .map(|r| SpeedSign {
            start: base_s + r.s_offset,
            kmh: r.kmh(),
        })
        .collect::<Vec<_>>();
    signs.sort_by(|a, b| a.start.total_cmp(&b.start));
    signs
}

/// Finds the sign which applies at `s`.
pub(crate) fn sign_at(signs: &[SpeedSign], s: f64) -> Option<&SpeedSign> {
    signs.iter().rev().find(|sign| s >= sign.start)
}

impl Road {
    pub(crate) fn new(id: RoadId, attribs: &RoadAttributes) -> Self {
        let mut geometry = attribs.geometry.to_vec();
        geometry.sort_by(|a, b| a.s.total_cmp(&b.s));
        let length = geometry
            .iter()
            .map(Geometry::end_s)
            .fold(0.0, f64::max);
        Self {
            id,
            name: attribs.name.to_owned(),
            length,
            geometry,
            lane_offset: PiecewiseCubic::new(attribs.lane_offset.iter().map(|r| r.to_fn(0.0))),
            elevation: PiecewiseCubic::new(attribs.elevation.iter().map(|r| r.to_fn(0.0))),
            speed_signs: speed_signs(attribs.speed_limits, 0.0),
            sections: vec![],
            junction: attribs.junction.map(str::to_owned),
        }
    }

    /// Gets the road's ID.
    pub fn id(&self) -> RoadId {
        self.id
    }

    /// Gets the road's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the length of the road in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The ID of the junction the road belongs to, if any.
    pub fn junction(&self) -> Option<&str> {
        self.junction.as_deref()
    }

    /// The lane sections of the road, ordered by `s`.
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub(crate) fn push_section(&mut self, section: SectionId) {
        self.sections.push(section);
    }

    /// The lateral shift of the lane reference line at `s`, positive to the left.
    pub fn lane_offset(&self, s: f64) -> f64 {
        self.lane_offset.y(s)
    }

    /// The road's speed limit at `s` in km/h, or `None` if unlimited.
    pub fn speed_limit_kmh(&self, s: f64) -> Option<f64> {
        sign_at(&self.speed_signs, s).and_then(|sign| sign.kmh)
    }

    /// The arc-lengths within `range` at which the road's speed limit changes.
    pub(crate) fn speed_changes(&self, range: Interval<f64>) -> impl Iterator<Item = f64> + '_ {
        self.speed_signs
            .iter()
            .map(|sign| sign.start)
            .filter(move |s| *s > range.min && *s < range.max)
    }

    /// Samples the reference line at `s`.
    ///
    /// Returns `None` if `s` lies outside of the road.
    pub fn point_on_reference_line(&self, s: f64) -> Option<ArcPoint> {
        if s < -S_TOLERANCE || s > self.length + S_TOLERANCE {
            return None;
        }
        let s = s.clamp(0.0, self.length);
        let idx = self
            .geometry
            .iter()
            .rposition(|geom| geom.s <= s)
            .unwrap_or(0);
        let sample = self.geometry.get(idx)?.sample(s);
        Some(ArcPoint {
            id: format!("{}_{:.3}", self.name, s),
            s,
            position: Point3d::new(sample.pos.x, sample.pos.y, self.elevation.y(s)),
            ortho: sample.hdg + FRAC_PI_2,
            curvature: Some(sample.curvature),
            geometry: Some(idx),
            lane: None,
        })
    }
}
