//! Projected source coordinates to map units.
//!
//! The input is expected to be in a projected CRS already (metres); no
//! reprojection happens here. Coordinates are moved to the bbox center,
//! scaled to map units and flipped so Y grows downwards.

use regex::Regex;
use std::sync::OnceLock;

use omap::{units_per_meter, ProjectedCrs};

/// A point in map units relative to the reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// Affine transform from source coordinates to map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    center: [f64; 2],
    multiplier: f64,
}

impl Projector {
    pub fn new(center: [f64; 2], scale: u32) -> Self {
        Self {
            center,
            multiplier: units_per_meter(scale),
        }
    }

    /// Projector centered on the midpoint of `[min_x, min_y, max_x, max_y]`.
    pub fn for_bbox(bbox: [f64; 4], scale: u32) -> Self {
        Self::new(bbox_center(bbox), scale)
    }

    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    #[inline]
    pub fn project(&self, [x, y]: [f64; 2]) -> ProjectedPoint {
        ProjectedPoint {
            x: (x - self.center[0]) * self.multiplier,
            y: (y - self.center[1]) * self.multiplier * -1.0,
        }
    }

    /// Inverse of [`Projector::project`].
    #[inline]
    pub fn unproject(&self, point: ProjectedPoint) -> [f64; 2] {
        [
            point.x / self.multiplier + self.center[0],
            point.y / -self.multiplier + self.center[1],
        ]
    }
}

#[inline]
pub fn bbox_center([min_x, min_y, max_x, max_y]: [f64; 4]) -> [f64; 2] {
    [(min_x + max_x) / 2.0, (min_y + max_y) / 2.0]
}

/// Get the EPSG reference regex pattern.
///
/// Matches `EPSG:23700`, `epsg::3857` and OGC URNs like
/// `urn:ogc:def:crs:EPSG::32633`. Group 1 is the numeric code.
fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)EPSG[^0-9]+([0-9]+)").unwrap())
}

/// Extracts the EPSG code from a CRS name; `None` if there is none or it
/// does not fit a `u32`.
pub fn parse_epsg(crs_name: &str) -> Option<ProjectedCrs> {
    let captures = epsg_pattern().captures(crs_name)?;
    let epsg = captures.get(1)?.as_str().parse().ok()?;
    Some(ProjectedCrs { epsg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use omap::DEFAULT_SCALE;

    #[test]
    fn center_maps_to_origin() {
        for bbox in [[0.0, 0.0, 2.0, 2.0], [650_000.0, 240_000.0, 652_000.0, 241_500.0]] {
            let projector = Projector::for_bbox(bbox, DEFAULT_SCALE);
            let origin = projector.project(bbox_center(bbox));
            assert_eq!(origin.x, 0.0);
            assert_eq!(origin.y, 0.0);
        }
    }

    #[test]
    fn scales_and_flips_y() {
        let projector = Projector::new([100.0, 200.0], DEFAULT_SCALE);
        let point = projector.project([115.0, 215.0]);
        assert!((point.x - 1000.0).abs() < 1e-9);
        assert!((point.y + 1000.0).abs() < 1e-9);

        let projector = Projector::new([0.0, 0.0], 10_000);
        let point = projector.project([1.0, -1.0]);
        assert!((point.x - 100.0).abs() < 1e-9);
        assert!((point.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn unproject_recovers_offsets() {
        for scale in [1_000, 4_000, 10_000, 15_000, 25_000] {
            let projector = Projector::new([650_123.25, 240_987.5], scale);
            for source in [
                [650_000.0, 240_000.0],
                [651_234.5, 239_876.125],
                [650_123.25, 240_987.5],
            ] {
                let back = projector.unproject(projector.project(source));
                assert!((back[0] - source[0]).abs() < 1e-6);
                assert!((back[1] - source[1]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn epsg_codes() {
        assert_eq!(parse_epsg("EPSG:23700"), Some(ProjectedCrs { epsg: 23700 }));
        assert_eq!(parse_epsg("urn:ogc:def:crs:EPSG::32633"), Some(ProjectedCrs { epsg: 32633 }));
        assert_eq!(parse_epsg("epsg - 3857"), Some(ProjectedCrs { epsg: 3857 }));
        assert_eq!(parse_epsg("urn:ogc:def:crs:OGC:1.3:CRS84"), None);
        assert_eq!(parse_epsg("EPSG23700"), None);
        assert_eq!(parse_epsg(""), None);
    }
}
