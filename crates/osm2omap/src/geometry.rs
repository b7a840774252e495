use omap::{Coord, COORD_FLAG_RING_CLOSE};

use crate::geojson::{Geometry, Position};
use crate::projection::Projector;

#[inline]
fn coord(projector: &Projector, Position(xy): Position, flags: u32) -> Coord {
    let point = projector.project(xy);
    Coord::new(point.x, point.y, flags)
}

/// Coordinate records for `geometry`, in source order.
///
/// Every vertex carries `flags`. On multipolygons the last vertex of each
/// ring additionally carries the ring-closure flag; the closing vertex that
/// repeats the first one is kept. Unsupported geometries yield nothing.
pub fn emit_coords(geometry: &Geometry, projector: &Projector, flags: u32) -> Vec<Coord> {
    match geometry {
        Geometry::Point { coordinates } => vec![coord(projector, *coordinates, flags)],
        Geometry::LineString { coordinates } => coordinates
            .iter()
            .map(|&position| coord(projector, position, flags))
            .collect(),
        Geometry::MultiPolygon { coordinates } => {
            let mut coords = Vec::with_capacity(coordinates.iter().flatten().map(Vec::len).sum());
            for ring in coordinates.iter().flatten() {
                let last = ring.len().saturating_sub(1);
                for (index, &position) in ring.iter().enumerate() {
                    let flags = if index == last {
                        flags | COORD_FLAG_RING_CLOSE
                    } else {
                        flags
                    };
                    coords.push(coord(projector, position, flags));
                }
            }
            coords
        }
        Geometry::Unsupported => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omap::DEFAULT_SCALE;

    fn projector() -> Projector {
        Projector::for_bbox([0.0, 0.0, 30.0, 30.0], DEFAULT_SCALE)
    }

    fn positions(points: &[[f64; 2]]) -> Vec<Position> {
        points.iter().copied().map(Position).collect()
    }

    #[test]
    fn point_keeps_base_flags() {
        let geometry = Geometry::Point {
            coordinates: Position([15.0, 15.0]),
        };
        let coords = emit_coords(&geometry, &projector(), 32);
        assert_eq!(coords, vec![Coord::new(0.0, 0.0, 32)]);
    }

    #[test]
    fn line_string_keeps_order() {
        let geometry = Geometry::LineString {
            coordinates: positions(&[[0.0, 0.0], [15.0, 15.0], [30.0, 30.0]]),
        };
        let coords = emit_coords(&geometry, &projector(), 0);
        assert_eq!(coords.len(), 3);
        assert!(coords[0].x < 0.0 && coords[0].y > 0.0);
        assert_eq!((coords[1].x, coords[1].y), (0.0, 0.0));
        assert!(coords[2].x > 0.0 && coords[2].y < 0.0);
        assert!(coords.iter().all(|c| c.flags == 0));
    }

    #[test]
    fn ring_closure_on_last_vertex_only() {
        let ring = positions(&[[0.0, 0.0], [30.0, 0.0], [30.0, 30.0], [0.0, 0.0]]);
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![vec![ring]],
        };
        let coords = emit_coords(&geometry, &projector(), 0);

        assert_eq!(coords.len(), 4);
        let flags: Vec<u32> = coords.iter().map(|c| c.flags).collect();
        assert_eq!(flags, vec![0, 0, 0, COORD_FLAG_RING_CLOSE]);
        assert_eq!(coords[0], Coord::new(coords[3].x, coords[3].y, 0));
    }

    #[test]
    fn every_ring_of_every_polygon_is_closed() {
        let outer = positions(&[[0.0, 0.0], [30.0, 0.0], [30.0, 30.0], [0.0, 0.0]]);
        let hole = positions(&[[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 10.0]]);
        let other = positions(&[[1.0, 1.0], [2.0, 1.0], [1.0, 1.0]]);
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![vec![outer, hole], vec![other]],
        };
        let coords = emit_coords(&geometry, &projector(), 4);

        assert_eq!(coords.len(), 11);
        let closed: Vec<usize> = coords
            .iter()
            .enumerate()
            .filter(|(_, c)| c.flags == 4 | COORD_FLAG_RING_CLOSE)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(closed, vec![3, 7, 10]);
        assert!(coords.iter().all(|c| c.flags & 4 == 4));
    }

    #[test]
    fn unsupported_yields_nothing() {
        assert!(emit_coords(&Geometry::Unsupported, &projector(), 0).is_empty());
        assert!(emit_coords(
            &Geometry::LineString {
                coordinates: vec![]
            },
            &projector(),
            0
        )
        .is_empty());
    }
}
