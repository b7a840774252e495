use omap::{Coord, MapObject, Tag};

use crate::symbol::SymbolMatch;
use crate::tags::TagSet;

pub const DIRECTION_KEY: &str = "direction";

/// Rotation in radians for a compass bearing in degrees.
///
/// Bearings run clockwise, map rotation counter-clockwise, hence the sign.
/// Missing, non-numeric and zero directions give no rotation.
pub fn rotation_from_direction(direction: Option<&str>) -> f64 {
    let Some(degrees) = direction
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d != 0.0)
    else {
        return 0.0;
    };

    -degrees * std::f64::consts::PI / 180.0
}

fn tag_records(tags: &TagSet) -> Vec<Tag> {
    tags.iter().map(|(key, value)| Tag::new(key, value)).collect()
}

/// Objects for one classified feature: the primary object, then the
/// boundary object if the symbol has one and it is not suppressed.
///
/// Both share tags and coordinates; only the primary is rotated.
/// Nothing is built without coordinates.
pub fn build_objects(matched: &SymbolMatch, tags: &TagSet, coords: Vec<Coord>) -> Vec<MapObject> {
    if coords.is_empty() {
        return Vec::new();
    }

    let rotation = rotation_from_direction(tags.get(DIRECTION_KEY));
    let records = tag_records(tags);

    match matched.boundary_symbol() {
        Some(boundary) => {
            let outline = MapObject::new(boundary, records.clone(), coords.clone());
            let primary = MapObject::new(matched.symbol, records, coords).with_rotation(rotation);
            vec![primary, outline]
        }
        None => vec![MapObject::new(matched.symbol, records, coords).with_rotation(rotation)],
    }
}
