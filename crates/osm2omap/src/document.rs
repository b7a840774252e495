//! Whole-collection conversion: georeference, per-feature objects, template.

use std::fmt;
use std::io::{self, Write};

use log::{debug, warn};
use omap::{
    missing_markers, render_template, write_document, Georeference, MapObject, DEFAULT_SCALE,
};

use crate::geojson::{Feature, FeatureCollection};
use crate::geometry::emit_coords;
use crate::object::build_objects;
use crate::projection::{parse_epsg, Projector};
use crate::symbol;
use crate::tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Map scale denominator.
    pub scale: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub features: usize,
    pub objects: usize,
    pub skipped_identifier_only: usize,
    pub skipped_geometry: usize,
    pub unclassified: usize,
    pub boundary_objects: usize,
    pub suppressed_boundaries: usize,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} features -> {} objects ({} boundary, {} suppressed); \
             skipped {} id-only, {} without usable geometry; {} unclassified",
            self.features,
            self.objects,
            self.boundary_objects,
            self.suppressed_boundaries,
            self.skipped_identifier_only,
            self.skipped_geometry,
            self.unclassified,
        )
    }
}

/// Georeference and objects for one collection, before template substitution.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub georeference: Georeference,
    pub objects: Vec<MapObject>,
    pub stats: ConversionStats,
}

impl Conversion {
    fn warn_missing_markers(template: &str) {
        for marker in missing_markers(template) {
            warn!("Template has no {} marker; that block is left out", marker);
        }
    }

    pub fn render(&self, template: &str) -> String {
        Self::warn_missing_markers(template);
        render_template(template, &self.georeference, &self.objects)
    }

    /// Writes the finished map into `w`.
    pub fn write_to<W: Write>(&self, w: &mut W, template: &str) -> io::Result<()> {
        Self::warn_missing_markers(template);
        write_document(w, template, &self.georeference, &self.objects)
    }
}

fn collection_bbox(collection: &FeatureCollection) -> [f64; 4] {
    if let Some(bbox) = collection.declared_bbox() {
        return bbox;
    }

    match collection.computed_bbox() {
        Some(bbox) => {
            debug!("No bbox member; using the extent of the features");
            bbox
        }
        None => {
            warn!("No bbox and no coordinates; centering on the origin");
            [0.0; 4]
        }
    }
}

fn feature_objects(
    index: usize,
    feature: &Feature,
    projector: &Projector,
    stats: &mut ConversionStats,
) -> Vec<MapObject> {
    let tags = tags::normalize(feature.properties.as_ref());

    let Some(matched) = symbol::classify(&tags) else {
        debug!("Feature {}: only an identifier tag, skipped", index);
        stats.skipped_identifier_only += 1;
        return Vec::new();
    };

    let coords = feature
        .geometry
        .as_ref()
        .map(|geometry| emit_coords(geometry, projector, matched.flags))
        .unwrap_or_default();

    if coords.is_empty() {
        debug!("Feature {}: no supported geometry, skipped", index);
        stats.skipped_geometry += 1;
        return Vec::new();
    }

    if matched.is_unknown() {
        debug!("Feature {}: no symbol for {:?}", index, tags);
        stats.unclassified += 1;
    }
    if matched.boundary.is_some() {
        if matched.boundary_suppressed {
            stats.suppressed_boundaries += 1;
        } else {
            stats.boundary_objects += 1;
        }
    }

    build_objects(&matched, &tags, coords)
}

/// Converts every feature, in collection order.
pub fn convert(collection: &FeatureCollection, options: &Options) -> Conversion {
    let crs = collection.crs_name().and_then(parse_epsg);
    if crs.is_none() {
        debug!("No EPSG code in CRS {:?}", collection.crs_name());
    }

    let projector = Projector::for_bbox(collection_bbox(collection), options.scale);

    let mut stats = ConversionStats {
        features: collection.features.len(),
        ..Default::default()
    };

    let objects: Vec<MapObject> = collection
        .features
        .iter()
        .enumerate()
        .flat_map(|(index, feature)| feature_objects(index, feature, &projector, &mut stats))
        .collect();
    stats.objects = objects.len();

    Conversion {
        georeference: Georeference {
            scale: options.scale,
            crs,
            ref_point: projector.center(),
        },
        objects,
        stats,
    }
}

/// Converts `collection` and substitutes the result into `template`.
pub fn assemble(
    collection: &FeatureCollection,
    template: &str,
    options: &Options,
) -> (String, ConversionStats) {
    let conversion = convert(collection, options);
    (conversion.render(template), conversion.stats)
}
