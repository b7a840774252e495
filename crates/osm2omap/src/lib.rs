//! Converts OpenStreetMap GeoJSON extracts into OpenOrienteering Mapper maps.
//!
//! The pipeline for each feature is:
//! [`tags::normalize`] -> [`symbol::classify`] -> [`geometry::emit_coords`]
//! -> [`object::build_objects`], driven by [`document::convert`].

pub mod config;
pub mod document;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod object;
pub mod projection;
pub mod symbol;
pub mod tags;

use std::fs;
use std::path::Path;

pub use document::{assemble, convert, Conversion, ConversionStats, Options};
pub use error::Error;
pub use geojson::FeatureCollection;

/// Converts GeoJSON text using `template` text.
pub fn convert_str(
    geojson: &str,
    template: &str,
    options: &Options,
) -> Result<(String, ConversionStats), Error> {
    let collection = FeatureCollection::from_json(geojson)?;
    Ok(assemble(&collection, template, options))
}

/// Reads and parses the GeoJSON file and reads the template text.
pub fn read_inputs(geojson: &Path, template: &Path) -> Result<(FeatureCollection, String), Error> {
    let geojson_text = fs::read_to_string(geojson).map_err(|err| Error::io(geojson, err))?;
    let template_text = fs::read_to_string(template).map_err(|err| Error::io(template, err))?;
    Ok((FeatureCollection::from_json(&geojson_text)?, template_text))
}

/// Reads both input files and returns the finished map.
pub fn convert_files(
    geojson: &Path,
    template: &Path,
    options: &Options,
) -> Result<(String, ConversionStats), Error> {
    let (collection, template_text) = read_inputs(geojson, template)?;
    Ok(assemble(&collection, &template_text, options))
}
