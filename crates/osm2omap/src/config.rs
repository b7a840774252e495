use clap::Parser;
use std::path::PathBuf;

use crate::document::Options;

/// `osm2omap` - OpenStreetMap GeoJSON to OpenOrienteering Mapper.
///
/// Reads a GeoJSON feature collection exported from OSM data (in a projected
/// CRS) and a Mapper template, and writes the template with the
/// georeferencing and the classified map objects filled in.
#[derive(Parser, Debug, Clone)]
#[command(name = "osm2omap", version, about, long_about = None)]
pub struct Config {
    /// GeoJSON feature collection, e.g. written by `ogr2ogr -f GeoJSON`.
    pub geojson: PathBuf,

    /// Mapper template containing the `<!-- {georeference} -->` and
    /// `<!-- {objects} -->` markers.
    pub template: PathBuf,

    /// Write the map to this file instead of standard output.
    #[arg(short, long, env = "OSM2OMAP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Map scale denominator.
    ///
    /// Used for the georeferencing header and for converting projected
    /// metres into map units.
    #[arg(
        long,
        env = "OSM2OMAP_SCALE",
        default_value_t = omap::DEFAULT_SCALE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub scale: u32,
}

impl Config {
    pub fn options(&self) -> Options {
        Options { scale: self.scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn two_positionals_with_defaults() {
        let config = Config::try_parse_from(["osm2omap", "in.geojson", "template.omap"]).unwrap();
        assert_eq!(config.geojson, PathBuf::from("in.geojson"));
        assert_eq!(config.template, PathBuf::from("template.omap"));
        assert_eq!(config.output, None);
        assert_eq!(config.options(), Options::default());
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        assert!(Config::try_parse_from(["osm2omap", "in.geojson"]).is_err());
        assert!(Config::try_parse_from(["osm2omap", "a", "b", "c"]).is_err());
    }

    #[test]
    fn scale_must_be_positive() {
        let config =
            Config::try_parse_from(["osm2omap", "a", "b", "--scale", "10000"]).unwrap();
        assert_eq!(config.options().scale, 10_000);
        assert!(Config::try_parse_from(["osm2omap", "a", "b", "--scale", "0"]).is_err());
    }
}
