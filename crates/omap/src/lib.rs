//! OMAP: writer for the XML documents read by OpenOrienteering Mapper.
//!
//! The crate does not build a whole document from scratch. Callers supply a
//! template (an existing `.omap`/`.xmap` file carrying the symbol set) with two
//! literal markers, and this crate renders the pieces that replace them:
//!
//! ```text
//! <!-- {georeference} -->  =>  <georeferencing scale="S">
//!                                  <projected_crs id="EPSG">
//!                                      <spec language="PROJ.4">+init=epsg:N</spec>
//!                                      <parameter>N</parameter>
//!                                      <ref_point x="X" y="Y"/>
//!                                  </projected_crs>
//!                              </georeferencing>
//!
//! <!-- {objects} -->       =>  <objects count="K">
//!                                  <object type="T" symbol="ID">
//!                                      <tags> <t k="key">value</t> ... </tags>
//!                                      <coords count="C"> <coord x=".." y=".." [flags=".."]/> ... </coords>
//!                                      <pattern rotation="R"> <coord x="0" y="0"/> </pattern>
//!                                  </object>
//!                                  ...
//!                              </objects>
//! ```
//!
//! Object `type`: 0 => point object (exactly one coordinate), 1 => path/area.
//! Coordinates are integers in map units (1/1000 mm on paper), truncated toward zero.
//! Coordinate `flags` is a bitfield; it is only written when non-zero.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

/// Marker replaced by the georeferencing block.
pub const GEOREFERENCE_MARKER: &str = "<!-- {georeference} -->";

/// Marker replaced by the objects block.
pub const OBJECTS_MARKER: &str = "<!-- {objects} -->";

/// Map scale denominator used when the caller does not pick one.
pub const DEFAULT_SCALE: u32 = 15_000;

/// Coordinate flag marking the last vertex of a closed ring.
pub const COORD_FLAG_RING_CLOSE: u32 = 18;

/// Symbol id the template reserves for "unknown symbol".
pub const UNKNOWN_SYMBOL: i32 = -3;

/// Map units per projected unit at scale 1:1.
const MAP_UNITS_PER_METER: f64 = 1_000_000.0;

/// Multiplier turning projected metres into map units at `scale`.
#[inline]
pub fn units_per_meter(scale: u32) -> f64 {
    MAP_UNITS_PER_METER / scale as f64
}

/// Escapes `& " < > '` so the text is safe both as element text and inside
/// a double-quoted attribute.
pub fn escape_xml(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '"', '<', '>', '\'']) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }

    Cow::Owned(out)
}

/// A projected CRS identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedCrs {
    pub epsg: u32,
}

impl ProjectedCrs {
    /// PROJ.4 init string understood by Mapper.
    pub fn proj4_spec(&self) -> String {
        format!("+init=epsg:{}", self.epsg)
    }
}

/// The georeferencing block: scale, CRS and the reference point every
/// object coordinate is relative to.
#[derive(Debug, Clone, PartialEq)]
pub struct Georeference {
    pub scale: u32,
    /// `None` when the source CRS carried no EPSG code.
    pub crs: Option<ProjectedCrs>,
    /// Reference point in projected units.
    pub ref_point: [f64; 2],
}

impl fmt::Display for Georeference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    <georeferencing scale=\"{}\">", self.scale)?;

        match self.crs {
            Some(crs) => {
                writeln!(f, "        <projected_crs id=\"EPSG\">")?;
                writeln!(
                    f,
                    "            <spec language=\"PROJ.4\">{}</spec>",
                    crs.proj4_spec()
                )?;
                writeln!(f, "            <parameter>{}</parameter>", crs.epsg)?;
            }
            None => writeln!(f, "        <projected_crs id=\"Local\">")?,
        }

        writeln!(
            f,
            "            <ref_point x=\"{:.6}\" y=\"{:.6}\"/>",
            self.ref_point[0], self.ref_point[1]
        )?;
        writeln!(f, "        </projected_crs>")?;
        write!(f, "    </georeferencing>")
    }
}

/// One `<t k="..">..</t>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One vertex in map units, relative to the reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub flags: u32,
}

impl Coord {
    #[inline]
    pub fn new(x: f64, y: f64, flags: u32) -> Self {
        Self { x, y, flags }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<coord x=\"{}\" y=\"{}\"",
            self.x.trunc() as i64,
            self.y.trunc() as i64
        )?;
        if self.flags != 0 {
            write!(f, " flags=\"{}\"", self.flags)?;
        }
        f.write_str("/>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectKind {
    Point = 0,
    /// Line or area; anything with more than one coordinate.
    Path = 1,
}

impl ObjectKind {
    #[inline]
    pub fn for_coord_count(count: usize) -> Self {
        if count == 1 {
            ObjectKind::Point
        } else {
            ObjectKind::Path
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub kind: ObjectKind,
    pub symbol: i32,
    pub tags: Vec<Tag>,
    pub coords: Vec<Coord>,
    /// Radians, counter-clockwise.
    pub rotation: f64,
}

impl MapObject {
    /// Builds an unrotated object; the kind follows from the coordinate count.
    pub fn new(symbol: i32, tags: Vec<Tag>, coords: Vec<Coord>) -> Self {
        Self {
            kind: ObjectKind::for_coord_count(coords.len()),
            symbol,
            tags,
            coords,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }
}

impl fmt::Display for MapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "                <object type=\"{}\" symbol=\"{}\">",
            self.kind as u8, self.symbol
        )?;

        writeln!(f, "                    <tags>")?;
        for tag in &self.tags {
            writeln!(
                f,
                "                        <t k=\"{}\">{}</t>",
                escape_xml(&tag.key),
                escape_xml(&tag.value)
            )?;
        }
        writeln!(f, "                    </tags>")?;

        writeln!(f, "                    <coords count=\"{}\">", self.coords.len())?;
        for coord in &self.coords {
            writeln!(f, "                        {coord}")?;
        }
        writeln!(f, "                    </coords>")?;

        if self.rotation == 0.0 {
            writeln!(f, "                    <pattern rotation=\"0\">")?;
        } else {
            writeln!(
                f,
                "                    <pattern rotation=\"{:.3}\">",
                self.rotation
            )?;
        }
        writeln!(f, "                        <coord x=\"0\" y=\"0\"/>")?;
        writeln!(f, "                    </pattern>")?;
        write!(f, "                </object>")
    }
}

/// The `<objects>` block with its count header.
pub struct Objects<'a>(pub &'a [MapObject]);

impl fmt::Display for Objects<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "            <objects count=\"{}\">", self.0.len())?;
        for object in self.0 {
            writeln!(f, "{object}")?;
        }
        write!(f, "            </objects>")
    }
}

/// Markers absent from `template`; their substitution is a no-op.
pub fn missing_markers(template: &str) -> Vec<&'static str> {
    [GEOREFERENCE_MARKER, OBJECTS_MARKER]
        .into_iter()
        .filter(|marker| !template.contains(marker))
        .collect()
}

/// Substitutes both markers in `template`. Plain string replacement; any
/// other text, including other `{...}` comments, is left untouched.
pub fn render_template(
    template: &str,
    georeference: &Georeference,
    objects: &[MapObject],
) -> String {
    let georeference = georeference.to_string();
    let objects = Objects(objects).to_string();

    template
        .replace(GEOREFERENCE_MARKER, &georeference)
        .replace(OBJECTS_MARKER, &objects)
}

/// Renders the document and writes it to `w`.
pub fn write_document<W: Write>(
    w: &mut W,
    template: &str,
    georeference: &Georeference,
    objects: &[MapObject],
) -> io::Result<()> {
    w.write_all(render_template(template, georeference, objects).as_bytes())?;
    w.flush()
}
