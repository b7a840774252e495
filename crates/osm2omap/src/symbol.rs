//! OSM tags to ISOM symbols.
//!
//! Symbol numbers are the ids used by the template's symbol set, not ISOM
//! codes, so the template never has to be parsed. The ISOM code and name of
//! each symbol is noted next to its rule.

use omap::UNKNOWN_SYMBOL;

use crate::tags::TagSet;

/// Stroke flag requested for power lines.
pub const FLAG_POWER_LINE: u32 = 32;

/// Tag that suppresses the distinct boundary object of an area.
pub const INDISTINCT_KEY: &str = "indistinct";

/// Result of classifying a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMatch {
    pub symbol: i32,
    /// Coordinate flags applied to every vertex.
    pub flags: u32,
    /// Separate outline symbol drawn along the same geometry.
    pub boundary: Option<i32>,
    /// Set by `indistinct=yes`; the boundary object is not emitted.
    pub boundary_suppressed: bool,
}

impl SymbolMatch {
    pub const UNKNOWN: SymbolMatch = SymbolMatch::new(UNKNOWN_SYMBOL);

    pub const fn new(symbol: i32) -> Self {
        Self {
            symbol,
            flags: 0,
            boundary: None,
            boundary_suppressed: false,
        }
    }

    pub const fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub const fn with_boundary(mut self, boundary: i32) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// The boundary symbol to emit, if any survives suppression.
    pub fn boundary_symbol(&self) -> Option<i32> {
        if self.boundary_suppressed {
            None
        } else {
            self.boundary
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.symbol == UNKNOWN_SYMBOL
    }
}

/// Predicate over a [`TagSet`]. An absent tag never equals a listed value.
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Tag present with one of the values.
    OneOf(&'static str, &'static [&'static str]),
    /// Tag present with any value except this one.
    PresentExcept(&'static str, &'static str),
    /// Tag is a width strictly greater than this many metres.
    WiderThan(&'static str, f64),
    /// Tag is a finite number.
    Numeric(&'static str),
    /// Tag is a finite number whose integer part is a multiple of this.
    NumericMultipleOf(&'static str, i64),
    Any(&'static [Condition]),
    All(&'static [Condition]),
}

impl Condition {
    pub fn matches(&self, tags: &TagSet) -> bool {
        match *self {
            Condition::OneOf(key, values) => tags.get(key).is_some_and(|v| values.contains(&v)),
            Condition::PresentExcept(key, value) => tags.get(key).is_some_and(|v| v != value),
            Condition::WiderThan(key, limit) => tags
                .get(key)
                .and_then(parse_width_m)
                .is_some_and(|width| width > limit),
            Condition::Numeric(key) => tags.get(key).and_then(parse_number).is_some(),
            Condition::NumericMultipleOf(key, step) => tags
                .get(key)
                .and_then(parse_number)
                .is_some_and(|n| (n.trunc() as i64) % step == 0),
            Condition::Any(conditions) => conditions.iter().any(|c| c.matches(tags)),
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(tags)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub when: Condition,
    pub then: SymbolMatch,
}

const fn rule(name: &'static str, when: Condition, then: SymbolMatch) -> Rule {
    Rule { name, when, then }
}

use Condition::{All, Any, Numeric, NumericMultipleOf, OneOf, PresentExcept, WiderThan};

/// Evaluated top to bottom; the first matching rule wins.
static RULES: &[Rule] = &[
    // code="502" name="Major road, minimum width"
    rule(
        "major_road",
        Any(&[
            OneOf("highway", &["primary", "secondary"]),
            All(&[
                OneOf("highway", &["tertiary", "unclassified"]),
                WiderThan("width", 5.0),
            ]),
        ]),
        SymbolMatch::new(88),
    ),
    // code="503" name="Minor road"
    rule("minor_road", OneOf("highway", &["tertiary"]), SymbolMatch::new(90)),
    // code="504" name="Road"
    rule(
        "road",
        OneOf(
            "highway",
            &["unclassified", "residential", "service", "living_street", "pedestrian"],
        ),
        SymbolMatch::new(92),
    ),
    // code="505" name="Vehicle track"
    rule(
        "vehicle_track",
        OneOf("highway", &["track", "unsurfaced", "bridleway", "cycleway"]),
        SymbolMatch::new(93),
    ),
    // code="506" name="Footpath"
    rule(
        "footpath",
        Any(&[
            OneOf("highway", &["footway", "steps"]),
            OneOf("man_made", &["pier"]),
        ]),
        SymbolMatch::new(94),
    ),
    // code="507" name="Small path"
    rule("small_path", OneOf("highway", &["path"]), SymbolMatch::new(95)),
    // code="305" name="Crossable watercourse"
    rule(
        "crossable_watercourse",
        OneOf("waterway", &["stream", "ditch", "canal"]),
        SymbolMatch::new(50),
    ),
    // code="515" name="Railway"
    rule("railway", OneOf("railway", &["rail"]), SymbolMatch::new(99)),
    // code="516" name="Power line"
    rule(
        "power_line",
        OneOf("power", &["minor_line"]),
        SymbolMatch::new(100).with_flags(FLAG_POWER_LINE),
    ),
    // code="517" name="Major power line"
    rule(
        "major_power_line",
        OneOf("power", &["line"]),
        SymbolMatch::new(101).with_flags(FLAG_POWER_LINE),
    ),
    // code="524" name="High fence"
    rule("high_fence", OneOf("barrier", &["fence"]), SymbolMatch::new(109)),
    // code="521" name="High stone wall"
    rule(
        "high_stone_wall",
        OneOf("barrier", &["retaining_wall", "city_wall"]),
        SymbolMatch::new(106),
    ),
    // code="301" name="Lake", boundary code="301.1" name="Lake, bank line"
    rule(
        "lake",
        OneOf("natural", &["water"]),
        SymbolMatch::new(45).with_boundary(46),
    ),
    // code="311" name="Indistinct marsh"
    rule("indistinct_marsh", OneOf("natural", &["wetland"]), SymbolMatch::new(59)),
    // code="401" name="Open land"
    rule(
        "open_land",
        Any(&[
            OneOf("natural", &["grassland"]),
            OneOf("landuse", &["meadow", "farmland"]),
            OneOf("leisure", &["playground"]),
        ]),
        SymbolMatch::new(64),
    ),
    // code="403" name="Rough open land", boundary code="414" name="Distinct cultivation boundary"
    rule(
        "rough_open_land",
        OneOf("natural", &["heath"]),
        SymbolMatch::new(66).with_boundary(80),
    ),
    // code="527" name="Settlement"
    rule(
        "settlement",
        Any(&[
            OneOf("landuse", &["residential", "allotments", "farmyard"]),
            OneOf("leisure", &["marina"]),
        ]),
        SymbolMatch::new(113),
    ),
    // code="413" name="Vineyard", boundary code="414" name="Distinct cultivation boundary"
    rule(
        "vineyard",
        OneOf("landuse", &["vineyard"]),
        SymbolMatch::new(79).with_boundary(80),
    ),
    // code="406" name="Forest: slow running", boundary code="416" name="Distinct vegetation boundary"
    rule(
        "forest",
        OneOf("landuse", &["forest"]),
        SymbolMatch::new(69).with_boundary(82),
    ),
    // code="410" name="Vegetation: very difficult to run, impassable"
    rule("impassable_vegetation", OneOf("natural", &["scrub"]), SymbolMatch::new(73)),
    // code="526" name="Building"
    rule("building", PresentExcept("building", "no"), SymbolMatch::new(111)),
    // code="535" name="High tower"
    rule(
        "high_tower",
        OneOf("man_made", &["tower", "mast", "water_tower"]),
        SymbolMatch::new(127),
    ),
    // code="536" name="Small tower"
    rule("small_tower", OneOf("amenity", &["hunting_stand"]), SymbolMatch::new(128)),
    // code="312" name="Well"
    rule("well", OneOf("man_made", &["water_well"]), SymbolMatch::new(61)),
    // code="102" name="Index contour"
    rule("index_contour", NumericMultipleOf("type", 50), SymbolMatch::new(1)),
    // code="101" name="Contour"
    rule("contour", Numeric("type"), SymbolMatch::new(0)),
];

/// The rule table in evaluation order.
pub fn rules() -> &'static [Rule] {
    RULES
}

/// First rule whose condition holds.
pub fn matching_rule(tags: &TagSet) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.when.matches(tags))
}

/// Resolves the symbol for `tags`, falling back to [`SymbolMatch::UNKNOWN`].
pub fn resolve(tags: &TagSet) -> SymbolMatch {
    let mut matched = matching_rule(tags).map_or(SymbolMatch::UNKNOWN, |rule| rule.then);
    matched.boundary_suppressed = tags.get(INDISTINCT_KEY) == Some("yes");
    matched
}

/// Like [`resolve`], but `None` for features that must not be mapped at all.
pub fn classify(tags: &TagSet) -> Option<SymbolMatch> {
    if tags.is_identifier_only() {
        return None;
    }
    Some(resolve(tags))
}

#[inline]
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses an OSM `width` value in metres.
#[inline]
fn parse_width_m(s: &str) -> Option<f64> {
    // Normalise the input string.
    let s = s.trim().to_ascii_lowercase();

    // Strip known unit suffixes.
    if let Some(num) = s.strip_suffix("ft") {
        return parse_number(num).map(|v| v * 0.3048);
    }
    if let Some(num) = s.strip_suffix('m') {
        return parse_number(num);
    }

    // Fallback: plain number interpreted as metres.
    parse_number(&s)
}
