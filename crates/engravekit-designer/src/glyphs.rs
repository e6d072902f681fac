//! Glyph catalog
//!
//! Single-stroke glyphs for engraving text. Each glyph is an ordered list of
//! path elements in a unit cell roughly 1 wide and 2 tall with the baseline at
//! y = 0. A [`PathElement::Lift`] separates disjoint strokes of one glyph.
//!
//! Lookup is exact first, then by the catalog's normalization rule
//! (upper-casing), so the built-in catalog only carries capitals.

use engravekit_core::ValidationError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One element of a glyph path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    /// A point in unit glyph coordinates
    Point(f64, f64),
    /// Raise the pen, travel to the next point, lower the pen
    Lift,
}

const L: PathElement = PathElement::Lift;

const fn p(x: f64, y: f64) -> PathElement {
    PathElement::Point(x, y)
}

/// Character to stroke mapping with a defined lookup rule
#[derive(Debug, Clone, Default)]
pub struct GlyphCatalog {
    glyphs: HashMap<char, Vec<PathElement>>,
}

impl GlyphCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from entries, validating every glyph
    pub fn from_entries<I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (char, Vec<PathElement>)>,
    {
        let mut catalog = Self::new();
        for (ch, elements) in entries {
            catalog.insert(ch, elements)?;
        }
        Ok(catalog)
    }

    /// The built-in business-card catalog
    pub fn builtin() -> &'static GlyphCatalog {
        static CATALOG: OnceLock<GlyphCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| GlyphCatalog {
            glyphs: BUILTIN_GLYPHS
                .iter()
                .map(|(ch, elements)| (*ch, elements.to_vec()))
                .collect(),
        })
    }

    /// Add or replace a glyph
    pub fn insert(&mut self, ch: char, elements: Vec<PathElement>) -> Result<(), ValidationError> {
        validate_glyph(ch, &elements)?;
        self.glyphs.insert(ch, elements);
        Ok(())
    }

    /// Normalization applied when the exact character is missing.
    ///
    /// Upper-cases the character; characters whose upper-case form is not a
    /// single character (e.g. 'ß') have no normalized form.
    pub fn normalize(ch: char) -> Option<char> {
        let mut upper = ch.to_uppercase();
        match (upper.next(), upper.next()) {
            (Some(u), None) if u != ch => Some(u),
            _ => None,
        }
    }

    /// Look up a glyph: exact match, then normalized match
    pub fn lookup(&self, ch: char) -> Option<&[PathElement]> {
        self.glyphs
            .get(&ch)
            .or_else(|| Self::normalize(ch).and_then(|n| self.glyphs.get(&n)))
            .map(Vec::as_slice)
    }

    /// True if [`lookup`](Self::lookup) would find a glyph
    pub fn contains(&self, ch: char) -> bool {
        self.lookup(ch).is_some()
    }

    /// Number of glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// True if the catalog has no glyphs
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterate over the catalog's characters
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.keys().copied()
    }
}

/// Check that every lift marker is immediately followed by a point
pub fn validate_glyph(ch: char, elements: &[PathElement]) -> Result<(), ValidationError> {
    for (i, element) in elements.iter().enumerate() {
        if *element == PathElement::Lift
            && !matches!(elements.get(i + 1), Some(PathElement::Point(..)))
        {
            return Err(ValidationError::config(
                format!("glyph '{}'", ch),
                format!("lift marker at index {} is not followed by a point", i),
            ));
        }
    }
    Ok(())
}

static BUILTIN_GLYPHS: &[(char, &[PathElement])] = &[
    (' ', &[]),
    ('A', &[p(0.0, 0.0), p(0.5, 2.0), p(1.0, 0.0), L, p(0.25, 1.0), p(0.75, 1.0)]),
    (
        'B',
        &[
            p(0.0, 0.0), p(0.0, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.75, 1.0),
            p(0.0, 1.0), L, p(0.75, 1.0), p(1.0, 0.75), p(1.0, 0.25), p(0.75, 0.0), p(0.0, 0.0),
        ],
    ),
    (
        'C',
        &[
            p(1.0, 1.75), p(0.75, 2.0), p(0.25, 2.0), p(0.0, 1.75), p(0.0, 0.25), p(0.25, 0.0),
            p(0.75, 0.0), p(1.0, 0.25),
        ],
    ),
    (
        'D',
        &[
            p(0.0, 0.0), p(0.0, 2.0), p(0.6, 2.0), p(1.0, 1.6), p(1.0, 0.4), p(0.6, 0.0),
            p(0.0, 0.0),
        ],
    ),
    ('E', &[p(1.0, 2.0), p(0.0, 2.0), p(0.0, 0.0), p(1.0, 0.0), L, p(0.0, 1.0), p(0.75, 1.0)]),
    ('F', &[p(1.0, 2.0), p(0.0, 2.0), p(0.0, 0.0), L, p(0.0, 1.0), p(0.75, 1.0)]),
    (
        'G',
        &[
            p(1.0, 1.75), p(0.75, 2.0), p(0.25, 2.0), p(0.0, 1.75), p(0.0, 0.25), p(0.25, 0.0),
            p(0.75, 0.0), p(1.0, 0.25), p(1.0, 1.0), p(0.5, 1.0),
        ],
    ),
    ('H', &[p(0.0, 0.0), p(0.0, 2.0), L, p(1.0, 2.0), p(1.0, 0.0), L, p(0.0, 1.0), p(1.0, 1.0)]),
    ('I', &[p(0.2, 2.0), p(0.8, 2.0), L, p(0.5, 2.0), p(0.5, 0.0), L, p(0.2, 0.0), p(0.8, 0.0)]),
    ('J', &[p(1.0, 2.0), p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0), p(0.0, 0.25)]),
    ('K', &[p(0.0, 0.0), p(0.0, 2.0), L, p(1.0, 2.0), p(0.0, 1.0), p(1.0, 0.0)]),
    ('L', &[p(0.0, 2.0), p(0.0, 0.0), p(1.0, 0.0)]),
    ('M', &[p(0.0, 0.0), p(0.0, 2.0), p(0.5, 1.0), p(1.0, 2.0), p(1.0, 0.0)]),
    ('N', &[p(0.0, 0.0), p(0.0, 2.0), p(1.0, 0.0), p(1.0, 2.0)]),
    (
        'O',
        &[
            p(0.25, 0.0), p(0.0, 0.25), p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75),
            p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0),
        ],
    ),
    (
        'P',
        &[
            p(0.0, 0.0), p(0.0, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.75, 1.0),
            p(0.0, 1.0),
        ],
    ),
    (
        'Q',
        &[
            p(0.25, 0.0), p(0.0, 0.25), p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75),
            p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0), L, p(0.6, 0.4), p(1.0, 0.0),
        ],
    ),
    (
        'R',
        &[
            p(0.0, 0.0), p(0.0, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.75, 1.0),
            p(0.0, 1.0), L, p(0.5, 1.0), p(1.0, 0.0),
        ],
    ),
    (
        'S',
        &[
            p(1.0, 1.75), p(0.75, 2.0), p(0.25, 2.0), p(0.0, 1.75), p(0.0, 1.25), p(0.25, 1.0),
            p(0.75, 1.0), p(1.0, 0.75), p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0), p(0.0, 0.25),
        ],
    ),
    ('T', &[p(0.0, 2.0), p(1.0, 2.0), L, p(0.5, 2.0), p(0.5, 0.0)]),
    ('U', &[p(0.0, 2.0), p(0.0, 0.25), p(0.25, 0.0), p(0.75, 0.0), p(1.0, 0.25), p(1.0, 2.0)]),
    ('V', &[p(0.0, 2.0), p(0.5, 0.0), p(1.0, 2.0)]),
    ('W', &[p(0.0, 2.0), p(0.25, 0.0), p(0.5, 1.0), p(0.75, 0.0), p(1.0, 2.0)]),
    ('X', &[p(0.0, 2.0), p(1.0, 0.0), L, p(0.0, 0.0), p(1.0, 2.0)]),
    ('Y', &[p(0.0, 2.0), p(0.5, 1.0), p(1.0, 2.0), L, p(0.5, 1.0), p(0.5, 0.0)]),
    ('Z', &[p(0.0, 2.0), p(1.0, 2.0), p(0.0, 0.0), p(1.0, 0.0)]),
    (
        '0',
        &[
            p(0.25, 0.0), p(0.0, 0.25), p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75),
            p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0), L, p(0.0, 0.25), p(1.0, 1.75),
        ],
    ),
    ('1', &[p(0.25, 1.5), p(0.5, 2.0), p(0.5, 0.0), L, p(0.25, 0.0), p(0.75, 0.0)]),
    (
        '2',
        &[
            p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.0, 0.0),
            p(1.0, 0.0),
        ],
    ),
    (
        '3',
        &[
            p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.75, 1.0),
            p(0.25, 1.0), L, p(0.75, 1.0), p(1.0, 0.75), p(1.0, 0.25), p(0.75, 0.0),
            p(0.25, 0.0), p(0.0, 0.25),
        ],
    ),
    ('4', &[p(0.75, 0.0), p(0.75, 2.0), p(0.0, 0.5), p(1.0, 0.5)]),
    (
        '5',
        &[
            p(1.0, 2.0), p(0.0, 2.0), p(0.0, 1.0), p(0.75, 1.0), p(1.0, 0.75), p(1.0, 0.25),
            p(0.75, 0.0), p(0.0, 0.0),
        ],
    ),
    (
        '6',
        &[
            p(1.0, 1.75), p(0.75, 2.0), p(0.25, 2.0), p(0.0, 1.75), p(0.0, 0.25), p(0.25, 0.0),
            p(0.75, 0.0), p(1.0, 0.25), p(1.0, 0.75), p(0.75, 1.0), p(0.0, 1.0),
        ],
    ),
    ('7', &[p(0.0, 2.0), p(1.0, 2.0), p(0.4, 0.0)]),
    (
        '8',
        &[
            p(0.25, 1.0), p(0.0, 1.25), p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75),
            p(1.0, 1.25), p(0.75, 1.0), p(0.25, 1.0), p(0.0, 0.75), p(0.0, 0.25), p(0.25, 0.0),
            p(0.75, 0.0), p(1.0, 0.25), p(1.0, 0.75), p(0.75, 1.0),
        ],
    ),
    (
        '9',
        &[
            p(1.0, 1.0), p(0.25, 1.0), p(0.0, 1.25), p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0),
            p(1.0, 1.75), p(1.0, 0.25), p(0.75, 0.0), p(0.25, 0.0),
        ],
    ),
    ('.', &[p(0.45, 0.0), p(0.55, 0.0), p(0.55, 0.1), p(0.45, 0.1), p(0.45, 0.0)]),
    (',', &[p(0.55, 0.2), p(0.55, 0.0), p(0.4, -0.3)]),
    (
        ':',
        &[
            p(0.45, 0.0), p(0.55, 0.0), p(0.55, 0.1), p(0.45, 0.1), p(0.45, 0.0), L, p(0.45, 1.0),
            p(0.55, 1.0), p(0.55, 1.1), p(0.45, 1.1), p(0.45, 1.0),
        ],
    ),
    (
        ';',
        &[
            p(0.45, 1.0), p(0.55, 1.0), p(0.55, 1.1), p(0.45, 1.1), p(0.45, 1.0), L, p(0.55, 0.2),
            p(0.55, 0.0), p(0.4, -0.3),
        ],
    ),
    ('-', &[p(0.2, 1.0), p(0.8, 1.0)]),
    ('_', &[p(0.0, 0.0), p(1.0, 0.0)]),
    ('/', &[p(0.0, 0.0), p(1.0, 2.0)]),
    ('+', &[p(0.5, 0.5), p(0.5, 1.5), L, p(0.0, 1.0), p(1.0, 1.0)]),
    ('(', &[p(0.7, 2.0), p(0.4, 1.5), p(0.4, 0.5), p(0.7, 0.0)]),
    (')', &[p(0.3, 2.0), p(0.6, 1.5), p(0.6, 0.5), p(0.3, 0.0)]),
    (
        '&',
        &[
            p(1.0, 0.0), p(0.2, 1.5), p(0.4, 2.0), p(0.6, 1.6), p(0.0, 0.5), p(0.3, 0.0),
            p(0.7, 0.0), p(1.0, 0.5),
        ],
    ),
    ('\'', &[p(0.5, 2.0), p(0.5, 1.5)]),
    (
        '#',
        &[
            p(0.35, 0.0), p(0.35, 2.0), L, p(0.65, 2.0), p(0.65, 0.0), L, p(0.0, 1.35),
            p(1.0, 1.35), L, p(1.0, 0.65), p(0.0, 0.65),
        ],
    ),
    ('!', &[p(0.5, 2.0), p(0.5, 0.5), L, p(0.5, 0.1), p(0.5, 0.0)]),
    (
        '?',
        &[
            p(0.0, 1.75), p(0.25, 2.0), p(0.75, 2.0), p(1.0, 1.75), p(1.0, 1.25), p(0.5, 0.9),
            p(0.5, 0.5), L, p(0.5, 0.1), p(0.5, 0.0),
        ],
    ),
    (
        '@',
        &[
            p(0.7, 0.7), p(0.4, 0.7), p(0.3, 1.0), p(0.4, 1.3), p(0.7, 1.3), p(0.7, 0.7),
            p(1.0, 0.7), p(1.0, 1.75), p(0.75, 2.0), p(0.25, 2.0), p(0.0, 1.75), p(0.0, 0.25),
            p(0.25, 0.0), p(1.0, 0.0),
        ],
    ),
];
