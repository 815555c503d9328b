//! Title/composer recognition from document name hints
//!
//! A deterministic lookup: the document name is matched case-insensitively
//! against known composer signatures in table order. No match yields the
//! generic defaults.

pub const DEFAULT_TITLE: &str = "Sheet Music";
pub const DEFAULT_COMPOSER: &str = "Unknown";
pub const DEFAULT_COPYRIGHT: &str = "Unknown";
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// A known composer signature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerSignature {
    /// Lowercase keyword searched for in the document name
    pub keyword: &'static str,
    pub title: &'static str,
    pub composer: &'static str,
    pub copyright: &'static str,
    pub confidence: f64,
}

const KNOWN_SIGNATURES: &[ComposerSignature] = &[
    ComposerSignature {
        keyword: "bach",
        title: "Prelude in C Major, BWV 846",
        composer: "Johann Sebastian Bach",
        copyright: "Public Domain",
        confidence: 0.90,
    },
    ComposerSignature {
        keyword: "mozart",
        title: "Eine kleine Nachtmusik",
        composer: "Wolfgang Amadeus Mozart",
        copyright: "Public Domain",
        confidence: 0.88,
    },
    ComposerSignature {
        keyword: "beethoven",
        title: "Für Elise",
        composer: "Ludwig van Beethoven",
        copyright: "Public Domain",
        confidence: 0.92,
    },
    ComposerSignature {
        keyword: "chopin",
        title: "Nocturne in E-flat Major, Op. 9 No. 2",
        composer: "Frédéric Chopin",
        copyright: "Public Domain",
        confidence: 0.87,
    },
];

/// Recognized (or defaulted) identification
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub title: String,
    pub composer: String,
    pub copyright: String,
    pub confidence: f64,
    /// Keyword of the matching signature, `None` for defaults
    pub matched: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TitleRecognizer;

impl TitleRecognizer {
    pub fn new() -> Self {
        Self
    }

    pub fn recognize(&self, document_name: &str) -> TitleMatch {
        let hint = document_name.to_lowercase();

        match KNOWN_SIGNATURES.iter().find(|sig| hint.contains(sig.keyword)) {
            Some(sig) => {
                tracing::debug!(keyword = sig.keyword, composer = sig.composer, "Composer signature matched");
                TitleMatch {
                    title: sig.title.to_string(),
                    composer: sig.composer.to_string(),
                    copyright: sig.copyright.to_string(),
                    confidence: sig.confidence,
                    matched: Some(sig.keyword),
                }
            }
            None => TitleMatch {
                title: DEFAULT_TITLE.to_string(),
                composer: DEFAULT_COMPOSER.to_string(),
                copyright: DEFAULT_COPYRIGHT.to_string(),
                confidence: DEFAULT_CONFIDENCE,
                matched: None,
            },
        }
    }
}
