/*!
 * Pattern sets used by the quality assessor and the routing policy.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of demographic bias a pattern indicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasKind {
    Gender,
    Cultural,
    Age,
}

impl fmt::Display for BiasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gender => "gender",
            Self::Cultural => "cultural",
            Self::Age => "age",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct BiasPattern {
    pub kind: BiasKind,
    pub regex: Regex,
    /// Counts toward the bias score, not only toward detection
    pub scored: bool,
}

/// A reading whose captured value must fall inside a plausible range
#[derive(Debug, Clone)]
pub struct ReadingPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
pub struct QualityLexicon {
    /// Medical vocabulary compared between source and translation
    pub term_extractor: Regex,
    /// Canonical term to its accepted synonyms
    pub synonyms: Vec<(&'static str, Vec<&'static str>)>,
    /// Words whose loss weakens an urgent message
    pub urgency_keywords: Vec<&'static str>,
    pub disrespectful: Vec<Regex>,
    pub bias: Vec<BiasPattern>,
    pub impossible_readings: Vec<ReadingPattern>,
    pub numbers: Regex,
}

impl QualityLexicon {
    /// Identical terms or synonyms in either direction
    pub fn related(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        self.synonyms.iter().any(|(canonical, alts)| {
            (*canonical == a && alts.iter().any(|alt| *alt == b))
                || (*canonical == b && alts.iter().any(|alt| *alt == a))
        })
    }

    /// The term itself plus every word it is related to
    pub fn equivalents<'a>(&'a self, term: &'a str) -> Vec<&'a str> {
        let mut out = vec![term];
        for (canonical, alts) in &self.synonyms {
            if *canonical == term {
                out.extend(alts.iter().copied());
            } else if alts.iter().any(|alt| *alt == term) {
                out.push(*canonical);
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct RoutingLexicon {
    /// Content that needs a reasoning-capable engine
    pub complex_patterns: Vec<(&'static str, Regex)>,
    /// Generic medical vocabulary for the long-text rule
    pub medical_keywords: Regex,
}

impl RoutingLexicon {
    /// Name of the first complex pattern found in `text`
    pub fn complex_match(&self, text: &str) -> Option<&'static str> {
        self.complex_patterns
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| *name)
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid built-in lexicon pattern")
}

static QUALITY_LEXICON: Lazy<QualityLexicon> = Lazy::new(|| QualityLexicon {
    term_extractor: compile(
        r"(?i)\b(pain|heart|blood|pressure|temperature|fever|cough|headache|nausea|dizzy|medication|dose|allergy|emergency|critical|urgent)\b",
    ),
    synonyms: vec![
        ("pain", vec!["ache", "hurt", "discomfort"]),
        ("fever", vec!["temperature", "hot"]),
        ("dizzy", vec!["vertigo", "lightheaded"]),
    ],
    urgency_keywords: vec!["emergency", "urgent", "critical", "immediate", "help", "pain"],
    disrespectful: vec![
        compile(r"(?i)\b(weird|strange|bizarre)\b"),
        compile(r"(?i)\b(primitive|backward)\b"),
    ],
    bias: vec![
        BiasPattern {
            kind: BiasKind::Gender,
            regex: compile(r"(?i)\b(he|him)\s+(nurse|patient)\b"),
            scored: true,
        },
        BiasPattern {
            kind: BiasKind::Gender,
            regex: compile(r"(?i)\b(she|her)\s+(doctor|surgeon)\b"),
            scored: true,
        },
        BiasPattern {
            kind: BiasKind::Age,
            regex: compile(r"(?i)\bold\b.*\bconfused\b"),
            scored: true,
        },
        BiasPattern {
            kind: BiasKind::Age,
            regex: compile(r"(?i)\byoung\b.*\bhealthy\b"),
            scored: true,
        },
        BiasPattern {
            kind: BiasKind::Age,
            regex: compile(r"(?i)\belderly\b.*\bslow\b"),
            scored: false,
        },
        BiasPattern {
            kind: BiasKind::Cultural,
            regex: compile(r"(?i)\b(primitive|backward|civilized)\b"),
            scored: false,
        },
        BiasPattern {
            kind: BiasKind::Cultural,
            regex: compile(r"(?i)\bexotic\b"),
            scored: false,
        },
    ],
    impossible_readings: vec![
        ReadingPattern {
            name: "temperature (C)",
            regex: compile(r"(?i)temperature\D{0,20}?(-?\d+(?:\.\d+)?)\s*°\s*C\b"),
            min: 25.0,
            max: 45.0,
        },
        ReadingPattern {
            name: "temperature (F)",
            regex: compile(r"(?i)temperature\D{0,20}?(-?\d+(?:\.\d+)?)\s*°\s*F\b"),
            min: 77.0,
            max: 113.0,
        },
        ReadingPattern {
            name: "blood pressure",
            regex: compile(r"(?i)blood pressure\D{0,20}?(\d+)"),
            min: 30.0,
            max: 300.0,
        },
        ReadingPattern {
            name: "heart rate",
            regex: compile(r"(?i)(?:heart rate|pulse)\D{0,20}?(\d+)"),
            min: 20.0,
            max: 300.0,
        },
    ],
    numbers: compile(r"\d+(?:\.\d+)?"),
});

static ROUTING_LEXICON: Lazy<RoutingLexicon> = Lazy::new(|| RoutingLexicon {
    complex_patterns: vec![
        (
            "dosage",
            compile(
                r"(?i)\b\d+(?:\.\d+)?\s*(?:mg|mcg|ml|units?|iu|tablets?|pills?|capsules?)\b|\b(?:dose|dosage|dosing)\b",
            ),
        ),
        (
            "drug interaction",
            compile(r"(?i)\b(?:drug|medication|medicine)s?\s+interactions?\b|\binteracts?\s+with\b"),
        ),
        (
            "cultural or religious",
            compile(
                r"(?i)\b(?:ramadan|fasting|halal|kosher|religio\w*|jehovah|blood transfusion|traditional (?:medicine|healer|remed\w*)|herbal)\b",
            ),
        ),
        (
            "pediatric dosing",
            compile(
                r"(?i)\b(?:child|children|infant|baby|toddler|pediatric|paediatric|newborn)\b.*\b(?:per kg|weight|kilograms?)\b",
            ),
        ),
        (
            "contraindication",
            compile(r"(?i)\bcontraindicat\w*|\bshould not (?:take|be taken|be given)\b"),
        ),
        (
            "psychiatric",
            compile(
                r"(?i)\b(?:suicid\w*|self[- ]harm|psychiatr\w*|psychos[ie]s|psychotic|hallucinat\w*|schizophreni\w*|bipolar|depressi\w*|panic attacks?)\b",
            ),
        ),
    ],
    medical_keywords: compile(
        r"(?i)\b(?:patient|doctor|nurse|symptoms?|treatment|diagnosis|medication|medicine|hospital|pain|prescription|surgery|blood|infection|allergy|allergic)\b",
    ),
});

pub fn builtin_quality_lexicon() -> QualityLexicon {
    QUALITY_LEXICON.clone()
}

pub fn builtin_routing_lexicon() -> RoutingLexicon {
    ROUTING_LEXICON.clone()
}
