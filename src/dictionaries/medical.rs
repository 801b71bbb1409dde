/*!
 * Medical term dictionary and keyword sets.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical category of a dictionary term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Anatomy,
    Symptom,
    Medication,
    Procedure,
    Condition,
    Emergency,
}

impl fmt::Display for TermCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Anatomy => "anatomy",
            Self::Symptom => "symptom",
            Self::Medication => "medication",
            Self::Procedure => "procedure",
            Self::Condition => "condition",
            Self::Emergency => "emergency",
        };
        write!(f, "{}", s)
    }
}

/// Urgency tier that sets a term's base criticality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityTier {
    Low,
    Medium,
    High,
    Critical,
}

/// A canonical medical term with its lay alternatives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalTerm {
    pub term: String,
    pub category: TermCategory,
    pub alternatives: Vec<String>,
    pub criticality: CriticalityTier,
}

impl MedicalTerm {
    fn new(term: &str, category: TermCategory, criticality: CriticalityTier, alternatives: &[&str]) -> Self {
        Self {
            term: term.to_string(),
            category,
            alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
            criticality,
        }
    }

    /// Case-insensitive substring match on the canonical form or any alternative.
    /// `lowered` must already be lower-cased.
    pub fn matches(&self, lowered: &str) -> bool {
        lowered.contains(&self.term) || self.alternatives.iter().any(|alt| lowered.contains(alt.as_str()))
    }
}

pub fn builtin_terms() -> Vec<MedicalTerm> {
    use CriticalityTier::*;
    use TermCategory::*;

    vec![
        MedicalTerm::new(
            "chest pain",
            Emergency,
            Critical,
            &["heart pain", "cardiac pain", "chest discomfort", "heart attack"],
        ),
        MedicalTerm::new(
            "difficulty breathing",
            Emergency,
            Critical,
            &["shortness of breath", "can't breathe", "breathing problems", "breathe"],
        ),
        MedicalTerm::new(
            "severe bleeding",
            Emergency,
            Critical,
            &["heavy bleeding", "excessive bleeding", "hemorrhage", "bleeding"],
        ),
        MedicalTerm::new(
            "unconscious",
            Emergency,
            Critical,
            &["passed out", "unresponsive", "not conscious"],
        ),
        MedicalTerm::new("seizure", Emergency, Critical, &["convulsion", "fit", "epileptic"]),
        MedicalTerm::new("stroke", Emergency, Critical, &["brain attack", "cerebrovascular"]),
        MedicalTerm::new("headache", Symptom, Medium, &["head pain", "cephalgia"]),
        MedicalTerm::new("nausea", Symptom, Medium, &["feeling sick", "queasy", "upset stomach"]),
        MedicalTerm::new("fever", Symptom, Medium, &["high temperature", "pyrexia"]),
        MedicalTerm::new("pain", Symptom, Medium, &["hurt", "ache", "discomfort"]),
        MedicalTerm::new("insulin", Medication, Critical, &["diabetes medication"]),
        MedicalTerm::new("epinephrine", Medication, Critical, &["adrenaline", "epipen"]),
        MedicalTerm::new("nitroglycerin", Medication, Critical, &["nitro", "heart medication"]),
    ]
}

/// Keywords that mark an utterance as a potential emergency
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "help",
    "sudden",
    "severe",
    "acute",
    "bleeding",
    "breathe",
    "breathing",
    "chest",
    "heart attack",
    "unconscious",
    "seizure",
    "stroke",
    "allergic reaction",
    "overdose",
    "poisoning",
    "burn",
    "fracture",
    "trauma",
    "critical",
    "immediate",
];

/// Onset, trajectory and pain-quality words that raise urgency.
/// "severe" and "crushing" are emergency cues only.
pub const ACUTE_MODIFIERS: &[&str] = &[
    "sudden",
    "suddenly",
    "acute",
    "intense",
    "sharp",
    "stabbing",
    "new onset",
    "worsening",
    "getting worse",
    "unbearable",
    "immediately",
];

/// Words that describe a long-standing, managed condition
pub const CHRONIC_MODIFIERS: &[&str] = &[
    "chronic",
    "ongoing",
    "regular",
    "usual",
    "daily",
    "long-term",
    "persistent",
    "recurring",
    "routine",
    "managed",
    "controlled",
    "stable",
];
