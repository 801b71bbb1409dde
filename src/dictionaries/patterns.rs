/*!
 * Sensitive-data patterns.
 *
 * The built-in PHI patterns are applied in declaration order. Order matters:
 * a more specific pattern (date of birth) runs before a more general one
 * (any date) so the specific token wins in the redacted text.
 */

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::CustomPatternConfig;

/// Severity of a sensitive data element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(anyhow::anyhow!("Invalid severity: {}", s)),
        }
    }
}

/// Kind of sensitive data element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiCategory {
    Identifier,
    Demographic,
    Medical,
    Financial,
    Contact,
}

impl fmt::Display for PhiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Identifier => "identifier",
            Self::Demographic => "demographic",
            Self::Medical => "medical",
            Self::Financial => "financial",
            Self::Contact => "contact",
        };
        write!(f, "{}", s)
    }
}

/// A compiled sensitive-data pattern
#[derive(Debug, Clone)]
pub struct SensitivePattern {
    pub name: String,
    pub regex: Regex,
    /// Token written in place of the matched value
    pub replacement: String,
    pub severity: Severity,
    pub category: PhiCategory,
    /// Capture group holding the value; `None` means the whole match
    pub value_group: Option<usize>,
    /// Person names, which emergency context may preserve
    pub name_like: bool,
}

impl SensitivePattern {
    /// Iterate over `(byte offset, value)` for every match in `text`
    pub fn find_values<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (usize, &'t str)> + 't {
        self.regex.captures_iter(text).filter_map(move |caps| {
            let m = match self.value_group {
                Some(group) => caps.get(group),
                None => caps.get(0),
            }?;
            if m.as_str().is_empty() {
                None
            } else {
                Some((m.start(), m.as_str()))
            }
        })
    }

    /// Compile a pattern supplied through configuration
    pub fn from_config(custom: &CustomPatternConfig) -> Result<Self> {
        let regex = Regex::new(&custom.pattern)
            .map_err(|e| anyhow!("Invalid custom pattern '{}': {}", custom.name, e))?;
        if let Some(group) = custom.value_group {
            if group >= regex.captures_len() {
                return Err(anyhow!(
                    "Custom pattern '{}' has no capture group {}",
                    custom.name,
                    group
                ));
            }
        }
        Ok(Self {
            name: custom.name.clone(),
            regex,
            replacement: custom.replacement.clone(),
            severity: custom.severity,
            category: custom.category,
            value_group: custom.value_group,
            name_like: false,
        })
    }
}

struct PatternSpec {
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
    severity: Severity,
    category: PhiCategory,
    value_group: Option<usize>,
    name_like: bool,
}

const fn pattern_spec(
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
    severity: Severity,
    category: PhiCategory,
) -> PatternSpec {
    PatternSpec {
        name,
        pattern,
        replacement,
        severity,
        category,
        value_group: None,
        name_like: false,
    }
}

const BUILTIN_SPECS: &[PatternSpec] = &[
    pattern_spec("SSN", r"\b\d{3}-?\d{2}-?\d{4}\b", "[SSN-REDACTED]", Severity::Critical, PhiCategory::Identifier),
    pattern_spec(
        "MRN",
        r"(?i)\b(MR#?|MRN#?|Medical Record|Patient ID)[:\s]*\d+\b",
        "[MRN-REDACTED]",
        Severity::Critical,
        PhiCategory::Identifier,
    ),
    pattern_spec(
        "Phone",
        r"\b(?:\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b",
        "[PHONE-REDACTED]",
        Severity::High,
        PhiCategory::Contact,
    ),
    pattern_spec(
        "Email",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "[EMAIL-REDACTED]",
        Severity::High,
        PhiCategory::Contact,
    ),
    pattern_spec(
        "Date of Birth",
        r"(?i)\b(DOB|Date of Birth|Born)[:\s]*\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b",
        "[DOB-REDACTED]",
        Severity::Critical,
        PhiCategory::Demographic,
    ),
    pattern_spec(
        "Full Date",
        r"\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b",
        "[DATE-REDACTED]",
        Severity::Medium,
        PhiCategory::Demographic,
    ),
    pattern_spec(
        "Address",
        r"(?i)\b\d+\s+[A-Za-z\s]+(Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Lane|Ln|Boulevard|Blvd)\b",
        "[ADDRESS-REDACTED]",
        Severity::High,
        PhiCategory::Contact,
    ),
    pattern_spec("ZIP Code", r"\b\d{5}(?:-\d{4})?\b", "[ZIP-REDACTED]", Severity::Medium, PhiCategory::Contact),
    pattern_spec(
        "Credit Card",
        r"\b\d{4}[\s\-]?\d{4}[\s\-]?\d{4}[\s\-]?\d{4}\b",
        "[CC-REDACTED]",
        Severity::Critical,
        PhiCategory::Financial,
    ),
    pattern_spec(
        "Insurance ID",
        r"(?i)\b(Insurance|Policy|Member|Subscriber)\s*(ID|Number|#)[:\s]*[A-Za-z0-9]+\b",
        "[INSURANCE-REDACTED]",
        Severity::High,
        PhiCategory::Financial,
    ),
    pattern_spec(
        "Prescription Number",
        r"(?i)\b(Rx|Prescription)\s*(#|Number)[:\s]*[A-Za-z0-9]+\b",
        "[RX-REDACTED]",
        Severity::High,
        PhiCategory::Medical,
    ),
    pattern_spec(
        "Device Serial",
        r"(?i)\b(Serial|Device|Implant)\s*(#|Number|ID)[:\s]*[A-Za-z0-9\-]+\b",
        "[DEVICE-REDACTED]",
        Severity::High,
        PhiCategory::Medical,
    ),
    pattern_spec(
        "Account Number",
        r"(?i)\b(Account|Acct)\s*(#|Number)[:\s]*\d+\b",
        "[ACCOUNT-REDACTED]",
        Severity::High,
        PhiCategory::Financial,
    ),
    PatternSpec {
        name_like: true,
        ..pattern_spec(
            "Potential Full Name",
            r"\b[A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b",
            "[NAME-REDACTED]",
            Severity::Medium,
            PhiCategory::Identifier,
        )
    },
    // Plate characters are upper-case only; the keyword after them is not.
    PatternSpec {
        value_group: Some(1),
        ..pattern_spec(
            "License Plate",
            r"\b([A-Z0-9]{2,8})\b\s*(?i:license|plate|tag)",
            "[PLATE-REDACTED]",
            Severity::Medium,
            PhiCategory::Identifier,
        )
    },
    pattern_spec("Web URL", r"https?://[^\s]+", "[URL-REDACTED]", Severity::Low, PhiCategory::Contact),
    pattern_spec(
        "IP Address",
        r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b",
        "[IP-REDACTED]",
        Severity::Low,
        PhiCategory::Identifier,
    ),
];

static BUILTIN_PATTERNS: Lazy<Vec<SensitivePattern>> = Lazy::new(|| {
    BUILTIN_SPECS
        .iter()
        .map(|s| SensitivePattern {
            name: s.name.to_string(),
            regex: Regex::new(s.pattern).expect("Invalid built-in PHI pattern"),
            replacement: s.replacement.to_string(),
            severity: s.severity,
            category: s.category,
            value_group: s.value_group,
            name_like: s.name_like,
        })
        .collect()
});

/// The built-in patterns in application order
pub fn builtin_patterns() -> Vec<SensitivePattern> {
    BUILTIN_PATTERNS.clone()
}
