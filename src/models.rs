/*!
 * Shared request-level types.
 *
 * Enumerations used across several pipeline stages: the medical context a
 * request is processed under, review priority, and the performance profile
 * that tunes routing.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Context a request is processed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MedicalContext {
    /// Life-threatening or time-critical situation
    Emergency,
    /// No specific medical framing
    #[default]
    General,
    /// Routine clinical conversation
    Consultation,
    /// Drug names, doses or regimens
    Medication,
}

impl MedicalContext {
    pub fn is_emergency(&self) -> bool {
        matches!(self, Self::Emergency)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::General => "general",
            Self::Consultation => "consultation",
            Self::Medication => "medication",
        }
    }
}

impl fmt::Display for MedicalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MedicalContext {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" => Ok(Self::Emergency),
            "general" => Ok(Self::General),
            "consultation" => Ok(Self::Consultation),
            "medication" => Ok(Self::Medication),
            _ => Err(anyhow::anyhow!("Invalid medical context: {}", s)),
        }
    }
}

/// Review priority; ordering follows urgency so `Critical` is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether creating a review at this priority should page a reviewer
    pub fn alerts_on_creation(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(anyhow::anyhow!("Invalid priority: {}", s)),
        }
    }
}

/// Performance profile that overrides routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    /// Cost control: reasoning only for medication or very long text
    Standard,
    /// Latency first: emergency keywords force the fast path
    Optimized,
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Optimized => write!(f, "optimized"),
        }
    }
}

impl std::str::FromStr for PerformanceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "optimized" => Ok(Self::Optimized),
            _ => Err(anyhow::anyhow!("Invalid performance mode: {}", s)),
        }
    }
}
