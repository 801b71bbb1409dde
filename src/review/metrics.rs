/*!
 * Aggregate review statistics over a recent time window.
 */

use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;

use super::models::{ReviewRequest, ReviewStatus};
use crate::errors::ValidationError;

pub const DEFAULT_TIMEFRAME: &str = "24h";
/// Number of issue kinds listed in `top_issues`
pub const TOP_ISSUES: usize = 5;

/// Parse `<n>m`, `<n>h` or `<n>d`; blank means 24 hours
pub fn parse_timeframe(timeframe: &str) -> Result<Duration, ValidationError> {
    let timeframe = timeframe.trim();
    if timeframe.is_empty() {
        return Ok(Duration::hours(24));
    }
    let invalid = || ValidationError::InvalidField {
        field: "timeframe".to_string(),
        value: timeframe.to_string(),
    };

    let unit = timeframe.chars().last().ok_or_else(invalid)?;
    let amount: i64 = timeframe[..timeframe.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }
    match unit.to_ascii_lowercase() {
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        'd' => Ok(Duration::days(amount)),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    pub issue: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetrics {
    pub timeframe: String,
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    /// Critical priority or emergency context
    pub emergency: usize,
    pub approved: usize,
    pub rejected: usize,
    pub requires_revision: usize,
    /// Creation to completion, over completed reviews
    pub average_review_seconds: f64,
    pub average_quality_score: f64,
    pub top_issues: Vec<IssueCount>,
}

/// Issue kind: the text before the first colon
fn issue_kind(issue: &str) -> &str {
    issue.split(':').next().unwrap_or(issue).trim()
}

impl ReviewMetrics {
    pub fn from_reviews(timeframe: &str, reviews: &[ReviewRequest]) -> Self {
        let count = |status: ReviewStatus| reviews.iter().filter(|r| r.status == status).count();

        let durations: Vec<f64> = reviews.iter().filter_map(|r| r.review_seconds()).collect();
        let average_review_seconds = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };
        let average_quality_score = if reviews.is_empty() {
            0.0
        } else {
            reviews
                .iter()
                .map(|r| r.quality_metrics.overall_quality)
                .sum::<f64>()
                / reviews.len() as f64
        };

        let mut issues: HashMap<&str, usize> = HashMap::new();
        for issue in reviews.iter().flat_map(|r| r.flagged_issues.iter()) {
            *issues.entry(issue_kind(issue)).or_insert(0) += 1;
        }
        let mut top_issues: Vec<IssueCount> = issues
            .into_iter()
            .map(|(issue, count)| IssueCount {
                issue: issue.to_string(),
                count,
            })
            .collect();
        top_issues.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.issue.cmp(&b.issue)));
        top_issues.truncate(TOP_ISSUES);

        Self {
            timeframe: timeframe.to_string(),
            total: reviews.len(),
            pending: count(ReviewStatus::Pending),
            in_review: count(ReviewStatus::InReview),
            emergency: reviews.iter().filter(|r| r.is_emergency()).count(),
            approved: count(ReviewStatus::Approved),
            rejected: count(ReviewStatus::Rejected),
            requires_revision: count(ReviewStatus::RequiresRevision),
            average_review_seconds,
            average_quality_score,
            top_issues,
        }
    }
}
