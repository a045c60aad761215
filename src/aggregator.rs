use crate::models::{CompositeScore, OnPageFinding, TechnicalAudit};
use crate::scoring::{ScoringProfile, round_to};

/// Combines the technical audit and on-page findings into one score.
///
/// A missing audit or an empty findings list scores 0 on that side and adds
/// an explanatory issue instead of failing.
pub fn aggregate(
    technical: Option<&TechnicalAudit>,
    findings: &[OnPageFinding],
    profile: &ScoringProfile,
) -> CompositeScore {
    let mut issues: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();

    let technical_score = match technical {
        Some(audit) => {
            for check in &audit.checks {
                let prefix = format!("[technical/{}]", check.category);
                issues.extend(check.issues.iter().map(|i| format!("{} {}", prefix, i)));
                recommendations.extend(
                    check
                        .recommendations
                        .iter()
                        .map(|r| format!("{} {}", prefix, r)),
                );
            }
            weighted_technical_score(audit, profile)
        }
        None => {
            tracing::warn!("No technical audit available, technical score is 0");
            issues.push("[technical] No technical audit is available".to_string());
            recommendations.push("[technical] Run the technical checks for this site".to_string());
            0.0
        }
    };

    let onpage_score = if findings.is_empty() {
        tracing::warn!("No on-page findings available, on-page score is 0");
        issues.push("[on-page] No pages were analyzed".to_string());
        recommendations.push("[on-page] Analyze at least one page of the site".to_string());
        0.0
    } else {
        for finding in findings {
            let prefix = format!("[on-page {}]", finding.page_url);
            issues.extend(finding.issues.iter().map(|i| format!("{} {}", prefix, i)));
            recommendations.extend(
                finding
                    .recommendations
                    .iter()
                    .map(|r| format!("{} {}", prefix, r)),
            );
        }
        findings.iter().map(|f| f.score).sum::<f64>() / findings.len() as f64
    };

    let technical = round_to(technical_score.clamp(0.0, 100.0), 1);
    let onpage = round_to(onpage_score.clamp(0.0, 100.0), 1);

    CompositeScore {
        overall: round_to((technical + onpage) / 2.0, 1),
        technical,
        onpage,
        top_issues: longest_first(issues, profile.top_findings),
        top_recommendations: longest_first(recommendations, profile.top_findings),
    }
}

/// Weighted average over the categories present in the audit.
pub fn weighted_technical_score(audit: &TechnicalAudit, profile: &ScoringProfile) -> f64 {
    let (weighted, total_weight) = audit
        .checks
        .iter()
        .map(|check| (check.score, profile.weight(check.category)))
        .fold((0.0, 0.0), |(sum, weights), (score, weight)| {
            (sum + score * weight, weights + weight)
        });

    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    }
}

/// Length is only a stand-in for importance: longer messages tend to carry
/// more detail.
fn longest_first(mut items: Vec<String>, limit: usize) -> Vec<String> {
    items.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_first_is_stable() {
        let items = vec!["bb".to_string(), "a".to_string(), "cc".to_string(), "ddd".to_string()];
        assert_eq!(longest_first(items, 3), vec!["ddd", "bb", "cc"]);
    }

    #[test]
    fn test_nothing_to_aggregate() {
        let score = aggregate(None, &[], &ScoringProfile::default());
        assert_eq!(score.overall, 0.0);
        assert_eq!(score.technical, 0.0);
        assert_eq!(score.onpage, 0.0);
        assert_eq!(score.top_issues.len(), 2);
    }
}
