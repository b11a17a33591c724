//! Joins free-text aligner output back to the fixed requirement records.
//!
//! The aligner does not echo requirement text verbatim, so the join is a fuzzy
//! bidirectional containment test on the first 50 characters. Everything that
//! needs the join goes through `find_detail` or `best_detail`; swapping in an id-based join only
//! touches this file.

use crate::assessment::models::{AlignmentDetail, RequirementItem};

const MATCH_PREFIX_CHARS: usize = 50;

/// True when either text contains the other's first 50 characters.
/// Empty text never matches.
pub fn requirement_matches(description: &str, detail_requirement: &str) -> bool {
    if description.is_empty() || detail_requirement.is_empty() {
        return false;
    }
    let description_prefix = prefix(description);
    let detail_prefix = prefix(detail_requirement);
    detail_requirement.contains(description_prefix) || description.contains(detail_prefix)
}

/// Index of the first detail judged against `item`. Groups match through any option.
pub fn find_detail(item: &RequirementItem, details: &[AlignmentDetail]) -> Option<usize> {
    let descriptions = item.descriptions();
    details.iter().position(|detail| {
        descriptions
            .iter()
            .any(|description| requirement_matches(description, &detail.requirement))
    })
}

/// The detail that scores `item`. A single requirement takes its first match;
/// a group takes the best-judged match across all of its options, the first
/// one winning ties.
pub fn best_detail(item: &RequirementItem, details: &[AlignmentDetail]) -> Option<usize> {
    let RequirementItem::Group(_) = item else {
        return find_detail(item, details);
    };
    let descriptions = item.descriptions();
    let weight = item.weight();
    let mut best: Option<(usize, f64)> = None;
    for (index, detail) in details.iter().enumerate() {
        if !descriptions
            .iter()
            .any(|description| requirement_matches(description, &detail.requirement))
        {
            continue;
        }
        let award = detail.status.award(weight);
        if best.map_or(true, |(_, best_award)| award > best_award) {
            best = Some((index, award));
        }
    }
    best.map(|(index, _)| index)
}

fn prefix(text: &str) -> &str {
    match text.char_indices().nth(MATCH_PREFIX_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::{
        AlignmentStatus, Priority, Requirement, RequirementCategory, RequirementGroup,
    };

    fn detail(requirement: &str) -> AlignmentDetail {
        AlignmentDetail {
            category: RequirementCategory::TechnicalSkill,
            requirement: requirement.to_string(),
            priority: Priority::MustHave,
            status: AlignmentStatus::Aligned,
            justification: String::new(),
            score: 0.0,
            max_score: 0.0,
        }
    }

    fn single(description: &str) -> RequirementItem {
        RequirementItem::Requirement(Requirement {
            description: description.to_string(),
            priority: Priority::MustHave,
            weight: 5.0,
        })
    }

    #[test]
    fn test_detail_containing_description_matches() {
        assert!(requirement_matches("Python", "Python (3+ years)"));
    }

    #[test]
    fn test_description_containing_detail_matches() {
        assert!(requirement_matches("Strong SQL and data modelling", "SQL"));
    }

    #[test]
    fn test_unrelated_texts_do_not_match() {
        assert!(!requirement_matches("Kubernetes", "Terraform"));
    }

    #[test]
    fn test_empty_text_never_matches() {
        assert!(!requirement_matches("", "anything"));
        assert!(!requirement_matches("anything", ""));
    }

    #[test]
    fn test_long_texts_match_on_first_fifty_characters() {
        let description = "Experience designing and operating large-scale distributed storage systems in production";
        let echoed = "Experience designing and operating large-scale distributed systems";
        // Shared 50-character prefix; the tails diverge.
        assert!(requirement_matches(description, echoed));
    }

    #[test]
    fn test_prefix_respects_char_boundaries() {
        let text = "é".repeat(60);
        assert_eq!(prefix(&text).chars().count(), 50);
    }

    #[test]
    fn test_find_detail_for_group_matches_any_option() {
        let group = RequirementItem::Group(RequirementGroup {
            options: vec![
                Requirement {
                    description: "BSc Computer Science".to_string(),
                    priority: Priority::MustHave,
                    weight: 10.0,
                },
                Requirement {
                    description: "BSc Mathematics".to_string(),
                    priority: Priority::MustHave,
                    weight: 8.0,
                },
            ],
        });
        let details = vec![detail("Rust"), detail("BSc Mathematics or equivalent")];
        assert_eq!(find_detail(&group, &details), Some(1));
    }

    #[test]
    fn test_best_detail_for_group_prefers_aligned_option() {
        let group = RequirementItem::Group(RequirementGroup {
            options: vec![
                Requirement {
                    description: "BSc Computer Science".to_string(),
                    priority: Priority::MustHave,
                    weight: 10.0,
                },
                Requirement {
                    description: "BSc Mathematics".to_string(),
                    priority: Priority::MustHave,
                    weight: 10.0,
                },
            ],
        });
        let mut not_aligned = detail("BSc Computer Science");
        not_aligned.status = AlignmentStatus::NotAligned;
        let details = vec![not_aligned, detail("BSc Mathematics")];
        assert_eq!(find_detail(&group, &details), Some(0));
        assert_eq!(best_detail(&group, &details), Some(1));
    }

    #[test]
    fn test_best_detail_for_single_requirement_takes_first_match() {
        let mut first = detail("Rust");
        first.status = AlignmentStatus::NotAligned;
        assert_eq!(best_detail(&single("Rust"), &[first, detail("Rust")]), Some(0));
    }

    #[test]
    fn test_find_detail_returns_none_when_unjudged() {
        assert_eq!(find_detail(&single("Go"), &[detail("Rust")]), None);
    }
}
