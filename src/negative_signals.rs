//! Rule-based penalties for active sector mismatches.

use crate::classifier::ClassificationResult;
use crate::models::{NegativeSignal, Organization};

const BIO_HARD_NEGATIVE_KEYWORDS: &[&str] = &[
    "임상", "치매", "신약", "약물", "치료제", "세포치료", "유전자치료", "백신", "항체", "의약품",
    "의료기기인허가", "독성시험", "동물실험",
];

const MANUFACTURING_HARD_NEGATIVE_KEYWORDS: &[&str] =
    &["양산", "제조공정", "공정개선", "소재", "부품", "소부장"];

const MARINE_HARD_NEGATIVE_KEYWORDS: &[&str] = &["조선", "해양플랜트", "항만", "수산양식"];

const AGRICULTURE_HARD_NEGATIVE_KEYWORDS: &[&str] = &["축산", "재배", "농작물", "농약"];
const SMART_FARM_EXEMPTION_KEYWORDS: &[&str] = &["스마트팜", "스마트농업"];

const DEFENSE_HARD_NEGATIVE_KEYWORDS: &[&str] = &["국방", "방위산업", "군수", "무기체계"];
const CYBER_EXEMPTION_KEYWORDS: &[&str] = &["사이버", "사이버보안"];

const LARGE_DEMONSTRATION_KEYWORDS: &[&str] = &["대규모실증", "대규모 실증"];

fn org_sector_contains(org: &Organization, token: &str) -> bool {
    org.industry_sector
        .as_deref()
        .map(|s| s.to_uppercase().contains(token))
        .unwrap_or(false)
}

fn title_matches_any(title: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| title.contains(kw))
}

struct NegativeRule {
    check: fn(&Organization, &str, &ClassificationResult) -> Option<NegativeSignal>,
}

fn rule_domain_mismatch_bio(org: &Organization, title: &str, classification: &ClassificationResult) -> Option<NegativeSignal> {
    if org_sector_contains(org, "ICT")
        && classification.industry == "BIO_HEALTH"
        && title_matches_any(title, BIO_HARD_NEGATIVE_KEYWORDS)
    {
        Some(NegativeSignal {
            code: "DOMAIN_MISMATCH_BIO".to_string(),
            penalty: -8.0,
            detail: "ICT organization against a bio/clinical-heavy program".to_string(),
        })
    } else {
        None
    }
}

fn rule_tech_irrelevant_manufacturing(org: &Organization, title: &str, classification: &ClassificationResult) -> Option<NegativeSignal> {
    if org_sector_contains(org, "ICT")
        && classification.industry == "MANUFACTURING"
        && title_matches_any(title, MANUFACTURING_HARD_NEGATIVE_KEYWORDS)
    {
        Some(NegativeSignal {
            code: "TECH_IRRELEVANT_MANUFACTURING".to_string(),
            penalty: -5.0,
            detail: "ICT organization against a manufacturing-process-heavy program".to_string(),
        })
    } else {
        None
    }
}

fn rule_domain_mismatch_marine(org: &Organization, title: &str, classification: &ClassificationResult) -> Option<NegativeSignal> {
    if org_sector_contains(org, "ICT")
        && classification.industry == "MARINE"
        && title_matches_any(title, MARINE_HARD_NEGATIVE_KEYWORDS)
    {
        Some(NegativeSignal {
            code: "DOMAIN_MISMATCH_MARINE".to_string(),
            penalty: -5.0,
            detail: "ICT organization against a marine/shipbuilding program".to_string(),
        })
    } else {
        None
    }
}

fn rule_domain_mismatch_agriculture(org: &Organization, title: &str, classification: &ClassificationResult) -> Option<NegativeSignal> {
    if org_sector_contains(org, "ICT")
        && classification.industry == "AGRICULTURE"
        && title_matches_any(title, AGRICULTURE_HARD_NEGATIVE_KEYWORDS)
        && !title_matches_any(title, SMART_FARM_EXEMPTION_KEYWORDS)
    {
        Some(NegativeSignal {
            code: "DOMAIN_MISMATCH_AGRICULTURE".to_string(),
            penalty: -5.0,
            detail: "ICT organization against a traditional-farming program (no smart-farm exemption)".to_string(),
        })
    } else {
        None
    }
}

fn rule_domain_mismatch_defense(org: &Organization, title: &str, classification: &ClassificationResult) -> Option<NegativeSignal> {
    if org_sector_contains(org, "ICT")
        && classification.industry == "DEFENSE"
        && title_matches_any(title, DEFENSE_HARD_NEGATIVE_KEYWORDS)
        && !title_matches_any(title, CYBER_EXEMPTION_KEYWORDS)
    {
        Some(NegativeSignal {
            code: "DOMAIN_MISMATCH_DEFENSE".to_string(),
            penalty: -5.0,
            detail: "ICT organization against a weapons-systems program (no cyber exemption)".to_string(),
        })
    } else {
        None
    }
}

fn rule_scale_startup_large_demonstration(org: &Organization, title: &str, _classification: &ClassificationResult) -> Option<NegativeSignal> {
    use crate::models::CompanyScale;
    if org.scale == CompanyScale::Startup && title_matches_any(title, LARGE_DEMONSTRATION_KEYWORDS) {
        Some(NegativeSignal {
            code: "SCALE_MISMATCH_LARGE_DEMONSTRATION".to_string(),
            penalty: -5.0,
            detail: "Startup-scale organization against a large-scale demonstration program".to_string(),
        })
    } else {
        None
    }
}

static RULES: &[NegativeRule] = &[
    NegativeRule { check: rule_domain_mismatch_bio },
    NegativeRule { check: rule_tech_irrelevant_manufacturing },
    NegativeRule { check: rule_domain_mismatch_marine },
    NegativeRule { check: rule_domain_mismatch_agriculture },
    NegativeRule { check: rule_domain_mismatch_defense },
    NegativeRule { check: rule_scale_startup_large_demonstration },
];

/// Runs the closed catalog of negative-signal rules, returning every hit.
/// The caller sums penalties and clamps to [-10, 0] before applying to
/// the semantic score.
pub fn detect_negative_signals(
    org: &Organization,
    title: &str,
    classification: &ClassificationResult,
) -> Vec<NegativeSignal> {
    RULES.iter().filter_map(|rule| (rule.check)(org, title, classification)).collect()
}

/// Sums penalties and clamps the running total to [-10, 0].
pub fn clamp_total_penalty(signals: &[NegativeSignal]) -> f64 {
    let sum: f64 = signals.iter().map(|s| s.penalty).sum();
    sum.clamp(-10.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassificationResult;
    use crate::models::*;
    use std::collections::HashSet;

    fn ict_org() -> Organization {
        Organization {
            id: Id::from("o1"),
            name: "ICT Co".to_string(),
            org_type: OrganizationType::Company,
            scale: CompanyScale::Small,
            employees: EmployeeRange::default(),
            revenue: RevenueRange::default(),
            business_structure: BusinessStructure::Corporation,
            industry_sector: Some("ICT".to_string()),
            primary_business_domain: None,
            key_technologies: vec![],
            technology_sub_domains: vec![],
            research_focus_areas: vec![],
            description: None,
            trl: Some(6),
            target_research_trl: None,
            rd_experience: true,
            collaboration_count: 0,
            has_research_institute: false,
            certifications: HashSet::new(),
            government_certifications: HashSet::new(),
            industry_awards: vec![],
            prior_grant_wins: 0,
            investment_history: vec![],
            commercialization_capabilities: vec![],
            locations: HashSet::new(),
            excluded_domains: vec![],
            business_established_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[test]
    fn bio_mismatch_fires_for_ict_vs_clinical_program() {
        let org = ict_org();
        let classification = ClassificationResult { industry: "BIO_HEALTH".to_string(), confidence: 1.0, ministry_based: true, keyword_matched: true };
        let signals = detect_negative_signals(&org, "치매의료기술연구개발사업", &classification);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].code, "DOMAIN_MISMATCH_BIO");
        assert_eq!(signals[0].penalty, -8.0);
    }

    #[test]
    fn no_signals_for_matching_domain() {
        let org = ict_org();
        let classification = ClassificationResult { industry: "ICT".to_string(), confidence: 1.0, ministry_based: true, keyword_matched: true };
        let signals = detect_negative_signals(&org, "AI 데이터 플랫폼 기술개발", &classification);
        assert!(signals.is_empty());
    }

    #[test]
    fn smart_farm_exempts_agriculture_penalty() {
        let org = ict_org();
        let classification = ClassificationResult { industry: "AGRICULTURE".to_string(), confidence: 1.0, ministry_based: false, keyword_matched: true };
        let signals = detect_negative_signals(&org, "스마트팜 축산 데이터 플랫폼", &classification);
        assert!(signals.is_empty());
    }

    #[test]
    fn clamp_total_penalty_floors_at_minus_ten() {
        let signals = vec![
            NegativeSignal { code: "A".to_string(), penalty: -8.0, detail: String::new() },
            NegativeSignal { code: "B".to_string(), penalty: -5.0, detail: String::new() },
        ];
        assert_eq!(clamp_total_penalty(&signals), -10.0);
    }

    #[test]
    fn clamp_total_penalty_never_goes_positive() {
        assert_eq!(clamp_total_penalty(&[]), 0.0);
    }
}
