//! Semantic Scorer: funnel stage 2, 0-65 points.

use crate::classifier::{self, ClassificationResult};
use crate::iap::IdealApplicantProfile;
use crate::models::{FundingProgram, Organization, ProgramIntent};
use crate::negative_signals::{self, clamp_total_penalty};
use crate::proximity::{self, ProximityBreakdown};

#[derive(Debug, Clone)]
pub struct SemanticScore {
    pub domain_relevance: f64,
    pub capability_fit: f64,
    pub intent_alignment: f64,
    pub negative_signals: f64,
    pub confidence_bonus: f64,
    pub score: f64,
}

fn domain_relevance(org: &Organization, classification: &ClassificationResult, proximity: Option<&ProximityBreakdown>) -> f64 {
    if let Some(p) = proximity {
        return (p.domain_fit.score / 30.0) * 25.0;
    }
    match &org.industry_sector {
        Some(sector) => classifier::get_industry_relevance(sector, &classification.industry) * 25.0,
        None => 8.0,
    }
}

fn capability_fit(org: &Organization, program: &FundingProgram, proximity: Option<&ProximityBreakdown>) -> f64 {
    if let Some(p) = proximity {
        return (p.capability_fit.score / 15.0) * 15.0;
    }

    let org_terms: Vec<String> = org
        .key_technologies
        .iter()
        .chain(org.technology_sub_domains.iter())
        .chain(org.research_focus_areas.iter())
        .map(|s| s.to_lowercase())
        .collect();

    if org_terms.is_empty() {
        return 3.0;
    }

    let title_tokens: Vec<String> = program
        .title
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect();
    let program_terms: Vec<String> =
        program.keywords.iter().map(|k| k.to_lowercase()).chain(title_tokens).collect();

    let hits = org_terms.iter().filter(|t| program_terms.iter().any(|p| p.contains(t.as_str()) || t.contains(p.as_str()))).count();

    match hits {
        0 => 0.0,
        1 => 6.0,
        2 => 10.0,
        3 => 13.0,
        _ => 15.0,
    }
}

fn intent_alignment(org: &Organization, program: &FundingProgram) -> f64 {
    let Some(intent) = program.program_intent else {
        return 4.0;
    };
    let Some(trl) = org.matching_trl() else {
        return 4.0;
    };

    match intent {
        ProgramIntent::BasicResearch => {
            if trl <= 3 {
                10.0
            } else if trl <= 5 {
                5.0
            } else {
                0.0
            }
        }
        ProgramIntent::AppliedResearch => {
            if (4..=6).contains(&trl) {
                10.0
            } else if trl <= 7 {
                6.0
            } else {
                3.0
            }
        }
        ProgramIntent::Commercialization => {
            if trl >= 7 {
                10.0
            } else if trl >= 5 {
                5.0
            } else {
                2.0
            }
        }
        ProgramIntent::Infrastructure | ProgramIntent::PolicySupport => 6.0,
    }
}

/// Computes the 0–65 semantic score. `proximity` is `Some` when the
/// program carries an IAP (§4.6's dimensions are rescaled into this
/// score instead of the keyword-overlap fallback paths).
pub fn score_semantic(
    org: &Organization,
    program: &FundingProgram,
    iap: Option<&IdealApplicantProfile>,
    proximity: Option<&ProximityBreakdown>,
) -> SemanticScore {
    let classification =
        classifier::classify_program(&program.title, program.program_name.as_deref(), program.ministry.as_deref());

    let domain = domain_relevance(org, &classification, proximity);
    let capability = capability_fit(org, program, proximity);
    let intent = intent_alignment(org, program);

    let signals = negative_signals::detect_negative_signals(org, &program.title, &classification);
    let negative = clamp_total_penalty(&signals);

    let confidence_bonus = iap.map(|p| (p.confidence * 10.0).round()).unwrap_or(0.0);

    let sum = domain + capability + intent + negative + confidence_bonus;

    SemanticScore {
        domain_relevance: domain,
        capability_fit: capability,
        intent_alignment: intent,
        negative_signals: negative,
        confidence_bonus,
        score: sum.max(0.0).min(65.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use std::collections::HashSet;

    fn org_with_sector(sector: &str) -> Organization {
        Organization {
            id: Id::from("o1"),
            name: "Test".to_string(),
            org_type: OrganizationType::Company,
            scale: CompanyScale::Small,
            employees: EmployeeRange::default(),
            revenue: RevenueRange::default(),
            business_structure: BusinessStructure::Corporation,
            industry_sector: Some(sector.to_string()),
            primary_business_domain: None,
            key_technologies: vec!["ai".to_string()],
            technology_sub_domains: vec![],
            research_focus_areas: vec![],
            description: None,
            trl: Some(5),
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

    fn program(title: &str) -> FundingProgram {
        FundingProgram {
            id: Id::from("p1"),
            agency_id: Id::from("a1"),
            title: title.to_string(),
            announcement_url: None,
            content_hash: "h".to_string(),
            scraped_at: chrono::Utc::now(),
            program_name: None,
            industry_category: None,
            keywords: vec!["AI".to_string()],
            ministry: Some("과학기술정보통신부".to_string()),
            agency: None,
            program_intent: Some(ProgramIntent::AppliedResearch),
            description: None,
            eligibility_criteria_text: None,
            requirements: Requirements::default(),
            status: ProgramStatus::Active,
            application_start: None,
            deadline: None,
            published_at: None,
            budget_amount_krw: None,
            ideal_applicant_profile: None,
            semantic_sub_domain: None,
            program_family: ProgramFamily::Rd,
        }
    }

    #[test]
    fn score_is_bounded_between_zero_and_sixty_five() {
        let org = org_with_sector("ICT");
        let prog = program("AI 데이터 플랫폼 기술개발");
        let result = score_semantic(&org, &prog, None, None);
        assert!(result.score >= 0.0 && result.score <= 65.0);
    }

    #[test]
    fn applied_research_sweet_spot_trl_maxes_intent_alignment() {
        let org = org_with_sector("ICT");
        let prog = program("AI 데이터 플랫폼 기술개발");
        let result = score_semantic(&org, &prog, None, None);
        assert_eq!(result.intent_alignment, 10.0);
    }

    #[test]
    fn bio_mismatch_applies_negative_signal() {
        let org = org_with_sector("ICT");
        let prog = program("치매 신약 임상시험 과제");
        let result = score_semantic(&org, &prog, None, None);
        assert_eq!(result.negative_signals, -8.0);
    }
}
