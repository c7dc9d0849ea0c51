//! Tier 1: rule-based IAP extraction, zero external calls.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::classifier;
use crate::models::{CompanyScale, FundingProgram};

use super::{
    BusinessAge, DimensionConfidence, FinancialProfile, GeneratedBy, IdealApplicantProfile,
    ProgramStage, TrlRangeIap, IAP_SCHEMA_VERSION,
};

/// SME-specific company-scale code enums, translated via fixed tables.
static SME_SCALE_CODES: Lazy<HashMap<&'static str, CompanyScale>> = Lazy::new(|| {
    HashMap::from([
        ("CC10", CompanyScale::SmallMedium),
        ("CC20", CompanyScale::Medium),
        ("CC30", CompanyScale::Large),
        ("CC01", CompanyScale::Micro),
        ("CC05", CompanyScale::Small),
    ])
});

/// SME-specific lifecycle/stage codes, e.g. `LC01 → STARTUP_FOCUSED`.
static SME_LIFECYCLE_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("LC01", "STARTUP_FOCUSED"),
        ("LC02", "GROWTH_FOCUSED"),
        ("LC03", "MATURE_FOCUSED"),
    ])
});

/// Resolves an SME scale code to a `CompanyScale`, if known.
pub fn resolve_sme_scale_code(code: &str) -> Option<CompanyScale> {
    SME_SCALE_CODES.get(code).copied()
}

/// Resolves an SME lifecycle code to its free-form stage label, if known.
pub fn resolve_sme_lifecycle_code(code: &str) -> Option<&'static str> {
    SME_LIFECYCLE_CODES.get(code).copied()
}

fn infer_program_stage_from_trl(min: u8, max: u8) -> ProgramStage {
    let mid = (min as f64 + max as f64) / 2.0;
    if mid <= 3.0 {
        ProgramStage::BasicResearch
    } else if mid <= 6.0 {
        ProgramStage::AppliedResearch
    } else {
        ProgramStage::Commercialization
    }
}

/// Region prefix-pattern inference from title: a title beginning with a
/// known regional prefix (e.g. "강원") implies a `SpecificRegions`
/// requirement; a "비수도권" prefix implies `NonMetropolitan`.
fn infer_region_from_title(title: &str) -> Option<(super::RegionRequirement, Option<Vec<String>>)> {
    const REGIONAL_PREFIXES: &[&str] = &[
        "강원", "충북", "충남", "전북", "전남", "경북", "경남", "제주", "부산", "대구", "광주", "대전", "울산", "세종",
    ];

    if title.starts_with("비수도권") {
        return Some((super::RegionRequirement::NonMetropolitan, None));
    }
    if title.starts_with("수도권") {
        return Some((super::RegionRequirement::Metropolitan, None));
    }
    for prefix in REGIONAL_PREFIXES {
        if title.starts_with(prefix) {
            return Some((super::RegionRequirement::SpecificRegions, Some(vec![prefix.to_string()])));
        }
    }
    None
}

pub fn build_rule_profile(program: &FundingProgram) -> IdealApplicantProfile {
    let mut dims: HashMap<String, DimensionConfidence> = HashMap::new();
    let mut profile = IdealApplicantProfile {
        version: IAP_SCHEMA_VERSION.to_string(),
        generated_by: GeneratedBy::Rule,
        ..Default::default()
    };

    if !program.requirements.allowed_org_types.is_empty() {
        profile.organization_types = Some(program.requirements.allowed_org_types.clone());
        dims.insert("organizationTypes".to_string(), DimensionConfidence::High);
    }

    if !program.requirements.allowed_business_structures.is_empty() {
        profile.allowed_business_structures = Some(program.requirements.allowed_business_structures.clone());
        dims.insert("allowedBusinessStructures".to_string(), DimensionConfidence::High);
    }

    if let Some(range) = program.requirements.trl_range {
        profile.trl_range = Some(TrlRangeIap {
            min: Some(range.min),
            max: Some(range.max),
            ideal_center: Some(((range.min as f64 + range.max as f64) / 2.0).round() as u8),
        });
        profile.program_stage = Some(infer_program_stage_from_trl(range.min, range.max));
        dims.insert("trlRange".to_string(), DimensionConfidence::High);
        dims.insert("programStage".to_string(), DimensionConfidence::High);
    } else {
        dims.insert("programStage".to_string(), DimensionConfidence::Inferred);
    }

    if !program.requirements.required_certifications.is_empty() {
        profile.required_certifications =
            Some(program.requirements.required_certifications.iter().cloned().collect());
        dims.insert("requiredCertifications".to_string(), DimensionConfidence::High);
    }
    if !program.requirements.preferred_certifications.is_empty() {
        profile.preferred_certifications =
            Some(program.requirements.preferred_certifications.iter().cloned().collect());
        dims.insert("preferredCertifications".to_string(), DimensionConfidence::Medium);
    }

    let has_financial_req = program.requirements.required_min_revenue_krw.is_some()
        || program.requirements.required_max_revenue_krw.is_some()
        || program.requirements.required_investment_amount_krw.is_some();
    if has_financial_req {
        profile.financial_profile = Some(FinancialProfile {
            min_revenue_krw: program.requirements.required_min_revenue_krw,
            requires_matching_fund: None,
            expects_prior_investment: program.requirements.required_investment_amount_krw.map(|v| v > 0),
        });
        dims.insert("financialProfile".to_string(), DimensionConfidence::Medium);
    }

    if program.requirements.required_operating_years.is_some() || program.requirements.max_operating_years.is_some() {
        profile.business_age = Some(BusinessAge {
            min_years: program.requirements.required_operating_years,
            max_years: program.requirements.max_operating_years,
            preferred_stage: None,
        });
        dims.insert("businessAge".to_string(), DimensionConfidence::High);
    }

    if let Some((region_req, specific)) = infer_region_from_title(&program.title) {
        profile.region_requirement = Some(region_req);
        profile.specific_regions = specific;
        dims.insert("regionRequirement".to_string(), DimensionConfidence::Medium);
    } else {
        profile.region_requirement = Some(super::RegionRequirement::Nationwide);
        dims.insert("regionRequirement".to_string(), DimensionConfidence::Inferred);
    }

    profile.requires_research_institute = Some(program.requirements.requires_research_institute);
    if program.requirements.requires_research_institute {
        dims.insert("requiresResearchInstitute".to_string(), DimensionConfidence::High);
    }

    let classification = classifier::classify_program(
        &program.title,
        program.program_name.as_deref(),
        program.ministry.as_deref(),
    );
    profile.primary_domain = Some(classification.industry);
    dims.insert(
        "primaryDomain".to_string(),
        if classification.ministry_based { DimensionConfidence::High } else { DimensionConfidence::Medium },
    );

    profile.technology_keywords = if program.keywords.is_empty() { None } else { Some(program.keywords.clone()) };

    profile.dimension_confidence = dims;
    profile.confidence = super::compute_overall_confidence(&profile.dimension_confidence);
    profile.source_text_length = program.title_and_description().len();

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn base_program() -> FundingProgram {
        FundingProgram {
            id: Id::from("p1"),
            agency_id: Id::from("a1"),
            title: "AI 데이터 플랫폼 기술개발".to_string(),
            announcement_url: None,
            content_hash: "h".to_string(),
            scraped_at: chrono::Utc::now(),
            program_name: None,
            industry_category: None,
            keywords: vec!["AI".to_string()],
            ministry: Some("과학기술정보통신부".to_string()),
            agency: None,
            program_intent: None,
            description: None,
            eligibility_criteria_text: None,
            requirements: Requirements { trl_range: Some(TrlRangeReq { min: 4, max: 6 }), ..Default::default() },
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
    fn trl_range_infers_applied_research_stage() {
        let program = base_program();
        let profile = build_rule_profile(&program);
        assert_eq!(profile.program_stage, Some(ProgramStage::AppliedResearch));
        assert_eq!(profile.trl_range.unwrap().ideal_center, Some(5));
    }

    #[test]
    fn primary_domain_uses_classifier() {
        let program = base_program();
        let profile = build_rule_profile(&program);
        assert_eq!(profile.primary_domain, Some("ICT".to_string()));
    }

    #[test]
    fn sme_scale_code_resolves() {
        assert_eq!(resolve_sme_scale_code("CC10"), Some(CompanyScale::SmallMedium));
        assert_eq!(resolve_sme_scale_code("ZZ99"), None);
    }

    #[test]
    fn region_prefix_inferred_from_title() {
        let mut program = base_program();
        program.title = "비수도권 스마트팜 기술개발".to_string();
        let profile = build_rule_profile(&program);
        assert_eq!(profile.region_requirement, Some(super::super::RegionRequirement::NonMetropolitan));
    }

    #[test]
    fn confidence_is_bounded() {
        let program = base_program();
        let profile = build_rule_profile(&program);
        assert!(profile.confidence >= 0.0 && profile.confidence <= 1.0);
        assert_eq!(profile.version, IAP_SCHEMA_VERSION);
    }
}
