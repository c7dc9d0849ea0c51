//! Eligibility Gate: funnel stage 1, binary pass/fail pre-filter.
//!
//! Modeled with the same control-flow-inversion pattern as
//! `eligibility.rs`: each block rule is a predicate returning zero or
//! one block reason; the gate aggregates every hit rather than
//! stopping at the first one, so `blockReasons` stays complete for
//! observability.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier;
use crate::eligibility::{self, EligibilityResult};
use crate::models::{FundingProgram, Organization, OrganizationType, ProgramStatus, RegionCode};
use crate::program_type::{self, ApplicationType};
use crate::taxonomy;

const SME_MINISTRY: &str = "중소벤처기업부";
const INDUSTRY_MISMATCH_THRESHOLD: f64 = 0.45;

static TRAINING_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("교육과정|역량강화교육|양성과정|아카데미").unwrap());
static STRONG_RD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("연구개발|기술개발|R&D").unwrap());
static HOSPITAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("의사과학자|상급종합병원|M\\.D\\.-Ph\\.D\\.|의료법").unwrap());
static SME_STARTUP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("창업성장|TIPS|팁스|디딤돌").unwrap());

/// Regional keyword → the `RegionCode`(s) it names, used by
/// `SME_REGION_MISMATCH`. Only specific-region keywords are mapped here;
/// the generic 수도권/비수도권/지역 keywords are handled separately by
/// `SME_REGION_NON_METRO_ONLY`.
static REGIONAL_KEYWORD_MAP: Lazy<Vec<(&'static str, RegionCode)>> = Lazy::new(|| {
    vec![
        ("강원", RegionCode::Gangwon),
        ("충북", RegionCode::Chungbuk),
        ("충남", RegionCode::Chungnam),
        ("전북", RegionCode::Jeonbuk),
        ("전남", RegionCode::Jeonnam),
        ("경북", RegionCode::Gyeongbuk),
        ("경남", RegionCode::Gyeongnam),
        ("제주", RegionCode::Jeju),
        ("부산", RegionCode::Busan),
        ("대구", RegionCode::Daegu),
        ("광주", RegionCode::Gwangju),
        ("대전", RegionCode::Daejeon),
        ("울산", RegionCode::Ulsan),
        ("세종", RegionCode::Sejong),
    ]
});

static STOP_WORDS: Lazy<std::collections::HashSet<&'static str>> = Lazy::new(|| {
    ["지원", "사업", "공고", "모집", "년도", "추진", "계획", "안내"].into_iter().collect()
});

#[derive(Debug, Clone)]
pub struct GateResult {
    pub passed: bool,
    pub block_reasons: Vec<String>,
    pub application_type: ApplicationType,
    pub eligibility_result: Option<EligibilityResult>,
}

fn check_status_and_deadline(program: &FundingProgram, as_of: NaiveDate, include_expired: bool) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if program.status != ProgramStatus::Active && !include_expired {
        reasons.push("STATUS_INACTIVE");
    }
    if let Some(deadline) = program.deadline {
        if deadline < as_of && !include_expired {
            reasons.push("DEADLINE_PASSED");
        }
    }
    reasons
}

fn check_application_type(application_type: ApplicationType, org: &Organization) -> Option<&'static str> {
    match application_type {
        ApplicationType::Consolidated => Some("CONSOLIDATED_ANNOUNCEMENT"),
        ApplicationType::Designated => Some("DESIGNATED_PROJECT"),
        ApplicationType::DemandSurvey => Some("DEMAND_SURVEY"),
        ApplicationType::InstitutionalOnly if org.org_type != OrganizationType::ResearchInstitute => {
            Some("INSTITUTIONAL_ONLY")
        }
        _ => None,
    }
}

fn check_training_program(title_and_description: &str, org: &Organization) -> Option<&'static str> {
    if TRAINING_PATTERN.is_match(title_and_description)
        && !STRONG_RD_PATTERN.is_match(title_and_description)
        && org.org_type == OrganizationType::Company
    {
        Some("TRAINING_PROGRAM")
    } else {
        None
    }
}

fn check_org_type(program: &FundingProgram, org: &Organization) -> Option<&'static str> {
    if program.requirements.allowed_org_types.is_empty() {
        return None;
    }
    if program.requirements.allowed_org_types.contains(&org.org_type) {
        None
    } else {
        Some("ORG_TYPE_MISMATCH")
    }
}

fn check_business_structure(program: &FundingProgram, org: &Organization) -> Option<&'static str> {
    if program.requirements.allowed_business_structures.is_empty() {
        return None;
    }
    if program.requirements.allowed_business_structures.contains(&org.business_structure) {
        None
    } else {
        Some("BUSINESS_STRUCTURE_MISMATCH")
    }
}

fn check_trl_range(program: &FundingProgram, org: &Organization, include_expired: bool) -> Option<&'static str> {
    let range = program.requirements.trl_range?;
    let trl = org.matching_trl()?;
    let (lo, hi) = if include_expired {
        (range.min.saturating_sub(3), range.max.saturating_add(3))
    } else {
        (range.min, range.max)
    };
    if trl >= lo && trl <= hi {
        None
    } else {
        Some("TRL_OUT_OF_RANGE")
    }
}

fn check_hospital_only(title_and_description: &str, org: &Organization) -> Option<&'static str> {
    if HOSPITAL_PATTERN.is_match(title_and_description) && org.org_type != OrganizationType::ResearchInstitute {
        Some("HOSPITAL_ONLY")
    } else {
        None
    }
}

fn check_sme_blocks(program: &FundingProgram, org: &Organization) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if program.ministry.as_deref() != Some(SME_MINISTRY) {
        return reasons;
    }

    use crate::models::CompanyScale;
    if org.scale == CompanyScale::Large {
        reasons.push("SME_SCALE_BLOCK");
    }

    if SME_STARTUP_PATTERN.is_match(&program.title)
        && matches!(org.scale, CompanyScale::Medium | CompanyScale::SmallMedium)
    {
        reasons.push("SME_STARTUP_ONLY");
    }

    if program.title.contains("지역혁신") {
        let has_non_metro = org.locations.iter().any(|l| !l.is_metropolitan());
        if !has_non_metro {
            reasons.push("SME_REGION_NON_METRO_ONLY");
        }
    }

    let matched_regions: Vec<RegionCode> =
        REGIONAL_KEYWORD_MAP.iter().filter(|(kw, _)| program.title.contains(kw)).map(|(_, region)| *region).collect();
    if !matched_regions.is_empty() && !matched_regions.iter().any(|r| org.locations.contains(r)) {
        reasons.push("SME_REGION_MISMATCH");
    }

    reasons
}

/// Bypassed unless the SME program has an industry-specific
/// classification: not `GENERAL`, and reached via a matched keyword
/// rather than the ministry prior alone.
fn bypasses_industry_filter(program: &FundingProgram, classification: &classifier::ClassificationResult) -> bool {
    if program.ministry.as_deref() != Some(SME_MINISTRY) {
        return false;
    }
    !(classification.industry != "GENERAL" && classification.keyword_matched)
}

fn check_excluded_domain(org: &Organization, classification: &classifier::ClassificationResult) -> Option<&'static str> {
    if org.excluded_domains.iter().any(|d| d == &classification.industry) {
        Some("EXCLUDED_DOMAIN")
    } else {
        None
    }
}

fn check_industry_relevance(
    program: &FundingProgram,
    org: &Organization,
    classification: &classifier::ClassificationResult,
    active_only: bool,
) -> Option<&'static str> {
    if active_only && program.status != ProgramStatus::Active {
        return None;
    }
    if bypasses_industry_filter(program, classification) {
        return None;
    }

    let Some(org_sector) = &org.industry_sector else {
        return Some("UNKNOWN_SECTOR");
    };

    let relevance = taxonomy::calculate_industry_relevance(org_sector, &classification.industry);

    if relevance < INDUSTRY_MISMATCH_THRESHOLD {
        return Some("INDUSTRY_MISMATCH");
    }

    if relevance < 1.0 {
        let org_keywords: Vec<String> = org
            .key_technologies
            .iter()
            .chain(org.technology_sub_domains.iter())
            .map(|k| k.to_lowercase())
            .filter(|k| !STOP_WORDS.contains(k.as_str()))
            .collect();
        if !org_keywords.is_empty() {
            let title_lower = program.title.to_lowercase();
            let has_overlap = org_keywords.iter().any(|k| {
                program.keywords.iter().any(|pk| pk.to_lowercase().contains(k)) || title_lower.contains(k.as_str())
            });
            if !has_overlap {
                return Some("CROSS_INDUSTRY_NO_KEYWORD");
            }
        }
    }

    None
}

/// Evaluates every block rule, returning every reason that fired (not
/// just the first). `passed` is `block_reasons.is_empty()`.
pub fn evaluate_gate(
    org: &Organization,
    program: &FundingProgram,
    as_of: NaiveDate,
    include_expired: bool,
) -> GateResult {
    let mut reasons: Vec<String> = Vec::new();

    reasons.extend(check_status_and_deadline(program, as_of, include_expired).into_iter().map(String::from));

    let title_and_description = program.title_and_description();
    let application_type = program_type::detect_application_type(&title_and_description);
    let application_type =
        if program_type::is_consolidated(program) { ApplicationType::Consolidated } else { application_type };

    if let Some(r) = check_application_type(application_type, org) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_training_program(&title_and_description, org) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_org_type(program, org) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_business_structure(program, org) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_trl_range(program, org, include_expired) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_hospital_only(&title_and_description, org) {
        reasons.push(r.to_string());
    }
    reasons.extend(check_sme_blocks(program, org).into_iter().map(String::from));

    let classification =
        classifier::classify_program(&program.title, program.program_name.as_deref(), program.ministry.as_deref());

    if let Some(r) = check_excluded_domain(org, &classification) {
        reasons.push(r.to_string());
    }
    if let Some(r) = check_industry_relevance(program, org, &classification, true) {
        reasons.push(r.to_string());
    }

    let eligibility_result = eligibility::check_eligibility(org, program, as_of);
    if eligibility_result.level == crate::models::EligibilityLevel::Ineligible {
        reasons.push("HARD_REQUIREMENT_FAILED".to_string());
    }

    GateResult {
        passed: reasons.is_empty(),
        block_reasons: reasons,
        application_type,
        eligibility_result: Some(eligibility_result),
    }
}
