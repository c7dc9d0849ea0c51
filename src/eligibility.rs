//! Three-tier hard/soft requirement evaluation.
//!
//! Modeled per §9's "control flow inversion" note: each hard requirement
//! is a predicate function returning zero or one failure reason, rather
//! than a fall-through return-or-continue loop. The checker aggregates.

use chrono::NaiveDate;

use crate::models::{EligibilityLevel, FundingProgram, Organization};

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityResult {
    pub level: EligibilityLevel,
    pub needs_manual_review: bool,
    pub reasons: Vec<String>,
}

struct HardCheck {
    failed: bool,
    needs_manual_review: bool,
    reason: String,
}

fn check_required_certifications(org: &Organization, program: &FundingProgram) -> HardCheck {
    let missing: Vec<&String> = program
        .requirements
        .required_certifications
        .iter()
        .filter(|c| !org.certifications.contains(*c))
        .collect();

    if missing.is_empty() {
        HardCheck { failed: false, needs_manual_review: false, reason: "required certifications satisfied".to_string() }
    } else {
        let names: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
        HardCheck {
            failed: true,
            needs_manual_review: false,
            reason: format!("missing required certifications: {}", names.join(", ")),
        }
    }
}

fn check_investment_amount(org: &Organization, program: &FundingProgram) -> Option<HardCheck> {
    let required = program.requirements.required_investment_amount_krw?;
    if org.investment_history.is_empty() {
        return Some(HardCheck {
            failed: true,
            needs_manual_review: true,
            reason: "no investment history recorded; required investment amount cannot be verified".to_string(),
        });
    }
    let sum = org.sum_verified_investment();
    if sum >= required {
        Some(HardCheck { failed: false, needs_manual_review: false, reason: "verified investment meets requirement".to_string() })
    } else {
        Some(HardCheck {
            failed: true,
            needs_manual_review: false,
            reason: format!("verified investment {sum} KRW below required {required} KRW"),
        })
    }
}

fn check_employee_count(org: &Organization, program: &FundingProgram) -> Option<HardCheck> {
    if program.requirements.required_min_employees.is_none() && program.requirements.required_max_employees.is_none() {
        return None;
    }
    let Some(mid) = org.employees.midpoint() else {
        return Some(HardCheck {
            failed: true,
            needs_manual_review: true,
            reason: "employee count data missing".to_string(),
        });
    };
    let min = program.requirements.required_min_employees.unwrap_or(0) as f64;
    let max = program.requirements.required_max_employees.map(|v| v as f64).unwrap_or(f64::MAX);
    if mid >= min && mid <= max {
        Some(HardCheck { failed: false, needs_manual_review: false, reason: "employee count within range".to_string() })
    } else {
        Some(HardCheck {
            failed: true,
            needs_manual_review: false,
            reason: format!("employee count midpoint {mid} outside [{min}, {max}]"),
        })
    }
}

fn check_revenue(org: &Organization, program: &FundingProgram) -> Option<HardCheck> {
    if program.requirements.required_min_revenue_krw.is_none() && program.requirements.required_max_revenue_krw.is_none() {
        return None;
    }
    let Some(mid) = org.revenue.midpoint_krw() else {
        return Some(HardCheck {
            failed: true,
            needs_manual_review: true,
            reason: "revenue data missing".to_string(),
        });
    };
    let min = program.requirements.required_min_revenue_krw.unwrap_or(0) as f64;
    let max = program.requirements.required_max_revenue_krw.map(|v| v as f64).unwrap_or(f64::MAX);
    if mid >= min && mid <= max {
        Some(HardCheck { failed: false, needs_manual_review: false, reason: "revenue within range".to_string() })
    } else {
        Some(HardCheck {
            failed: true,
            needs_manual_review: false,
            reason: format!("revenue midpoint {mid} outside [{min}, {max}]"),
        })
    }
}

fn check_operating_years(org: &Organization, program: &FundingProgram, as_of: NaiveDate) -> Option<HardCheck> {
    if program.requirements.required_operating_years.is_none() && program.requirements.max_operating_years.is_none() {
        return None;
    }
    let years = org.operating_years(as_of);
    let min = program.requirements.required_operating_years.unwrap_or(0) as i64;
    let max = program.requirements.max_operating_years.map(|v| v as i64).unwrap_or(i64::MAX);
    if years >= min && years <= max {
        Some(HardCheck { failed: false, needs_manual_review: false, reason: "operating years within range".to_string() })
    } else {
        Some(HardCheck {
            failed: true,
            needs_manual_review: false,
            reason: format!("operating years {years} outside [{min}, {max}]"),
        })
    }
}

fn soft_requirements_met(org: &Organization, program: &FundingProgram) -> bool {
    let preferred_cert_hit = program
        .requirements
        .preferred_certifications
        .iter()
        .any(|c| org.certifications.contains(c));
    preferred_cert_hit || org.prior_grant_wins > 0 || !org.industry_awards.is_empty()
}

pub fn check_eligibility(org: &Organization, program: &FundingProgram, as_of: NaiveDate) -> EligibilityResult {
    let mut reasons = Vec::new();
    let mut failed = false;
    let mut needs_manual_review = false;

    let cert_check = check_required_certifications(org, program);
    reasons.push(cert_check.reason.clone());
    if cert_check.failed {
        failed = true;
    }

    for check in [
        check_investment_amount(org, program),
        check_employee_count(org, program),
        check_revenue(org, program),
        check_operating_years(org, program, as_of),
    ]
    .into_iter()
    .flatten()
    {
        reasons.push(check.reason);
        if check.failed {
            failed = true;
        }
        if check.needs_manual_review {
            needs_manual_review = true;
        }
    }

    if failed {
        return EligibilityResult { level: EligibilityLevel::Ineligible, needs_manual_review, reasons };
    }

    let level = if soft_requirements_met(org, program) {
        reasons.push("soft requirements met".to_string());
        EligibilityLevel::FullyEligible
    } else {
        reasons.push("no soft requirement hit".to_string());
        EligibilityLevel::ConditionallyEligible
    };

    EligibilityResult { level, needs_manual_review, reasons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use std::collections::HashSet;

    fn base_org() -> Organization {
        Organization {
            id: Id::from("org-1"),
            name: "Test Co".to_string(),
            org_type: OrganizationType::Company,
            scale: CompanyScale::Small,
            employees: EmployeeRange { min: Some(10), max: Some(20) },
            revenue: RevenueRange { min_eok: Some(1.0), max_eok: Some(2.0) },
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
            business_established_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    fn base_program() -> FundingProgram {
        FundingProgram {
            id: Id::from("prog-1"),
            agency_id: Id::from("agency-1"),
            title: "Test Program".to_string(),
            announcement_url: None,
            content_hash: "hash".to_string(),
            scraped_at: chrono::Utc::now(),
            program_name: None,
            industry_category: None,
            keywords: vec![],
            ministry: None,
            agency: None,
            program_intent: None,
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
    fn no_requirements_yields_conditionally_eligible() {
        let org = base_org();
        let program = base_program();
        let result = check_eligibility(&org, &program, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result.level, EligibilityLevel::ConditionallyEligible);
        assert!(!result.needs_manual_review);
    }

    #[test]
    fn soft_requirement_hit_yields_fully_eligible() {
        let mut org = base_org();
        org.prior_grant_wins = 1;
        let program = base_program();
        let result = check_eligibility(&org, &program, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result.level, EligibilityLevel::FullyEligible);
    }

    #[test]
    fn missing_investment_history_triggers_manual_review() {
        let org = base_org();
        let mut program = base_program();
        program.requirements.required_investment_amount_krw = Some(1_000_000);
        let result = check_eligibility(&org, &program, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result.level, EligibilityLevel::Ineligible);
        assert!(result.needs_manual_review);
    }

    #[test]
    fn missing_required_certification_is_ineligible() {
        let org = base_org();
        let mut program = base_program();
        program.requirements.required_certifications.insert("ISO9001".to_string());
        let result = check_eligibility(&org, &program, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result.level, EligibilityLevel::Ineligible);
        assert!(!result.needs_manual_review);
    }

    #[test]
    fn operating_years_out_of_range_fails() {
        let org = base_org();
        let mut program = base_program();
        program.requirements.required_operating_years = Some(10);
        let result = check_eligibility(&org, &program, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result.level, EligibilityLevel::Ineligible);
    }
}
