//! End-to-end funnel scenarios against the public `generate_matches`
//! API.

use std::collections::HashSet;

use chrono::NaiveDate;

use jiwon_match::config::FunnelOptions;
use jiwon_match::funnel::generate_matches;
use jiwon_match::models::*;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn ict_org() -> Organization {
    Organization {
        id: Id::from("org-ict"),
        name: "ICT Startup".to_string(),
        org_type: OrganizationType::Company,
        scale: CompanyScale::SmallMedium,
        employees: EmployeeRange { min: Some(20), max: Some(40) },
        revenue: RevenueRange { min_eok: Some(5.0), max_eok: Some(10.0) },
        business_structure: BusinessStructure::Corporation,
        industry_sector: Some("ICT".to_string()),
        primary_business_domain: None,
        key_technologies: vec!["AI".to_string(), "데이터분석".to_string(), "클라우드".to_string()],
        technology_sub_domains: vec![],
        research_focus_areas: vec![],
        description: None,
        trl: Some(6),
        target_research_trl: None,
        rd_experience: true,
        collaboration_count: 2,
        has_research_institute: false,
        certifications: HashSet::new(),
        government_certifications: HashSet::new(),
        industry_awards: vec![],
        prior_grant_wins: 1,
        investment_history: vec![],
        commercialization_capabilities: vec![],
        locations: HashSet::new(),
        excluded_domains: vec![],
        business_established_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
    }
}

fn base_program(id: &str, title: &str) -> FundingProgram {
    FundingProgram {
        id: Id::from(id),
        agency_id: Id::from("agency-1"),
        title: title.to_string(),
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
        requirements: Requirements { allowed_org_types: vec![OrganizationType::Company], ..Default::default() },
        status: ProgramStatus::Active,
        application_start: Some(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
        deadline: Some(as_of() + chrono::Duration::days(30)),
        published_at: None,
        budget_amount_krw: Some(1_000_000_000),
        ideal_applicant_profile: None,
        semantic_sub_domain: None,
        program_family: ProgramFamily::Rd,
    }
}

#[test]
fn scenario_1_ict_company_matches_ict_program() {
    let org = ict_org();
    let mut program = base_program("p1", "AI 데이터 플랫폼 기술개발");
    program.ministry = Some("과학기술정보통신부".to_string());
    program.keywords = vec!["AI".to_string(), "데이터".to_string(), "플랫폼".to_string()];

    let matches = generate_matches(Some(&org), &[program], 10, &FunnelOptions::default(), as_of(), None);

    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert!(m.total_score >= 30.0, "score was {}", m.total_score);
    assert!(m.v6_details.semantic.domain_relevance >= 20.0);
    assert!(m.v6_details.semantic.capability_fit >= 6.0);
    assert!(m.negative_signals.is_empty());
}

#[test]
fn scenario_2_dementia_program_hidden_from_ict_company() {
    let org = ict_org();
    let mut program = base_program("p2", "치매의료기술연구개발사업");
    program.ministry = Some("보건복지부".to_string());
    program.keywords = vec!["치매".to_string(), "의료".to_string(), "임상".to_string()];

    let options = FunnelOptions { include_expired: false, minimum_score: 55 };
    let matches = generate_matches(Some(&org), &[program], 10, &options, as_of(), None);

    assert!(matches.is_empty());
}

#[test]
fn scenario_3_designated_project_blocked() {
    let org = ict_org();
    let mut program = base_program("p3", "2026년 지정과제 연구개발");
    program.ministry = Some("과학기술정보통신부".to_string());

    let matches = generate_matches(Some(&org), &[program], 10, &FunnelOptions::default(), as_of(), None);
    assert!(matches.is_empty());
}

#[test]
fn scenario_4_demand_survey_blocked() {
    let org = ict_org();
    let mut program = base_program("p4", "2026년도 수요조사 안내");
    program.ministry = Some("과학기술정보통신부".to_string());

    let matches = generate_matches(Some(&org), &[program], 10, &FunnelOptions::default(), as_of(), None);
    assert!(matches.is_empty());
}

#[test]
fn scenario_5_expired_program_filtered_unless_opted_in() {
    let org = ict_org();
    let mut program = base_program("p5", "AI 플랫폼 기술개발");
    program.ministry = Some("과학기술정보통신부".to_string());
    program.keywords = vec!["AI".to_string()];
    program.deadline = Some(as_of() - chrono::Duration::days(1));
    program.requirements.trl_range = Some(TrlRangeReq { min: 5, max: 6 });

    let strict = generate_matches(Some(&org), &[program.clone()], 10, &FunnelOptions::default(), as_of(), None);
    assert!(strict.is_empty());

    let relaxed_options = FunnelOptions { include_expired: true, minimum_score: 0 };
    let relaxed = generate_matches(Some(&org), &[program], 10, &relaxed_options, as_of(), None);
    assert_eq!(relaxed.len(), 1);
}

#[test]
fn scenario_6_dedup_prefers_program_with_deadline() {
    let org = ict_org();

    let mut with_deadline = base_program("p6a", "2026년 AI 기술개발 사업 (1차)");
    with_deadline.ministry = Some("과학기술정보통신부".to_string());
    with_deadline.keywords = vec!["AI".to_string()];

    let mut without_deadline = base_program("p6b", "AI 기술개발 사업");
    without_deadline.ministry = Some("과학기술정보통신부".to_string());
    without_deadline.keywords = vec!["AI".to_string()];
    without_deadline.deadline = None;
    without_deadline.application_start = None;
    without_deadline.budget_amount_krw = None;

    let matches = generate_matches(
        Some(&org),
        &[with_deadline.clone(), without_deadline],
        10,
        &FunnelOptions { include_expired: false, minimum_score: 0 },
        as_of(),
        None,
    );

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].program_id, with_deadline.id);
}

#[test]
fn scenario_7_scale_ladder_proximity_matches_formula() {
    use jiwon_match::iap::IdealApplicantProfile;
    use jiwon_match::proximity::score_proximity;

    let mut org = ict_org();
    org.scale = CompanyScale::Startup;

    let iap = IdealApplicantProfile {
        version: "1.0".to_string(),
        preferred_scales: Some(vec![CompanyScale::SmallMedium]),
        ..Default::default()
    };

    let result = score_proximity(&org, &iap, None, as_of());

    let expected_scale_points = CompanyScale::Startup.ladder_proximity(CompanyScale::SmallMedium) * 3.0;
    // organizationFit = scale + age(no constraint→3) + type(no constraint→2)
    assert_eq!(result.organization_fit.score, expected_scale_points + 3.0 + 2.0);
}

#[tokio::test]
async fn scenario_8_iap_batch_resume_skips_already_generated_programs() {
    use jiwon_match::config::LlmRates;
    use jiwon_match::iap::generate_ideal_profile;

    let mut program = base_program("p8", "AI 플랫폼 기술개발");
    program.ministry = Some("과학기술정보통신부".to_string());

    let rates = LlmRates::default();
    let first = generate_ideal_profile(&program, false, None, &rates).await;
    assert!(!first.used_llm);
    assert_eq!(first.profile.version, "1.0");

    program.ideal_applicant_profile = Some(first.profile);
    assert!(program.has_iap());
}
