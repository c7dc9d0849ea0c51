//! Funnel Orchestrator: dedup, gate, score, filter, sort, slice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::FunnelOptions;
use crate::gate::{self, GateResult};
use crate::models::{EligibilityLevel, FundingProgram, Gap, MatchScore, NegativeSignal, Organization, V4CompatibleBreakdown};
use crate::practical::{self, PracticalScore};
use crate::proximity;
use crate::semantic::{self, SemanticScore};
use crate::trl;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub semantic: SemanticBreakdownOut,
    pub practical: PracticalBreakdownOut,
    pub application_type: String,
    pub algorithm_version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticBreakdownOut {
    pub domain_relevance: f64,
    pub capability_fit: f64,
    pub intent_alignment: f64,
    pub negative_signals: f64,
    pub confidence_bonus: f64,
    pub score: f64,
}

impl From<&SemanticScore> for SemanticBreakdownOut {
    fn from(s: &SemanticScore) -> Self {
        SemanticBreakdownOut {
            domain_relevance: s.domain_relevance,
            capability_fit: s.capability_fit,
            intent_alignment: s.intent_alignment,
            negative_signals: s.negative_signals,
            confidence_bonus: s.confidence_bonus,
            score: s.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticalBreakdownOut {
    pub trl_alignment: f64,
    pub scale_fit: f64,
    pub rd_track: f64,
    pub deadline_urgency: f64,
    pub certification_bonus: f64,
    pub score: f64,
}

impl From<&PracticalScore> for PracticalBreakdownOut {
    fn from(p: &PracticalScore) -> Self {
        PracticalBreakdownOut {
            trl_alignment: p.trl_alignment,
            scale_fit: p.scale_fit,
            rd_track: p.rd_track,
            deadline_urgency: p.deadline_urgency,
            certification_bonus: p.certification_bonus,
            score: p.score,
        }
    }
}

static YEAR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d{4}년도?\s*").unwrap());
static TRAILING_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)\s*$").unwrap());
static YEAR_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(?\d{4}\)?\s*$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Idempotent title normalizer used for pre-dedup grouping: strips a
/// leading year prefix, trailing parentheticals, a trailing year
/// suffix, collapses whitespace, lowercases.
pub fn normalize_title(title: &str) -> String {
    let mut s = title.to_string();
    s = YEAR_PREFIX.replace(&s, "").to_string();
    s = TRAILING_PARENS.replace(&s, "").to_string();
    s = YEAR_SUFFIX.replace(&s, "").to_string();
    s = WHITESPACE.replace_all(&s, " ").trim().to_string();
    s.to_lowercase()
}

fn dedup_key(program: &FundingProgram) -> (String, String) {
    (program.agency_id.to_string(), normalize_title(&program.title))
}

/// Picks the best of a dedup group: has-deadline > has-budget >
/// earliest `scrapedAt`.
fn pick_best<'a>(group: &[&'a FundingProgram]) -> &'a FundingProgram {
    *group
        .iter()
        .max_by(|a, b| {
            let deadline_cmp = a.deadline.is_some().cmp(&b.deadline.is_some());
            if deadline_cmp != std::cmp::Ordering::Equal {
                return deadline_cmp;
            }
            let budget_cmp = a.budget_amount_krw.is_some().cmp(&b.budget_amount_krw.is_some());
            if budget_cmp != std::cmp::Ordering::Equal {
                return budget_cmp;
            }
            // earliest scrapedAt wins, so reverse the natural order for max_by
            b.scraped_at.cmp(&a.scraped_at)
        })
        .expect("group is non-empty")
}

fn dedup_programs(programs: &[FundingProgram]) -> Vec<&FundingProgram> {
    let mut groups: HashMap<(String, String), Vec<&FundingProgram>> = HashMap::new();
    for program in programs {
        groups.entry(dedup_key(program)).or_default().push(program);
    }
    groups.into_values().map(|group| pick_best(&group)).collect()
}

#[derive(Debug, Default, Clone)]
pub struct FunnelCounters {
    pub processed: usize,
    pub gate_blocked: usize,
    pub block_reason_counts: HashMap<String, usize>,
    pub low_semantic: usize,
    pub above_threshold: usize,
    pub errors: usize,
}

/// Cooperative cancellation signal, checked between program iterations
/// (§5 "the funnel is loop-cancellable").
pub fn new_cancellation_signal() -> std::sync::Arc<AtomicBool> {
    std::sync::Arc::new(AtomicBool::new(false))
}

fn evaluate_one(
    org: &Organization,
    program: &FundingProgram,
    as_of: NaiveDate,
    options: &FunnelOptions,
) -> Result<Option<MatchScore>, GateResult> {
    let gate_result = gate::evaluate_gate(org, program, as_of, options.include_expired);
    if !gate_result.passed {
        return Err(gate_result);
    }

    let classification = crate::classifier::classify_program(
        &program.title,
        program.program_name.as_deref(),
        program.ministry.as_deref(),
    );

    let iap = program.ideal_applicant_profile.as_ref();
    let proximity_breakdown =
        iap.map(|p| proximity::score_proximity(org, p, program.deadline, as_of));

    let semantic_score = semantic::score_semantic(org, program, iap, proximity_breakdown.as_ref());

    let trl_result = trl::score_trl(org.matching_trl(), program.requirements.trl_range);
    let practical_score = practical::score_practical(
        org,
        trl_result,
        program.deadline,
        as_of,
        iap,
        proximity_breakdown.as_ref(),
    );

    // §8: `score = round(semantic.score + practical.score)`.
    let total_score = (semantic_score.score + practical_score.score).round();

    let negative_signals: Vec<NegativeSignal> = crate::negative_signals::detect_negative_signals(
        org,
        &program.title,
        &classification,
    );

    let mut gaps: Vec<Gap> = proximity_breakdown.as_ref().map(|p| p.gaps.clone()).unwrap_or_default();
    if semantic_score.domain_relevance < 25.0 * 0.3 {
        gaps.push(Gap {
            dimension: "domainRelevance".to_string(),
            severity: crate::models::GapSeverity::Medium,
            is_blocker: false,
            description: "domain relevance below 30% of its weight".to_string(),
        });
    }

    let eligibility_result = gate_result.eligibility_result.expect("gate always computes eligibility on pass");

    let breakdown = MatchBreakdown {
        semantic: SemanticBreakdownOut::from(&semantic_score),
        practical: PracticalBreakdownOut::from(&practical_score),
        application_type: gate_result.application_type.as_str().to_string(),
        algorithm_version: proximity::PROXIMITY_ALGORITHM_VERSION,
    };

    let v4_breakdown = V4CompatibleBreakdown {
        keyword_score: semantic_score.domain_relevance,
        industry_score: semantic_score.capability_fit + semantic_score.intent_alignment,
        trl_score: practical_score.trl_alignment,
        type_score: practical_score.scale_fit,
        rd_score: practical_score.rd_track,
        deadline_score: practical_score.deadline_urgency,
    };

    Ok(Some(MatchScore {
        program_id: program.id.clone(),
        organization_id: org.id.clone(),
        total_score,
        eligibility_level: eligibility_result.level,
        needs_manual_review: eligibility_result.needs_manual_review,
        reason_codes: eligibility_result.reasons,
        gaps,
        negative_signals,
        v6_details: breakdown,
        v4_breakdown,
    }))
}

/// `generateMatches(org, programs, limit, options) -> [MatchScore]`
/// (§6.1, §4.12). Every per-program failure is isolated: it is logged
/// and the program dropped, never aborting the batch.
pub fn generate_matches(
    org: Option<&Organization>,
    programs: &[FundingProgram],
    limit: usize,
    options: &FunnelOptions,
    as_of: NaiveDate,
    cancellation: Option<&AtomicBool>,
) -> Vec<MatchScore> {
    let Some(org) = org else {
        return Vec::new();
    };
    if programs.is_empty() {
        return Vec::new();
    }

    let deduped = dedup_programs(programs);
    let candidates: Vec<&FundingProgram> = deduped
        .into_iter()
        .filter(|program| {
            if program.status != crate::models::ProgramStatus::Active && !options.include_expired {
                return false;
            }
            if let Some(deadline) = program.deadline {
                if deadline < as_of && !options.include_expired {
                    return false;
                }
            }
            true
        })
        .collect();

    let mut counters = FunnelCounters::default();
    let mut matches = Vec::new();

    if cancellation.is_some_and(|c| c.load(Ordering::Relaxed)) {
        info!("funnel cancelled before scoring pass");
        return Vec::new();
    }

    // Gate evaluation and scoring are independent per program, so the
    // pass runs on rayon's thread pool; cancellation is only checked at
    // this coarser, batch-level granularity rather than per program.
    let results: Vec<Result<Option<MatchScore>, GateResult>> =
        candidates.par_iter().map(|program| evaluate_one(org, program, as_of, options)).collect();

    counters.processed = results.len();

    for result in results {
        match result {
            Ok(Some(score)) => {
                if score.total_score < 20.0 {
                    counters.low_semantic += 1;
                }
                matches.push(score);
            }
            Ok(None) => {}
            Err(gate_result) => {
                counters.gate_blocked += 1;
                for reason in &gate_result.block_reasons {
                    *counters.block_reason_counts.entry(reason.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    debug!(
        processed = counters.processed,
        gate_blocked = counters.gate_blocked,
        low_semantic = counters.low_semantic,
        "funnel pass complete"
    );

    let minimum_score = options.minimum_score as f64;
    matches.retain(|m| m.total_score >= minimum_score);
    counters.above_threshold = matches.len();

    if matches.len() < counters.processed {
        warn!(
            dropped = counters.processed.saturating_sub(matches.len()),
            "programs scored below minimum threshold or were gate-blocked"
        );
    }

    matches.sort_by(match_ordering);

    matches.truncate(limit);
    matches
}

/// Eligibility level ascending, then score descending, then `program_id`
/// ascending. The `program_id` tie-break keeps ordering stable across
/// runs: `HashMap` iteration order in `dedup_programs` varies between
/// process invocations, and without it two equal-scoring programs could
/// come out in a different order each time.
fn match_ordering(a: &MatchScore, b: &MatchScore) -> std::cmp::Ordering {
    let level_rank = |l: EligibilityLevel| match l {
        EligibilityLevel::FullyEligible => 0,
        EligibilityLevel::ConditionallyEligible => 1,
        EligibilityLevel::Ineligible => 2,
    };
    level_rank(a.eligibility_level)
        .cmp(&level_rank(b.eligibility_level))
        .then(b.total_score.partial_cmp(&a.total_score).unwrap_or(std::cmp::Ordering::Equal))
        .then(a.program_id.to_string().cmp(&b.program_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_is_idempotent() {
        let title = "2025년도 AI 플랫폼 기술개발 지원사업 (2차)";
        let once = normalize_title(title);
        let twice = normalize_title(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_title_strips_year_prefix_and_parens() {
        let normalized = normalize_title("2025년 스마트팜 기술개발 (1차공고)");
        assert!(!normalized.contains("2025"));
        assert!(!normalized.contains("1차공고"));
    }

    #[test]
    fn empty_program_list_returns_empty() {
        use crate::models::*;
        let org = Organization {
            id: Id::from("o1"),
            name: "x".to_string(),
            org_type: OrganizationType::Company,
            scale: CompanyScale::Small,
            employees: EmployeeRange::default(),
            revenue: RevenueRange::default(),
            business_structure: BusinessStructure::Corporation,
            industry_sector: None,
            primary_business_domain: None,
            key_technologies: vec![],
            technology_sub_domains: vec![],
            research_focus_areas: vec![],
            description: None,
            trl: None,
            target_research_trl: None,
            rd_experience: false,
            collaboration_count: 0,
            has_research_institute: false,
            certifications: Default::default(),
            government_certifications: Default::default(),
            industry_awards: vec![],
            prior_grant_wins: 0,
            investment_history: vec![],
            commercialization_capabilities: vec![],
            locations: Default::default(),
            excluded_domains: vec![],
            business_established_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        let result = generate_matches(Some(&org), &[], 10, &FunnelOptions::default(), chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), None);
        assert!(result.is_empty());
    }

    #[test]
    fn nil_organization_returns_empty() {
        let result = generate_matches(None, &[], 10, &FunnelOptions::default(), chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), None);
        assert!(result.is_empty());
    }

    fn dummy_match(program_id: &str, total_score: f64, eligibility_level: EligibilityLevel) -> MatchScore {
        use crate::models::*;
        MatchScore {
            program_id: Id::from(program_id),
            organization_id: Id::from("o1"),
            total_score,
            eligibility_level,
            needs_manual_review: false,
            reason_codes: vec![],
            gaps: vec![],
            negative_signals: vec![],
            v6_details: MatchBreakdown {
                semantic: SemanticBreakdownOut {
                    domain_relevance: 0.0,
                    capability_fit: 0.0,
                    intent_alignment: 0.0,
                    negative_signals: 0.0,
                    confidence_bonus: 0.0,
                    score: 0.0,
                },
                practical: PracticalBreakdownOut {
                    trl_alignment: 0.0,
                    scale_fit: 0.0,
                    rd_track: 0.0,
                    deadline_urgency: 0.0,
                    certification_bonus: 0.0,
                    score: 0.0,
                },
                application_type: "OPEN_COMPETITION".to_string(),
                algorithm_version: proximity::PROXIMITY_ALGORITHM_VERSION,
            },
            v4_breakdown: V4CompatibleBreakdown {
                keyword_score: 0.0,
                industry_score: 0.0,
                trl_score: 0.0,
                type_score: 0.0,
                rd_score: 0.0,
                deadline_score: 0.0,
            },
        }
    }

    #[test]
    fn equal_scoring_ties_break_on_program_id_regardless_of_input_order() {
        let mut a = vec![
            dummy_match("p2", 50.0, EligibilityLevel::FullyEligible),
            dummy_match("p1", 50.0, EligibilityLevel::FullyEligible),
        ];
        let mut b = vec![
            dummy_match("p1", 50.0, EligibilityLevel::FullyEligible),
            dummy_match("p2", 50.0, EligibilityLevel::FullyEligible),
        ];
        a.sort_by(match_ordering);
        b.sort_by(match_ordering);
        let ids_a: Vec<_> = a.iter().map(|m| m.program_id.to_string()).collect();
        let ids_b: Vec<_> = b.iter().map(|m| m.program_id.to_string()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(ids_a, vec!["p1".to_string(), "p2".to_string()]);
    }
}
