//! Practical Scorer: funnel stage 3, 0-35 points.

use chrono::NaiveDate;

use crate::iap::IdealApplicantProfile;
use crate::models::Organization;
use crate::proximity::ProximityBreakdown;
use crate::trl::{self, TrlScoreResult};

#[derive(Debug, Clone)]
pub struct PracticalScore {
    pub trl_alignment: f64,
    pub scale_fit: f64,
    pub rd_track: f64,
    pub deadline_urgency: f64,
    pub certification_bonus: f64,
    pub score: f64,
}

fn scale_fit(org: &Organization, proximity: Option<&ProximityBreakdown>) -> f64 {
    if let Some(p) = proximity {
        let organization_component = (p.organization_fit.score / 15.0) * 6.0;
        let financial_component = (p.financial_fit.score / 5.0) * 2.0;
        return organization_component + financial_component;
    }
    if org.employees.midpoint().is_some() || org.revenue.midpoint_krw().is_some() {
        4.0
    } else {
        2.0
    }
}

fn rd_track(org: &Organization) -> f64 {
    let mut score = 0.0;
    if org.rd_experience {
        score += 3.0;
    }
    if org.collaboration_count >= 3 {
        score += 2.0;
    } else if org.collaboration_count >= 1 {
        score += 1.0;
    }
    score
}

fn deadline_urgency(deadline: Option<NaiveDate>, as_of: NaiveDate) -> f64 {
    match deadline {
        None => 3.0,
        Some(d) => {
            let days = (d - as_of).num_days();
            if days < 0 {
                0.0
            } else if days <= 7 {
                7.0
            } else if days <= 30 {
                6.0
            } else if days <= 60 {
                4.0
            } else {
                3.0
            }
        }
    }
}

fn certification_bonus(org: &Organization, iap: Option<&IdealApplicantProfile>) -> f64 {
    let Some(iap) = iap else { return 0.0 };

    if let Some(preferred) = &iap.preferred_certifications {
        let hits = preferred.iter().filter(|c| org.certifications.contains(*c)).count();
        if hits > 0 {
            return (hits as f64 * 3.0).min(5.0);
        }
    }

    if let Some(required) = &iap.required_certifications {
        if !required.is_empty() && required.iter().all(|c| org.certifications.contains(c)) {
            return 2.0;
        }
    }

    0.0
}

pub fn score_practical(
    org: &Organization,
    org_trl_result: TrlScoreResult,
    deadline: Option<NaiveDate>,
    as_of: NaiveDate,
    iap: Option<&IdealApplicantProfile>,
    proximity: Option<&ProximityBreakdown>,
) -> PracticalScore {
    let trl_alignment = (org_trl_result.score / 20.0 * 10.0).round();
    let scale = scale_fit(org, proximity);
    let rd = rd_track(org);
    let deadline_score = deadline_urgency(deadline, as_of);
    let cert_bonus = certification_bonus(org, iap);

    let sum = trl_alignment + scale + rd + deadline_score + cert_bonus;

    PracticalScore {
        trl_alignment,
        scale_fit: scale,
        rd_track: rd,
        deadline_urgency: deadline_score,
        certification_bonus: cert_bonus,
        score: sum.min(35.0),
    }
}

/// Convenience wrapper combining `trl::score_trl` with `score_practical`
/// for callers that only have the program's TRL requirement, not a
/// pre-computed `TrlScoreResult`.
pub fn score_practical_from_requirement(
    org: &Organization,
    program_trl_range: Option<crate::models::TrlRangeReq>,
    deadline: Option<NaiveDate>,
    as_of: NaiveDate,
    iap: Option<&IdealApplicantProfile>,
    proximity: Option<&ProximityBreakdown>,
) -> PracticalScore {
    let trl_result = trl::score_trl(org.matching_trl(), program_trl_range);
    score_practical(org, trl_result, deadline, as_of, iap, proximity)
}
