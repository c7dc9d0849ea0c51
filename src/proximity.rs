//! Proximity Scorer (v5): organization vs IAP, dimension by dimension.
//! The semantic and practical scorers rescale these dimension scores
//! when a program has an IAP.

use chrono::NaiveDate;

use crate::iap::{DimensionConfidence, IdealApplicantProfile, ProgramStage};
use crate::models::{CompanyScale, Gap, GapSeverity, Organization, OrganizationType};
use crate::taxonomy;

pub const PROXIMITY_ALGORITHM_VERSION: &str = "v5";

#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionScore {
    pub score: f64,
    pub weight: f64,
}

impl DimensionScore {
    fn rounded(&self) -> f64 {
        (self.score * 10.0).round() / 10.0
    }

    fn below_30_percent(&self) -> bool {
        self.weight > 0.0 && self.score < self.weight * 0.3
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProximityBreakdown {
    pub domain_fit: DimensionScore,
    pub technology_fit: DimensionScore,
    pub organization_fit: DimensionScore,
    pub capability_fit: DimensionScore,
    pub compliance_fit: DimensionScore,
    pub financial_fit: DimensionScore,
    pub deadline_urgency: DimensionScore,
    pub total: f64,
    pub gaps: Vec<Gap>,
    pub algorithm_version: &'static str,
}

fn domain_fit(org: &Organization, iap: &IdealApplicantProfile) -> f64 {
    let relevance_pts = match (&org.industry_sector, &iap.primary_domain) {
        (Some(org_sector), Some(domain)) => taxonomy::calculate_industry_relevance(org_sector, domain) * 15.0,
        _ => 15.0 * 0.5,
    };

    let sub_domain_pts = match &iap.sub_domains {
        Some(subs) if !subs.is_empty() => {
            let org_text = org.capability_text();
            let hits = subs.iter().filter(|s| org_text.contains(&s.to_lowercase())).count();
            (hits as f64 / subs.len() as f64) * 10.0
        }
        _ => 10.0 * 0.5,
    };

    let keyword_pts = match &iap.technology_keywords {
        Some(keywords) if !keywords.is_empty() => {
            let org_text = org.capability_text();
            let hits = keywords.iter().filter(|k| org_text.contains(&k.to_lowercase())).count();
            (hits as f64 / keywords.len() as f64) * 5.0
        }
        _ => 5.0 * 0.5,
    };

    relevance_pts + sub_domain_pts + keyword_pts
}

fn technology_fit(org: &Organization, iap: &IdealApplicantProfile) -> f64 {
    let ideal_center = iap.trl_range.and_then(|r| r.ideal_center);
    let matching_trl = org.matching_trl();

    let mut score = match (matching_trl, ideal_center) {
        (Some(trl), Some(center)) => {
            let d = (trl as i16 - center as i16).unsigned_abs();
            match d {
                0 => 12.0,
                1 => 10.0,
                2 => 7.0,
                3 => 4.0,
                _ => 1.0,
            }
        }
        _ => 6.0,
    };

    if let (Some(target_trl), Some(center)) = (org.target_research_trl, ideal_center) {
        if (target_trl as i16 - center as i16).unsigned_abs() <= 1 {
            score += 2.0;
        }
    }

    let is_research_stage =
        matches!(iap.program_stage, Some(ProgramStage::BasicResearch) | Some(ProgramStage::AppliedResearch));
    if org.rd_experience && is_research_stage {
        score += 4.0;
    }

    if let Some(keywords) = &iap.technology_keywords {
        if !keywords.is_empty() {
            let org_text = org.capability_text();
            let hits = keywords.iter().filter(|k| org_text.contains(&k.to_lowercase())).count();
            score += ((hits as f64 / keywords.len() as f64) * 4.0).min(4.0);
        }
    }

    score.min(20.0)
}

fn organization_fit(org: &Organization, iap: &IdealApplicantProfile, as_of: NaiveDate) -> f64 {
    let scale_pts = if let Some(preferred) = &iap.preferred_scales {
        if preferred.contains(&org.scale) {
            6.0
        } else if iap.acceptable_scales.as_ref().is_some_and(|a| a.contains(&org.scale)) {
            4.0
        } else {
            scale_ladder_proximity_points(org.scale, preferred)
        }
    } else if let Some(acceptable) = &iap.acceptable_scales {
        if acceptable.contains(&org.scale) {
            4.0
        } else {
            scale_ladder_proximity_points(org.scale, acceptable)
        }
    } else {
        3.0
    };

    let age_pts = match &iap.business_age {
        Some(age) => {
            let years = org.operating_years(as_of);
            match (age.min_years, age.max_years) {
                (Some(min), Some(max)) => {
                    if years >= min as i64 && years <= max as i64 {
                        5.0
                    } else {
                        let overshoot = if years > max as i64 { years - max as i64 } else { min as i64 - years };
                        (5.0 - overshoot as f64).max(0.0)
                    }
                }
                (Some(min), None) => {
                    if years >= min as i64 {
                        5.0
                    } else {
                        (5.0 - (min as i64 - years) as f64).max(0.0)
                    }
                }
                (None, Some(max)) => {
                    if years <= max as i64 {
                        5.0
                    } else {
                        (5.0 - (years - max as i64) as f64).max(0.0)
                    }
                }
                (None, None) => 5.0,
            }
        }
        None => 3.0,
    };

    let type_pts = match &iap.organization_types {
        Some(types) if !types.is_empty() => {
            if types.contains(&org.org_type) {
                4.0
            } else {
                0.0
            }
        }
        _ => 2.0,
    };

    scale_pts + age_pts + type_pts
}

fn scale_ladder_proximity_points(org_scale: CompanyScale, candidates: &[CompanyScale]) -> f64 {
    candidates
        .iter()
        .map(|c| org_scale.ladder_proximity(*c) * 3.0)
        .fold(0.0_f64, f64::max)
}

fn capability_fit(org: &Organization, iap: &IdealApplicantProfile) -> f64 {
    match &iap.expected_capabilities {
        Some(caps) if !caps.is_empty() => {
            let org_text = org.capability_text();
            let hits = caps
                .iter()
                .filter(|cap| {
                    let cap_lower = cap.to_lowercase();
                    org_text.contains(&cap_lower) || cap_lower.contains(&org_text)
                })
                .count();
            (hits as f64 / caps.len() as f64) * 15.0
        }
        _ => 15.0 * 0.5,
    }
}

fn compliance_fit(org: &Organization, iap: &IdealApplicantProfile, gaps: &mut Vec<Gap>) -> f64 {
    let mut score = 10.0;

    if let Some(required) = &iap.required_certifications {
        let mut missing = 0;
        for cert in required {
            if !org.certifications.contains(cert) && !org.government_certifications.contains(cert) {
                missing += 1;
                gaps.push(Gap {
                    dimension: "complianceFit".to_string(),
                    severity: GapSeverity::High,
                    is_blocker: true,
                    description: format!("missing required certification: {cert}"),
                });
            }
        }
        if missing > 0 {
            score -= 5.0_f64.min(missing as f64 * 5.0);
        }
    }

    if iap.requires_research_institute.unwrap_or(false) && !org.has_research_institute {
        score -= 3.0;
    }

    if let Some(types) = &iap.organization_types {
        if !types.is_empty() && !types.contains(&org.org_type) {
            score -= 2.0;
        }
    }

    score.max(0.0)
}

fn financial_fit(org: &Organization, iap: &IdealApplicantProfile) -> f64 {
    let mut score = 0.0;

    if let Some(fp) = &iap.financial_profile {
        if let Some(min_rev) = fp.min_revenue_krw {
            if let Some(upper_krw) = org.revenue.max_eok.map(|eok| eok * 100_000_000.0) {
                if upper_krw >= min_rev as f64 {
                    score += 3.0;
                }
            }
        } else {
            score += 3.0 * 0.5;
        }
    } else {
        score += 3.0 * 0.5;
    }

    if org.revenue.can_provide_matching_funds() {
        score += 2.0;
    }

    score
}

fn deadline_urgency(deadline: Option<NaiveDate>, as_of: NaiveDate) -> f64 {
    match deadline {
        None => 2.0,
        Some(d) => {
            let days = (d - as_of).num_days();
            if days < 0 {
                0.0
            } else if days <= 7 {
                5.0
            } else if days <= 14 {
                4.0
            } else if days <= 30 {
                3.0
            } else if days <= 60 {
                2.0
            } else {
                1.0
            }
        }
    }
}

/// `OrganizationType` carries no default `allowed` membership; §4.6's
/// "requirements absent → partial credit" rule is handled inline above.
pub fn score_proximity(
    org: &Organization,
    iap: &IdealApplicantProfile,
    deadline: Option<NaiveDate>,
    as_of: NaiveDate,
) -> ProximityBreakdown {
    let mut gaps = Vec::new();

    let domain = domain_fit(org, iap);
    let technology = technology_fit(org, iap);
    let organization = organization_fit(org, iap, as_of);
    let capability = capability_fit(org, iap);
    let compliance = compliance_fit(org, iap, &mut gaps);
    let financial = financial_fit(org, iap);
    let deadline_score = deadline_urgency(deadline, as_of);

    let domain_fit_dim = DimensionScore { score: domain, weight: 30.0 };
    let technology_fit_dim = DimensionScore { score: technology, weight: 20.0 };
    let organization_fit_dim = DimensionScore { score: organization, weight: 15.0 };
    let capability_fit_dim = DimensionScore { score: capability, weight: 15.0 };
    let compliance_fit_dim = DimensionScore { score: compliance, weight: 10.0 };
    let financial_fit_dim = DimensionScore { score: financial, weight: 5.0 };
    let deadline_urgency_dim = DimensionScore { score: deadline_score, weight: 5.0 };

    for (name, dim) in [
        ("domainFit", &domain_fit_dim),
        ("technologyFit", &technology_fit_dim),
        ("organizationFit", &organization_fit_dim),
        ("capabilityFit", &capability_fit_dim),
        ("financialFit", &financial_fit_dim),
    ] {
        if dim.below_30_percent() {
            gaps.push(Gap {
                dimension: name.to_string(),
                severity: GapSeverity::Medium,
                is_blocker: false,
                description: format!("{name} scored below 30% of its weight"),
            });
        }
    }

    let total = domain_fit_dim.rounded()
        + technology_fit_dim.rounded()
        + organization_fit_dim.rounded()
        + capability_fit_dim.rounded()
        + compliance_fit_dim.rounded()
        + financial_fit_dim.rounded()
        + deadline_urgency_dim.rounded();

    ProximityBreakdown {
        domain_fit: domain_fit_dim,
        technology_fit: technology_fit_dim,
        organization_fit: organization_fit_dim,
        capability_fit: capability_fit_dim,
        compliance_fit: compliance_fit_dim,
        financial_fit: financial_fit_dim,
        deadline_urgency: deadline_urgency_dim,
        total,
        gaps,
        algorithm_version: PROXIMITY_ALGORITHM_VERSION,
    }
}

/// Confidence-weighted flag some callers use to discount a dimension
/// whose supporting IAP data came from a low-confidence inference
/// rather than from the program's structured requirements.
pub fn dimension_is_low_confidence(iap: &IdealApplicantProfile, dimension: &str) -> bool {
    matches!(
        iap.dimension_confidence.get(dimension),
        Some(DimensionConfidence::Low) | Some(DimensionConfidence::Inferred)
    )
}
