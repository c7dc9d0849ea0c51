//! Core data model: organizations, funding programs, ideal applicant
//! profiles, and match scores.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier. Upstream (scraper/DB) ids are not guaranteed to be
/// UUIDs, so this stays a thin string newtype rather than `uuid::Uuid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id(pub String);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id(s)
    }
}

// ── Organization ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    Company,
    ResearchInstitute,
    University,
    Nonprofit,
    GovernmentAgency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyScale {
    Micro,
    Startup,
    Small,
    SmallMedium,
    Medium,
    Large,
}

impl CompanyScale {
    /// Fixed ordering ladder used for proximity calculations (§4.6
    /// organizationFit). Index position in this ladder, not discriminant
    /// order, is the contract.
    pub const LADDER: [CompanyScale; 6] = [
        CompanyScale::Micro,
        CompanyScale::Startup,
        CompanyScale::Small,
        CompanyScale::SmallMedium,
        CompanyScale::Medium,
        CompanyScale::Large,
    ];

    pub fn ladder_index(self) -> usize {
        Self::LADDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// `1 − |idx(x) − idx(y)| / (N−1)`, the scale-ladder proximity used by
    /// the proximity scorer when a program has no explicit preference.
    pub fn ladder_proximity(self, other: CompanyScale) -> f64 {
        let n = Self::LADDER.len() as f64;
        let d = (self.ladder_index() as f64 - other.ladder_index() as f64).abs();
        1.0 - d / (n - 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStructure {
    Corporation,
    SoleProprietorship,
    Partnership,
    Consortium,
}

/// Closed region enum. Non-exhaustive lists of Korean administrative
/// regions used by the SME program region filters in the eligibility gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionCode {
    Seoul,
    Busan,
    Daegu,
    Incheon,
    Gwangju,
    Daejeon,
    Ulsan,
    Sejong,
    Gyeonggi,
    Gangwon,
    Chungbuk,
    Chungnam,
    Jeonbuk,
    Jeonnam,
    Gyeongbuk,
    Gyeongnam,
    Jeju,
}

impl RegionCode {
    /// Seoul/Incheon/Gyeonggi are "metropolitan" in the SME-program sense
    /// used by `SME_REGION_NON_METRO_ONLY`.
    pub fn is_metropolitan(self) -> bool {
        matches!(self, RegionCode::Seoul | RegionCode::Incheon | RegionCode::Gyeonggi)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub date: NaiveDate,
    pub amount_krw: u64,
    pub source: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl EmployeeRange {
    /// Midpoint derived via the fixed table in §4.3; `None` when the
    /// organization supplied no employee data at all.
    pub fn midpoint(&self) -> Option<f64> {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => Some((lo as f64 + hi as f64) / 2.0),
            (Some(lo), None) => Some(lo as f64),
            (None, Some(hi)) => Some(hi as f64),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueRange {
    /// Upper bound expressed in 억 (100-million-won) units, matching the
    /// `financialFit` calculation's native unit in §4.6.
    pub min_eok: Option<f64>,
    pub max_eok: Option<f64>,
}

impl RevenueRange {
    pub fn midpoint_krw(&self) -> Option<f64> {
        const EOK: f64 = 100_000_000.0;
        match (self.min_eok, self.max_eok) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0 * EOK),
            (Some(lo), None) => Some(lo * EOK),
            (None, Some(hi)) => Some(hi * EOK),
            (None, None) => None,
        }
    }

    /// `true` when the range is not the explicit "no revenue" sentinel
    /// (`Some(0.0)`/`Some(0.0)`), used by `financialFit`'s matching-fund
    /// sub-score.
    pub fn can_provide_matching_funds(&self) -> bool {
        !matches!((self.min_eok, self.max_eok), (Some(0.0), Some(0.0)) | (None, None))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
    pub org_type: OrganizationType,

    pub scale: CompanyScale,
    pub employees: EmployeeRange,
    pub revenue: RevenueRange,
    pub business_structure: BusinessStructure,

    pub industry_sector: Option<String>,
    pub primary_business_domain: Option<String>,
    pub key_technologies: Vec<String>,
    pub technology_sub_domains: Vec<String>,
    pub research_focus_areas: Vec<String>,
    pub description: Option<String>,

    pub trl: Option<u8>,
    pub target_research_trl: Option<u8>,
    pub rd_experience: bool,
    pub collaboration_count: u32,
    pub has_research_institute: bool,

    pub certifications: HashSet<String>,
    pub government_certifications: HashSet<String>,
    pub industry_awards: Vec<String>,
    pub prior_grant_wins: u32,
    pub investment_history: Vec<InvestmentRecord>,
    /// Additional capability-bearing text not covered above (e.g.
    /// commercialization track record) — folded into `capabilityFit`'s
    /// combined capability text per §4.6.
    pub commercialization_capabilities: Vec<String>,

    pub locations: HashSet<RegionCode>,
    pub excluded_domains: Vec<String>,

    pub business_established_date: NaiveDate,
}

impl Organization {
    /// Validates `targetResearchTRL ∈ [1,9]` per §3.1's invariant. A
    /// violation is a `ValidationFailure` (§7), handled by the caller by
    /// treating the field as missing, never fatal.
    pub fn target_research_trl_is_valid(&self) -> bool {
        self.target_research_trl
            .map(|t| (1..=9).contains(&t))
            .unwrap_or(true)
    }

    /// The org TRL used for *matching intent*: the target research TRL
    /// overrides the current TRL when present (§3.1).
    pub fn matching_trl(&self) -> Option<u8> {
        self.target_research_trl.filter(|_| self.target_research_trl_is_valid()).or(self.trl)
    }

    /// Operating years computed from `businessEstablishedDate` using
    /// 365.25-day years, floored (§4.3).
    pub fn operating_years(&self, as_of: NaiveDate) -> i64 {
        let days = (as_of - self.business_established_date).num_days();
        (days as f64 / 365.25).floor() as i64
    }

    pub fn sum_verified_investment(&self) -> u64 {
        self.investment_history
            .iter()
            .filter(|i| i.verified)
            .map(|i| i.amount_krw)
            .sum()
    }

    /// Combined capability text used by `capabilityFit` (§4.6): key
    /// technologies ∪ certifications ∪ government certifications ∪
    /// commercialization capabilities ∪ technology sub-domains ∪ research
    /// focus areas ∪ description ∪ primary business domain.
    pub fn capability_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.key_technologies.iter().map(String::as_str));
        parts.extend(self.certifications.iter().map(String::as_str));
        parts.extend(self.government_certifications.iter().map(String::as_str));
        parts.extend(self.commercialization_capabilities.iter().map(String::as_str));
        parts.extend(self.technology_sub_domains.iter().map(String::as_str));
        parts.extend(self.research_focus_areas.iter().map(String::as_str));
        if let Some(d) = &self.description {
            parts.push(d.as_str());
        }
        if let Some(d) = &self.primary_business_domain {
            parts.push(d.as_str());
        }
        parts.join(" ").to_lowercase()
    }
}

// ── Funding Program ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramIntent {
    BasicResearch,
    AppliedResearch,
    Commercialization,
    Infrastructure,
    PolicySupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramStatus {
    Active,
    Expired,
    Withdrawn,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrlRangeReq {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    pub allowed_org_types: Vec<OrganizationType>,
    pub allowed_business_structures: Vec<BusinessStructure>,
    pub trl_range: Option<TrlRangeReq>,
    pub required_certifications: HashSet<String>,
    pub preferred_certifications: HashSet<String>,
    pub required_operating_years: Option<u32>,
    pub max_operating_years: Option<u32>,
    pub required_min_employees: Option<u32>,
    pub required_max_employees: Option<u32>,
    pub required_min_revenue_krw: Option<u64>,
    pub required_max_revenue_krw: Option<u64>,
    pub required_investment_amount_krw: Option<u64>,
    pub requires_research_institute: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingProgram {
    pub id: Id,
    pub agency_id: Id,
    pub title: String,
    pub announcement_url: Option<String>,
    pub content_hash: String,
    pub scraped_at: DateTime<Utc>,

    pub program_name: Option<String>,
    pub industry_category: Option<String>,
    pub keywords: Vec<String>,
    pub ministry: Option<String>,
    pub agency: Option<String>,
    pub program_intent: Option<ProgramIntent>,
    pub description: Option<String>,
    pub eligibility_criteria_text: Option<String>,

    pub requirements: Requirements,

    pub status: ProgramStatus,
    pub application_start: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub published_at: Option<DateTime<Utc>>,
    pub budget_amount_krw: Option<u64>,

    pub ideal_applicant_profile: Option<super::iap::IdealApplicantProfile>,
    pub semantic_sub_domain: Option<serde_json::Map<String, serde_json::Value>>,

    /// Distinguishes the R&D-program taxonomy from the SME-program
    /// taxonomy described in the glossary; drives the SME-only gate rules
    /// in §4.9.
    pub program_family: ProgramFamily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramFamily {
    Rd,
    Sme,
}

impl FundingProgram {
    pub fn has_ministry(&self) -> bool {
        self.ministry.is_some()
    }

    pub fn has_iap(&self) -> bool {
        self.ideal_applicant_profile.is_some()
    }

    pub fn title_and_name(&self) -> String {
        match &self.program_name {
            Some(n) => format!("{} {}", self.title, n),
            None => self.title.clone(),
        }
    }

    pub fn title_and_description(&self) -> String {
        match &self.description {
            Some(d) => format!("{} {}", self.title, d),
            None => self.title.clone(),
        }
    }

    /// §4: a consolidated announcement is detected when deadline,
    /// application start, and budget are all absent.
    pub fn looks_consolidated(&self) -> bool {
        self.deadline.is_none() && self.application_start.is_none() && self.budget_amount_krw.is_none()
    }
}

// ── Match Score (output) ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityLevel {
    FullyEligible,
    ConditionallyEligible,
    Ineligible,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GapSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub dimension: String,
    pub severity: GapSeverity,
    pub is_blocker: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeSignal {
    pub code: String,
    pub penalty: f64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V4CompatibleBreakdown {
    pub keyword_score: f64,
    pub industry_score: f64,
    pub trl_score: f64,
    pub type_score: f64,
    pub rd_score: f64,
    pub deadline_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScore {
    pub program_id: Id,
    pub organization_id: Id,
    pub total_score: f64,
    pub eligibility_level: EligibilityLevel,
    pub needs_manual_review: bool,
    pub reason_codes: Vec<String>,
    pub gaps: Vec<Gap>,
    pub negative_signals: Vec<NegativeSignal>,
    pub v6_details: crate::funnel::MatchBreakdown,
    pub v4_breakdown: V4CompatibleBreakdown,
}
