//! Ideal Applicant Profile generation: program → ideal-applicant
//! description via rule-based Tier 1 + optional LLM Tier 2.

pub mod llm_tier;
pub mod rules;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::llm::Completer;
use crate::models::{BusinessStructure, CompanyScale, OrganizationType};

pub const IAP_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneratedBy {
    Rule,
    Llm,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionConfidence {
    High,
    Medium,
    Low,
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramStage {
    BasicResearch,
    AppliedResearch,
    Commercialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionRequirement {
    Nationwide,
    NonMetropolitan,
    Metropolitan,
    SpecificRegions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessAge {
    pub min_years: Option<u32>,
    pub max_years: Option<u32>,
    pub preferred_stage: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrlRangeIap {
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub ideal_center: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub min_revenue_krw: Option<u64>,
    pub requires_matching_fund: Option<bool>,
    pub expects_prior_investment: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdealApplicantProfile {
    pub version: String,

    // Structured dimensions.
    pub organization_types: Option<Vec<OrganizationType>>,
    pub preferred_scales: Option<Vec<CompanyScale>>,
    pub acceptable_scales: Option<Vec<CompanyScale>>,
    pub business_age: Option<BusinessAge>,
    pub trl_range: Option<TrlRangeIap>,
    pub program_stage: Option<ProgramStage>,
    pub financial_profile: Option<FinancialProfile>,
    pub required_certifications: Option<Vec<String>>,
    pub preferred_certifications: Option<Vec<String>>,
    pub region_requirement: Option<RegionRequirement>,
    pub specific_regions: Option<Vec<String>>,
    pub collaboration_expectation: Option<String>,
    pub requires_research_institute: Option<bool>,
    pub allowed_business_structures: Option<Vec<BusinessStructure>>,

    // Semantic dimensions.
    pub primary_domain: Option<String>,
    pub sub_domains: Option<Vec<String>>,
    pub technology_keywords: Option<Vec<String>>,
    pub expected_capabilities: Option<Vec<String>>,
    pub desired_outcomes: Option<Vec<String>>,
    pub support_purpose: Option<String>,

    // Metadata.
    pub confidence: f64,
    pub generated_by: GeneratedBy,
    pub dimension_confidence: HashMap<String, DimensionConfidence>,
    pub source_text_length: usize,
}

impl Default for GeneratedBy {
    fn default() -> Self {
        GeneratedBy::Rule
    }
}

pub struct IapGenerationResult {
    pub profile: IdealApplicantProfile,
    pub llm_cost_krw: u64,
    pub used_llm: bool,
}

/// `generateIdealProfile(program, {useLLM}) → {profile, llmCostKRW,
/// usedLLM}` (§6.2).
pub async fn generate_ideal_profile(
    program: &crate::models::FundingProgram,
    use_llm: bool,
    completer: Option<&dyn Completer>,
    rates: &crate::config::LlmRates,
) -> IapGenerationResult {
    let mut profile = rules::build_rule_profile(program);

    if !use_llm {
        return IapGenerationResult { profile, llm_cost_krw: 0, used_llm: false };
    }

    let Some(completer) = completer else {
        return IapGenerationResult { profile, llm_cost_krw: 0, used_llm: false };
    };

    let source_text = llm_tier::build_source_text(program);
    if source_text.len() < 50 {
        return IapGenerationResult { profile, llm_cost_krw: 0, used_llm: false };
    }

    match llm_tier::extract_semantic(completer, &source_text).await {
        Ok((extraction, usage)) => {
            llm_tier::merge_llm_into_rule_profile(&mut profile, extraction);
            let cost = rates.cost_krw(usage.input_tokens, usage.output_tokens);
            IapGenerationResult { profile, llm_cost_krw: cost, used_llm: true }
        }
        Err(_) => {
            // ExternalDependencyFailure: recover locally, cost is 0.
            IapGenerationResult { profile, llm_cost_krw: 0, used_llm: false }
        }
    }
}

/// Overall confidence = `min(1.0, (H·1 + M·0.6) / 15)`, floors at 0.1 if
/// no dimensions set.
pub fn compute_overall_confidence(dims: &HashMap<String, DimensionConfidence>) -> f64 {
    if dims.is_empty() {
        return 0.1;
    }
    let h = dims.values().filter(|c| matches!(c, DimensionConfidence::High)).count() as f64;
    let m = dims.values().filter(|c| matches!(c, DimensionConfidence::Medium)).count() as f64;
    ((h + m * 0.6) / 15.0).min(1.0).max(0.1)
}
