//! Tier 2: semantic LLM extraction, optional.

use serde::Deserialize;

use crate::error::{MatchError, MatchResult};
use crate::llm::{Completer, CompletionRequest, TokenUsage};
use crate::models::FundingProgram;

use super::{DimensionConfidence, IdealApplicantProfile, ProgramStage};

const MAX_DESCRIPTION_CHARS: usize = 3000;
const MAX_ELIGIBILITY_CHARS: usize = 500;
const LLM_TEMPERATURE: f32 = 0.1;
const LLM_MAX_TOKENS: u32 = 512;

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Concatenates title + truncated description (≤3000 chars) + keywords +
/// truncated eligibility criteria (≤500 chars).
pub fn build_source_text(program: &FundingProgram) -> String {
    let description = program.description.as_deref().unwrap_or("");
    let eligibility = program.eligibility_criteria_text.as_deref().unwrap_or("");

    format!(
        "{} {} {} {}",
        program.title,
        truncate(description, MAX_DESCRIPTION_CHARS),
        program.keywords.join(" "),
        truncate(eligibility, MAX_ELIGIBILITY_CHARS),
    )
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SemanticExtraction {
    pub program_stage: Option<String>,
    #[serde(default)]
    pub sub_domains: Vec<String>,
    #[serde(default)]
    pub expected_capabilities: Vec<String>,
    #[serde(default)]
    pub desired_outcomes: Vec<String>,
    pub collaboration_expectation: Option<String>,
    pub ideal_trl_center: Option<u8>,
    pub financial_requires_matching_fund: Option<bool>,
}

fn parse_program_stage(s: &str) -> Option<ProgramStage> {
    match s {
        "BASIC_RESEARCH" => Some(ProgramStage::BasicResearch),
        "APPLIED_RESEARCH" => Some(ProgramStage::AppliedResearch),
        "COMMERCIALIZATION" => Some(ProgramStage::Commercialization),
        _ => None,
    }
}

const SYSTEM_PROMPT: &str = "You extract a structured ideal-applicant profile from a Korean government \
funding announcement. Respond with JSON only, matching the given schema. No prose.";

/// Sends a single-shot JSON-only LLM request with a small token budget
/// and low temperature; returns the parsed extraction plus token usage.
pub async fn extract_semantic(
    completer: &dyn Completer,
    source_text: &str,
) -> MatchResult<(SemanticExtraction, TokenUsage)> {
    let request = CompletionRequest {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_message: format!(
            "Extract {{programStage, subDomains[<=5], expectedCapabilities[<=5], \
             desiredOutcomes[<=5], collaborationExpectation, idealTrlCenter, \
             financialRequiresMatchingFund}} from:\n\n{source_text}"
        ),
        model: "default".to_string(),
        max_tokens: LLM_MAX_TOKENS,
        temperature: LLM_TEMPERATURE,
    };

    let response = completer.complete(request).await?;

    let mut extraction: SemanticExtraction =
        serde_json::from_str(&response.text).map_err(|e| MatchError::ExternalDependencyFailure {
            dependency: "llm json parse".to_string(),
            detail: e.to_string(),
        })?;

    extraction.sub_domains.truncate(5);
    extraction.expected_capabilities.truncate(5);
    extraction.desired_outcomes.truncate(5);

    Ok((extraction, response.usage))
}

/// Merge policy (rule wins over LLM except where noted, §4.5):
///
///  - `programStage`: LLM overrides only if rule produced INFERRED (or
///    nothing) — LLM-set confidence becomes MEDIUM.
///  - `subDomains`, `expectedCapabilities`, `desiredOutcomes`: always
///    from LLM.
///  - `collaborationExpectation`: LLM fills if rule empty.
///  - `trlRange.idealCenter`: LLM refines if present.
///  - `financialProfile.requiresMatchingFund`: LLM fills if present.
///  - Every other field: rule value is kept.
pub fn merge_llm_into_rule_profile(profile: &mut IdealApplicantProfile, extraction: SemanticExtraction) {
    let stage_was_inferred = matches!(
        profile.dimension_confidence.get("programStage"),
        Some(DimensionConfidence::Inferred) | None
    );
    if stage_was_inferred {
        if let Some(stage_str) = &extraction.program_stage {
            if let Some(stage) = parse_program_stage(stage_str) {
                profile.program_stage = Some(stage);
                profile.dimension_confidence.insert("programStage".to_string(), DimensionConfidence::Medium);
            }
        }
    }

    if !extraction.sub_domains.is_empty() {
        profile.sub_domains = Some(extraction.sub_domains);
        profile.dimension_confidence.insert("subDomains".to_string(), DimensionConfidence::Medium);
    }
    if !extraction.expected_capabilities.is_empty() {
        profile.expected_capabilities = Some(extraction.expected_capabilities);
        profile.dimension_confidence.insert("expectedCapabilities".to_string(), DimensionConfidence::Medium);
    }
    if !extraction.desired_outcomes.is_empty() {
        profile.desired_outcomes = Some(extraction.desired_outcomes);
        profile.dimension_confidence.insert("desiredOutcomes".to_string(), DimensionConfidence::Medium);
    }

    if profile.collaboration_expectation.is_none() {
        if let Some(collab) = extraction.collaboration_expectation {
            profile.collaboration_expectation = Some(collab);
            profile.dimension_confidence.insert("collaborationExpectation".to_string(), DimensionConfidence::Medium);
        }
    }

    if let Some(center) = extraction.ideal_trl_center {
        if let Some(range) = profile.trl_range.as_mut() {
            range.ideal_center = Some(center);
        } else {
            profile.trl_range = Some(super::TrlRangeIap { min: None, max: None, ideal_center: Some(center) });
        }
    }

    if let Some(requires_matching) = extraction.financial_requires_matching_fund {
        match profile.financial_profile.as_mut() {
            Some(fp) => fp.requires_matching_fund = Some(requires_matching),
            None => {
                profile.financial_profile = Some(super::FinancialProfile {
                    min_revenue_krw: None,
                    requires_matching_fund: Some(requires_matching),
                    expects_prior_investment: None,
                })
            }
        }
    }

    profile.generated_by = super::GeneratedBy::Hybrid;
    profile.confidence = super::compute_overall_confidence(&profile.dimension_confidence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StaticCompleter;

    #[test]
    fn truncate_respects_char_boundaries_on_multibyte_text() {
        let text = "한".repeat(10);
        let truncated = truncate(&text, 3);
        assert_eq!(truncated.chars().count(), 3);
    }

    #[tokio::test]
    async fn extract_semantic_parses_json_response() {
        let completer = StaticCompleter {
            response_text: serde_json::json!({
                "programStage": "APPLIED_RESEARCH",
                "subDomains": ["로봇", "자동화"],
                "expectedCapabilities": ["제어시스템"],
                "desiredOutcomes": ["상용화"],
                "collaborationExpectation": "산학협력",
                "idealTrlCenter": 5,
                "financialRequiresMatchingFund": true
            })
            .to_string(),
        };

        let (extraction, usage) = extract_semantic(&completer, "some source text that is long enough").await.unwrap();
        assert_eq!(extraction.program_stage.as_deref(), Some("APPLIED_RESEARCH"));
        assert_eq!(extraction.sub_domains.len(), 2);
        assert_eq!(usage.input_tokens, 100);
    }

    #[tokio::test]
    async fn extract_semantic_propagates_malformed_json_as_error() {
        let completer = StaticCompleter { response_text: "not json".to_string() };
        let result = extract_semantic(&completer, "source text").await;
        assert!(result.is_err());
    }
}
