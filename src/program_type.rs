//! Program-type detector: classifies a program into a closed set of
//! application shapes by regex against title+description.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    OpenCompetition,
    Designated,
    DemandSurvey,
    InstitutionalOnly,
    Consolidated,
    Unknown,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::OpenCompetition => "OPEN_COMPETITION",
            ApplicationType::Designated => "DESIGNATED",
            ApplicationType::DemandSurvey => "DEMAND_SURVEY",
            ApplicationType::InstitutionalOnly => "INSTITUTIONAL_ONLY",
            ApplicationType::Consolidated => "CONSOLIDATED",
            ApplicationType::Unknown => "UNKNOWN",
        }
    }
}

// "지정공모" ("designated competition") shows up in plenty of ordinary
// open R&D announcements and is downgraded when R&D context is present;
// "지정과제"/"수의계약"/"단독후보" denote a harder designated-only
// relationship (sole-source contracting, single-candidate projects) and
// are never downgraded, even alongside R&D vocabulary.
static SOFT_DESIGNATED_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("지정공모").unwrap());
static HARD_DESIGNATED_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("지정과제|수의계약|단독후보").unwrap());

static DEMAND_SURVEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("수요조사|의견수렴|사전수요").unwrap());

static INSTITUTIONAL_ONLY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("출연연전용|정부출연연구기관|국책연구기관전용").unwrap());

static RD_CONTEXT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("기술개발|R&D|연구개발|과제공모|기술혁신").unwrap());

/// Classifies application shape from combined title+description text.
/// A soft `지정공모` hit that also carries R&D context is downgraded to
/// `OPEN_COMPETITION`; the harder designated patterns block regardless.
pub fn detect_application_type(title_and_description: &str) -> ApplicationType {
    if INSTITUTIONAL_ONLY_PATTERN.is_match(title_and_description) {
        return ApplicationType::InstitutionalOnly;
    }
    if DEMAND_SURVEY_PATTERN.is_match(title_and_description) {
        return ApplicationType::DemandSurvey;
    }
    if HARD_DESIGNATED_PATTERN.is_match(title_and_description) {
        return ApplicationType::Designated;
    }
    if SOFT_DESIGNATED_PATTERN.is_match(title_and_description) {
        if RD_CONTEXT_PATTERN.is_match(title_and_description) {
            return ApplicationType::OpenCompetition;
        }
        return ApplicationType::Designated;
    }
    ApplicationType::Unknown
}

/// A consolidated announcement is detected independently of the regex
/// classification, purely from the absence of deadline/start/budget
/// fields — see `FundingProgram::looks_consolidated`.
pub fn is_consolidated(program: &crate::models::FundingProgram) -> bool {
    program.looks_consolidated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designated_without_rd_context_stays_designated() {
        assert_eq!(detect_application_type("2025년 지정공모 사업 안내"), ApplicationType::Designated);
    }

    #[test]
    fn designated_with_rd_context_downgrades_to_open_competition() {
        assert_eq!(detect_application_type("지정공모형 기술개발 과제공모"), ApplicationType::OpenCompetition);
    }

    #[test]
    fn demand_survey_detected() {
        assert_eq!(detect_application_type("2025년 하반기 수요조사 실시"), ApplicationType::DemandSurvey);
    }

    #[test]
    fn institutional_only_detected() {
        assert_eq!(detect_application_type("정부출연연구기관 전용 공동연구"), ApplicationType::InstitutionalOnly);
    }

    #[test]
    fn unrelated_title_is_unknown() {
        assert_eq!(detect_application_type("AI 데이터 플랫폼 기술개발"), ApplicationType::Unknown);
    }
}
