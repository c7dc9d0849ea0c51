//! (title, ministry, agency) -> industry + flags.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::taxonomy;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub industry: String,
    pub confidence: f64,
    pub ministry_based: bool,
    /// Whether any entry in `KEYWORD_INDUSTRY` matched the title/name
    /// scan, independent of which sector ended up winning.
    pub keyword_matched: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedClassificationResult {
    pub base: ClassificationResult,
    pub requires_regional_filter: bool,
    pub matched_regional_keywords: Vec<String>,
}

/// Ministry name → sectors it is a strong prior for (a ministry may point
/// to multiple sectors).
static MINISTRY_SECTORS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("과학기술정보통신부", vec!["ICT"]),
        ("산업통상자원부", vec!["MANUFACTURING", "ENERGY", "MATERIALS"]),
        ("보건복지부", vec!["BIO_HEALTH"]),
        ("환경부", vec!["ENVIRONMENT"]),
        ("농림축산식품부", vec!["AGRICULTURE"]),
        ("해양수산부", vec!["MARINE"]),
        ("국방부", vec!["DEFENSE"]),
        ("국토교통부", vec!["CONSTRUCTION"]),
        ("금융위원회", vec!["FINANCE"]),
        ("문화체육관광부", vec!["CULTURE_CONTENT"]),
        ("중소벤처기업부", vec!["GENERAL", "MANUFACTURING", "ICT"]),
    ])
});

/// keyword → industry table used for the title/program-name scan.
static KEYWORD_INDUSTRY: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("AI", "ICT"), ("인공지능", "ICT"), ("데이터", "ICT"), ("플랫폼", "ICT"),
        ("클라우드", "ICT"), ("소프트웨어", "ICT"), ("네트워크", "ICT"), ("IoT", "ICT"),
        ("신약", "BIO_HEALTH"), ("의료기기", "BIO_HEALTH"), ("임상", "BIO_HEALTH"),
        ("바이오", "BIO_HEALTH"), ("헬스케어", "BIO_HEALTH"), ("치매", "BIO_HEALTH"),
        ("제조", "MANUFACTURING"), ("공정", "MANUFACTURING"), ("스마트공장", "MANUFACTURING"),
        ("소재", "MATERIALS"), ("부품", "MANUFACTURING"), ("소부장", "MANUFACTURING"),
        ("신재생", "ENERGY"), ("태양광", "ENERGY"), ("수소", "ENERGY"), ("에너지", "ENERGY"),
        ("탄소중립", "ENVIRONMENT"), ("환경", "ENVIRONMENT"), ("자원순환", "ENVIRONMENT"),
        ("스마트팜", "AGRICULTURE"), ("농업", "AGRICULTURE"), ("축산", "AGRICULTURE"),
        ("해양", "MARINE"), ("조선", "MARINE"), ("수산", "MARINE"),
        ("국방", "DEFENSE"), ("방위산업", "DEFENSE"), ("사이버보안", "DEFENSE"),
        ("건설", "CONSTRUCTION"), ("스마트시티", "CONSTRUCTION"),
        ("핀테크", "FINANCE"), ("금융", "FINANCE"), ("블록체인", "FINANCE"),
        ("콘텐츠", "CULTURE_CONTENT"), ("게임", "CULTURE_CONTENT"),
    ]
});

/// Regional keyword set used by the "extended" variant's
/// `requiresRegionalFilter` scan.
static REGIONAL_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "지역", "비수도권", "수도권", "강원", "충북", "충남", "전북", "전남",
        "경북", "경남", "제주", "부산", "대구", "광주", "대전", "울산", "세종",
    ]
});

const MINISTRY_BONUS: f64 = 10.0;
const KEYWORD_BONUS: f64 = 5.0;
const CONFIDENCE_DIVISOR: f64 = 25.0;

fn score_industries(
    title: &str,
    program_name: Option<&str>,
    ministry: Option<&str>,
) -> (HashMap<&'static str, f64>, bool, bool) {
    let mut scores: HashMap<&'static str, f64> = HashMap::new();
    let mut ministry_based = false;
    let mut keyword_matched = false;

    if let Some(ministry) = ministry {
        if let Some(sectors) = MINISTRY_SECTORS.get(ministry) {
            ministry_based = true;
            for sector in sectors {
                *scores.entry(sector).or_insert(0.0) += MINISTRY_BONUS;
            }
        }
    }

    let haystack = match program_name {
        Some(name) => format!("{title} {name}"),
        None => title.to_string(),
    };

    for (keyword, industry) in KEYWORD_INDUSTRY.iter() {
        if haystack.contains(keyword) {
            keyword_matched = true;
            *scores.entry(industry).or_insert(0.0) += KEYWORD_BONUS;
        }
    }

    (scores, ministry_based, keyword_matched)
}

/// Picks the industry with the highest score; ties break by first
/// declared in the keyword table (i.e. `SECTORS` order, since that's the
/// table's declared order). Falls back to `{GENERAL, 0.5, ministryBased:
/// false}` when no scores fired at all.
pub fn classify_program(title: &str, program_name: Option<&str>, ministry: Option<&str>) -> ClassificationResult {
    let (scores, ministry_based, keyword_matched) = score_industries(title, program_name, ministry);

    if scores.is_empty() {
        return ClassificationResult {
            industry: "GENERAL".to_string(),
            confidence: 0.5,
            ministry_based: false,
            keyword_matched: false,
        };
    }

    let mut best_sector = taxonomy::SECTORS[0];
    let mut best_score = -1.0;
    for sector in taxonomy::SECTORS {
        if let Some(score) = scores.get(sector) {
            if *score > best_score {
                best_score = *score;
                best_sector = sector;
            }
        }
    }

    let confidence = (best_score / CONFIDENCE_DIVISOR).min(1.0);
    ClassificationResult { industry: best_sector.to_string(), confidence, ministry_based, keyword_matched }
}

/// Extended variant: additionally returns `requiresRegionalFilter` and
/// the matching regional keywords, from a separate scan over
/// title+description.
pub fn classify_program_extended(
    title: &str,
    program_name: Option<&str>,
    ministry: Option<&str>,
    description: Option<&str>,
) -> ExtendedClassificationResult {
    let base = classify_program(title, program_name, ministry);

    let haystack = match description {
        Some(desc) => format!("{title} {desc}"),
        None => title.to_string(),
    };

    let matched: Vec<String> = REGIONAL_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    ExtendedClassificationResult {
        base,
        requires_regional_filter: !matched.is_empty(),
        matched_regional_keywords: matched,
    }
}

/// Normalizes aliases (`BIO`, `BIOHEALTH`, `HEALTH` → `BIO_HEALTH`, etc.)
/// to one of the closed set of industry codes.
pub fn normalize_sector_alias(sector: &str) -> String {
    let upper = taxonomy::normalize(sector);
    match upper.as_str() {
        "BIO" | "BIOHEALTH" | "HEALTH" | "BIO_HEALTH" | "HEALTHCARE" => "BIO_HEALTH".to_string(),
        "IT" | "ICT" | "SOFTWARE" | "TECH" => "ICT".to_string(),
        "MFG" | "MANUFACTURING" => "MANUFACTURING".to_string(),
        "ENERGY" | "POWER" => "ENERGY".to_string(),
        "ENV" | "ENVIRONMENT" | "ENVIRONMENTAL" => "ENVIRONMENT".to_string(),
        "MATERIAL" | "MATERIALS" => "MATERIALS".to_string(),
        "AGRI" | "AGRICULTURE" | "FARMING" => "AGRICULTURE".to_string(),
        "MARINE" | "OCEAN" | "FISHERIES" => "MARINE".to_string(),
        "DEFENSE" | "DEFENCE" | "MILITARY" => "DEFENSE".to_string(),
        "CONSTRUCTION" | "BUILDING" => "CONSTRUCTION".to_string(),
        "FINANCE" | "FINTECH" | "FINANCIAL" => "FINANCE".to_string(),
        "CULTURE" | "CONTENT" | "CULTURE_CONTENT" => "CULTURE_CONTENT".to_string(),
        _ => "GENERAL".to_string(),
    }
}

/// `getIndustryRelevance(orgSector, programIndustry)`: normalizes the
/// org's sector first, then returns 1.0 on exact match; the explicit
/// cross-relevance value if present (either direction); otherwise 0.2
/// (note: distinct from the taxonomy's own 0.3 default — this is the
/// classifier-level fallback specified in §4.2).
pub fn get_industry_relevance(org_sector: &str, program_industry: &str) -> f64 {
    let normalized_org = normalize_sector_alias(org_sector);
    if normalized_org.eq_ignore_ascii_case(program_industry) {
        return 1.0;
    }

    taxonomy::explicit_relevance(&normalized_org, program_industry).unwrap_or(0.2)
}
