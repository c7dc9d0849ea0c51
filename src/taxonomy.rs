//! Closed, compile-time industry taxonomy.
//!
//! The sector hierarchy, cross-relevance matrix, and normalization
//! function are process-wide immutable data, matching §9's "global
//! immutable tables" design note: initialized once via `once_cell`,
//! never mutated.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The closed set of canonical industry sectors.
pub const SECTORS: &[&str] = &[
    "ICT",
    "BIO_HEALTH",
    "MANUFACTURING",
    "ENERGY",
    "ENVIRONMENT",
    "MATERIALS",
    "AGRICULTURE",
    "MARINE",
    "DEFENSE",
    "CONSTRUCTION",
    "FINANCE",
    "CULTURE_CONTENT",
    "GENERAL",
];

/// sector → (sub-sector → keyword list). Closed at compile time.
static SECTOR_HIERARCHY: Lazy<HashMap<&'static str, HashMap<&'static str, Vec<&'static str>>>> =
    Lazy::new(|| {
        let mut m: HashMap<&'static str, HashMap<&'static str, Vec<&'static str>>> = HashMap::new();

        m.insert("ICT", HashMap::from([
            ("AI", vec!["인공지능", "AI", "머신러닝", "딥러닝", "데이터분석"]),
            ("SOFTWARE", vec!["소프트웨어", "SW", "플랫폼", "앱", "클라우드"]),
            ("NETWORK", vec!["네트워크", "통신", "5G", "6G", "사물인터넷", "IoT"]),
        ]));
        m.insert("BIO_HEALTH", HashMap::from([
            ("PHARMA", vec!["신약", "의약품", "제약", "치료제"]),
            ("MEDICAL_DEVICE", vec!["의료기기", "헬스케어", "진단"]),
            ("CLINICAL", vec!["임상", "바이오", "유전자", "세포치료", "백신"]),
        ]));
        m.insert("MANUFACTURING", HashMap::from([
            ("SMART_FACTORY", vec!["스마트공장", "자동화", "로봇"]),
            ("PROCESS", vec!["제조공정", "공정개선", "양산"]),
            ("PARTS", vec!["소재", "부품", "소부장"]),
        ]));
        m.insert("ENERGY", HashMap::from([
            ("RENEWABLE", vec!["신재생에너지", "태양광", "풍력", "수소"]),
            ("GRID", vec!["전력망", "스마트그리드", "에너지저장"]),
        ]));
        m.insert("ENVIRONMENT", HashMap::from([
            ("CLIMATE", vec!["탄소중립", "기후변화", "온실가스"]),
            ("RECYCLING", vec!["자원순환", "폐기물", "재활용"]),
        ]));
        m.insert("MATERIALS", HashMap::from([
            ("ADVANCED", vec!["신소재", "나노", "첨단소재"]),
        ]));
        m.insert("AGRICULTURE", HashMap::from([
            ("SMART_FARM", vec!["스마트팜", "농업", "축산", "수산"]),
        ]));
        m.insert("MARINE", HashMap::from([
            ("OCEAN", vec!["해양", "조선", "항만"]),
        ]));
        m.insert("DEFENSE", HashMap::from([
            ("DEFENSE_TECH", vec!["국방", "방위산업", "군수"]),
            ("CYBER", vec!["사이버보안", "사이버", "보안"]),
        ]));
        m.insert("CONSTRUCTION", HashMap::from([
            ("BUILDING", vec!["건설", "건축", "토목", "스마트시티"]),
        ]));
        m.insert("FINANCE", HashMap::from([
            ("FINTECH", vec!["핀테크", "금융", "블록체인"]),
        ]));
        m.insert("CULTURE_CONTENT", HashMap::from([
            ("CONTENT", vec!["콘텐츠", "게임", "미디어", "문화"]),
        ]));
        m.insert("GENERAL", HashMap::new());

        m
    });

/// Cross-industry relevance matrix `R[a][b] ∈ [0,1]`. Only the canonical
/// direction is stored; lookups fall back symmetrically.
static RELEVANCE_MATRIX: Lazy<HashMap<(&'static str, &'static str), f64>> = Lazy::new(|| {
    HashMap::from([
        (("ENERGY", "ENVIRONMENT"), 0.6),
        (("ICT", "FINANCE"), 0.5),
        (("ICT", "MANUFACTURING"), 0.4),
        (("ICT", "BIO_HEALTH"), 0.2),
        (("BIO_HEALTH", "AGRICULTURE"), 0.4),
        (("MANUFACTURING", "MATERIALS"), 0.6),
        (("MANUFACTURING", "ENERGY"), 0.4),
        (("AGRICULTURE", "ENVIRONMENT"), 0.5),
        (("MARINE", "ENVIRONMENT"), 0.4),
        (("DEFENSE", "ICT"), 0.4),
        (("CONSTRUCTION", "ENERGY"), 0.4),
        (("FINANCE", "CULTURE_CONTENT"), 0.3),
    ])
});

const DEFAULT_RELEVANCE: f64 = 0.3;

/// `normalize(kw) = uppercase(remove_whitespace(kw))`.
pub fn normalize(kw: &str) -> String {
    kw.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
}

/// Attempts, in order: (a) direct sector-key match, (b) sector-keyword
/// containment, (c) sub-sector-keyword containment. Containment is
/// "either side is a substring of the other" on normalized forms.
pub fn find_industry_sector(free_text: &str) -> Option<&'static str> {
    let norm_text = normalize(free_text);

    for sector in SECTORS {
        if normalize(sector) == norm_text {
            return Some(sector);
        }
    }

    for sector in SECTORS {
        let norm_sector = normalize(sector);
        if norm_text.contains(&norm_sector) || norm_sector.contains(&norm_text) {
            return Some(sector);
        }
    }

    for (sector, sub_sectors) in SECTOR_HIERARCHY.iter() {
        for keywords in sub_sectors.values() {
            for kw in keywords {
                let norm_kw = normalize(kw);
                if norm_kw.is_empty() {
                    continue;
                }
                if norm_text.contains(&norm_kw) || norm_kw.contains(&norm_text) {
                    return Some(sector);
                }
            }
        }
    }

    None
}

/// Returns `R[a][b]` if present, else symmetric lookup `R[b][a]`, else
/// the default 0.3.
pub fn calculate_industry_relevance(a: &str, b: &str) -> f64 {
    if a.eq_ignore_ascii_case(b) {
        return 1.0;
    }
    if let Some(v) = RELEVANCE_MATRIX.get(&(a, b)) {
        return *v;
    }
    if let Some(v) = RELEVANCE_MATRIX.get(&(b, a)) {
        return *v;
    }
    DEFAULT_RELEVANCE
}

/// `R[a][b]` (either direction) only if an explicit matrix cell exists.
/// Unlike `calculate_industry_relevance`, this never falls back to the
/// default, so callers can tell an explicit 0.3 cell apart from an
/// unmatched pair.
pub fn explicit_relevance(a: &str, b: &str) -> Option<f64> {
    RELEVANCE_MATRIX.get(&(a, b)).or_else(|| RELEVANCE_MATRIX.get(&(b, a))).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_whitespace_and_uppercases() {
        assert_eq!(normalize(" ai 플랫폼 "), "AI플랫폼");
    }

    #[test]
    fn exact_match_relevance_is_one() {
        assert_eq!(calculate_industry_relevance("ICT", "ict"), 1.0);
    }

    #[test]
    fn energy_environment_relevance_is_point_six() {
        assert_eq!(calculate_industry_relevance("ENERGY", "ENVIRONMENT"), 0.6);
        assert_eq!(calculate_industry_relevance("ENVIRONMENT", "ENERGY"), 0.6);
    }

    #[test]
    fn unknown_pair_falls_back_to_default() {
        assert_eq!(calculate_industry_relevance("DEFENSE", "CULTURE_CONTENT"), DEFAULT_RELEVANCE);
    }

    #[test]
    fn find_sector_by_direct_key() {
        assert_eq!(find_industry_sector("ICT"), Some("ICT"));
    }

    #[test]
    fn find_sector_by_subsector_keyword() {
        assert_eq!(find_industry_sector("인공지능 기술개발"), Some("ICT"));
    }

    #[test]
    fn find_sector_returns_none_for_garbage() {
        assert_eq!(find_industry_sector("zzz_no_such_thing_zzz"), None);
    }
}
