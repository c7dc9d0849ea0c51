//! Graduated TRL compatibility scoring.

use crate::models::TrlRangeReq;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrlScoreResult {
    pub score: f64,
    pub reason_code: &'static str,
    /// Signed distance to the nearest edge of the required range; `0`
    /// when inside the range or no range/TRL is known.
    pub difference: i32,
}

/// Org TRL vs program `[min, max]` → score ∈ [0,20].
pub fn score_trl(org_trl: Option<u8>, program_range: Option<TrlRangeReq>) -> TrlScoreResult {
    let Some(org_trl) = org_trl else {
        return TrlScoreResult { score: 5.0, reason_code: "TRL_NOT_PROVIDED", difference: 0 };
    };

    let Some(range) = program_range else {
        return TrlScoreResult { score: 15.0, reason_code: "TRL_NO_REQUIREMENT", difference: 0 };
    };

    let org_trl = org_trl as i32;
    let min = range.min as i32;
    let max = range.max as i32;

    if org_trl >= min && org_trl <= max {
        return TrlScoreResult { score: 20.0, reason_code: "TRL_PERFECT_MATCH", difference: 0 };
    }

    let (d, below) = if org_trl < min {
        (min - org_trl, true)
    } else {
        (org_trl - max, false)
    };

    // Over-qualified (above range) scores higher than under-qualified at
    // the same distance.
    let score = match d {
        1 => if below { 12.0 } else { 15.0 },
        2 => if below { 6.0 } else { 10.0 },
        3 => if below { 3.0 } else { 5.0 },
        _ => 0.0,
    };

    TrlScoreResult { score, reason_code: "TRL_OUT_OF_RANGE", difference: if below { -d } else { d } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_org_trl_scores_five() {
        let r = score_trl(None, Some(TrlRangeReq { min: 3, max: 6 }));
        assert_eq!(r.score, 5.0);
        assert_eq!(r.reason_code, "TRL_NOT_PROVIDED");
    }

    #[test]
    fn no_requirement_scores_fifteen() {
        let r = score_trl(Some(5), None);
        assert_eq!(r.score, 15.0);
        assert_eq!(r.reason_code, "TRL_NO_REQUIREMENT");
    }

    #[test]
    fn in_range_scores_twenty() {
        let r = score_trl(Some(5), Some(TrlRangeReq { min: 3, max: 6 }));
        assert_eq!(r.score, 20.0);
        assert_eq!(r.reason_code, "TRL_PERFECT_MATCH");
    }

    #[test]
    fn over_qualified_beats_under_qualified_at_same_distance() {
        let range = TrlRangeReq { min: 4, max: 6 };
        let under = score_trl(Some(3), Some(range)); // d=1 below
        let over = score_trl(Some(7), Some(range)); // d=1 above
        assert!(over.score > under.score);
        assert_eq!(under.score, 12.0);
        assert_eq!(over.score, 15.0);
    }

    #[test]
    fn distance_four_or_more_scores_zero() {
        let r = score_trl(Some(1), Some(TrlRangeReq { min: 6, max: 9 }));
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn monotonicity_of_trl_score_graduated_table() {
        // For fixed range and two TRLs outside it, the one closer to the
        // range scores >= the farther one.
        let range = TrlRangeReq { min: 5, max: 5 };
        let closer = score_trl(Some(3), Some(range)); // d=2
        let farther = score_trl(Some(1), Some(range)); // d=4
        assert!(closer.score >= farther.score);
    }
}
