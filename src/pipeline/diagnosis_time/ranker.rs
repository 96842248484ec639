//! Distance Fallback Ranker.

use super::types::TemporalCandidate;

/// Candidate with the smallest `char_distance`; the first one wins ties.
pub fn rank(candidates: &[TemporalCandidate]) -> Option<TemporalCandidate> {
    let mut best: Option<&TemporalCandidate> = None;
    for candidate in candidates {
        if best.map_or(true, |b| candidate.char_distance < b.char_distance) {
            best = Some(candidate);
        }
    }
    best.cloned()
}
