use std::cmp::Ordering;

use crate::engine::selection::Candidate;
use crate::models::food_bank::FoodBank;

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub bank: FoodBank,
    pub duration_minutes: Option<f64>,
    pub score: f64,
}

/// Rank candidates by `need_weight / (duration_minutes + 1)`, sorted
/// descending. With an unknown duration (routing-fallback mode) the score
/// is the need alone; straight-line distance already did its job in the
/// prefilter and says nothing about reachability. The sort is stable so
/// ties keep input order and identical inputs rank identically.
pub fn score_candidates(candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let need = candidate.bank.need_weight;
            let score = match candidate.duration_minutes {
                Some(minutes) => need / (minutes + 1.0),
                None => need,
            };

            ScoredCandidate {
                score: round_millionth(score),
                duration_minutes: candidate.duration_minutes,
                bank: candidate.bank,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

fn round_millionth(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
