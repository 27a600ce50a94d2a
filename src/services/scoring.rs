//! Similarity scoring of a candidate movie against the searched movie.
//!
//! The score is a weighted sum of four components out of 100 points:
//!
//! | component  | weight | basis                                             |
//! |------------|--------|---------------------------------------------------|
//! | genres     | 40     | fuzzy token overlap                               |
//! | keywords   | 30     | fuzzy token overlap                               |
//! | rating     | 20     | linear decay, zero at a 3 point difference        |
//! | popularity | 10     | linear up to a popularity of 100                  |

use crate::{
    models::{Movie, ScoredCandidate},
    services::attributes::{genres_of, keywords_of, ReferenceProfile},
};

pub const GENRE_WEIGHT: f64 = 40.0;
pub const KEYWORD_WEIGHT: f64 = 30.0;
pub const RATING_WEIGHT: f64 = 20.0;
pub const POPULARITY_WEIGHT: f64 = 10.0;

/// Rating difference at which the rating component reaches zero
pub const RATING_TOLERANCE: f64 = 3.0;

/// Popularity at which the popularity component saturates
pub const POPULARITY_CEILING: f64 = 100.0;

/// Score of one candidate together with the figures it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub genre_matches: usize,
    pub keyword_matches: usize,
    pub rating_difference: f64,
}

/// Case-insensitive substring relation in either direction
pub fn tokens_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Counts candidate tokens matching at least one reference token
fn count_matches(candidate: &[String], reference: &[String]) -> usize {
    candidate
        .iter()
        .filter(|token| reference.iter().any(|r| tokens_match(token, r)))
        .count()
}

/// Overlap share of the longer list, scaled to `weight`
fn overlap_component(
    matches: usize,
    reference_len: usize,
    candidate_len: usize,
    weight: f64,
) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    let share = matches as f64 / reference_len.max(candidate_len) as f64;
    (share * weight).clamp(0.0, weight)
}

fn rating_component(rating_difference: f64) -> f64 {
    ((RATING_TOLERANCE - rating_difference) / RATING_TOLERANCE).max(0.0) * RATING_WEIGHT
}

fn popularity_component(popularity: f64) -> f64 {
    (popularity / POPULARITY_CEILING).clamp(0.0, 1.0) * POPULARITY_WEIGHT
}

/// Scores `candidate` against the reference profile
///
/// Never fails: missing genres or keywords contribute nothing, and a missing
/// rating or popularity counts as zero.
pub fn score_candidate(reference: &ReferenceProfile, candidate: &Movie) -> ScoreBreakdown {
    let candidate_genres = genres_of(candidate);
    let candidate_keywords = keywords_of(candidate);

    let genre_matches = count_matches(&candidate_genres, &reference.genres);
    let keyword_matches = count_matches(&candidate_keywords, &reference.keywords);
    let rating_difference = (reference.rating - candidate.rating()).abs();

    let score = overlap_component(
        genre_matches,
        reference.genres.len(),
        candidate_genres.len(),
        GENRE_WEIGHT,
    ) + overlap_component(
        keyword_matches,
        reference.keywords.len(),
        candidate_keywords.len(),
        KEYWORD_WEIGHT,
    ) + rating_component(rating_difference)
        + popularity_component(candidate.popularity_score());

    ScoreBreakdown {
        score,
        genre_matches,
        keyword_matches,
        rating_difference,
    }
}

/// Scores a candidate and attaches the breakdown to it
pub fn score_movie(reference: &ReferenceProfile, candidate: Movie) -> ScoredCandidate {
    let breakdown = score_candidate(reference, &candidate);
    ScoredCandidate {
        movie: candidate,
        recommendation_score: breakdown.score,
        genre_matches: breakdown.genre_matches,
        keyword_matches: breakdown.keyword_matches,
        rating_difference: breakdown.rating_difference,
    }
}
