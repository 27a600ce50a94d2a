use std::collections::HashSet;

use crate::{
    models::{Movie, PipelineCounts, ScoredCandidate},
    services::{attributes::ReferenceProfile, scoring::score_movie},
};

/// Candidates must score strictly above this to be recommended
pub const DEFAULT_RELEVANCE_FLOOR: f64 = 10.0;

/// Maximum number of recommendations returned per search
pub const DEFAULT_MAX_RESULTS: usize = 15;

/// Tunables for the ranking pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    pub relevance_floor: f64,
    pub max_results: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            relevance_floor: DEFAULT_RELEVANCE_FLOOR,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Final recommendation list plus the counts observed at each stage
#[derive(Debug, Clone)]
pub struct RankedRecommendations {
    pub recommendations: Vec<ScoredCandidate>,
    pub counts: PipelineCounts,
}

/// Ranks a candidate pool against the reference profile
///
/// Pipeline: score, drop anything at or below the relevance floor, sort by
/// score descending, keep the first occurrence of each normalized title, then
/// truncate. The sort is stable, so equal scores keep the incoming order
/// (popularity descending as supplied by the data source), and because
/// deduplication runs after sorting the highest-scoring duplicate wins.
pub fn rank_candidates(
    reference: &ReferenceProfile,
    candidates: Vec<Movie>,
    options: &RankingOptions,
) -> RankedRecommendations {
    let candidates_found = candidates.len();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|movie| score_movie(reference, movie))
        .filter(|candidate| candidate.recommendation_score > options.relevance_floor)
        .collect();
    let filtered_count = scored.len();

    scored.sort_by(|a, b| b.recommendation_score.total_cmp(&a.recommendation_score));

    let mut seen_titles = HashSet::new();
    let mut unique: Vec<ScoredCandidate> = scored
        .into_iter()
        .filter(|candidate| seen_titles.insert(candidate.movie.normalized_title()))
        .collect();
    let deduped_count = unique.len();

    unique.truncate(options.max_results);

    tracing::debug!(
        candidates_found,
        filtered_count,
        deduped_count,
        returned = unique.len(),
        top = ?unique
            .iter()
            .take(5)
            .map(|c| (c.movie.title.as_str(), c.recommendation_score))
            .collect::<Vec<_>>(),
        "Ranked recommendation candidates"
    );

    RankedRecommendations {
        recommendations: unique,
        counts: PipelineCounts {
            candidates_found,
            filtered_count,
            deduped_count,
        },
    }
}
