use crate::{
    config::DiscoverySettings,
    error::{AppError, AppResult},
    models::{Movie, RecommendationDebug, RecommendationResponse, SearchCriteria},
    services::{
        attributes::ReferenceProfile,
        ranking::rank_candidates,
        sources::{MovieSource, PARTIAL_MATCH_LIMIT},
    },
};

/// Titles fetched to build a "try searching for" hint
const SUGGESTION_SAMPLE_SIZE: u32 = 5;

/// Titles named in the hint
const SUGGESTION_COUNT: usize = 3;

/// Resolves the searched title to a movie
///
/// An exact case-insensitive match wins; otherwise the first of the partial
/// matches is used.
pub async fn find_reference_movie(
    source: &dyn MovieSource,
    title: &str,
) -> AppResult<Option<Movie>> {
    if let Some(movie) = source.find_by_exact_title(title).await? {
        tracing::debug!(title = %movie.title, "Found exact title match");
        return Ok(Some(movie));
    }

    let partial = source
        .find_by_partial_title(title, PARTIAL_MATCH_LIMIT)
        .await?;
    if let Some(movie) = partial.into_iter().next() {
        tracing::debug!(title = %movie.title, "Found partial title match");
        return Ok(Some(movie));
    }

    Ok(None)
}

/// Builds the hint returned when a search matched nothing
pub fn build_suggestion(sample_titles: &[String]) -> String {
    if sample_titles.is_empty() {
        return "No movies found in database".to_string();
    }

    let titles: Vec<&str> = sample_titles
        .iter()
        .take(SUGGESTION_COUNT)
        .map(String::as_str)
        .collect();
    format!("Try searching for: {}", titles.join(", "))
}

/// Finds movies similar to the one matching `title`
///
/// Fails with `MovieNotFound` when the title matches nothing and with
/// `NoCandidates` when the data source returns an empty pool. A pool where
/// nothing clears the relevance floor is a successful, empty result.
pub async fn recommend_similar(
    source: &dyn MovieSource,
    settings: &DiscoverySettings,
    title: &str,
) -> AppResult<RecommendationResponse> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Movie title is required".to_string()));
    }

    let Some(searched_movie) = find_reference_movie(source, title).await? else {
        let samples = source.sample_titles(SUGGESTION_SAMPLE_SIZE).await?;
        tracing::info!(search_term = %title, "No movie matched search term");
        return Err(AppError::MovieNotFound {
            search_term: title.to_string(),
            suggestion: build_suggestion(&samples),
        });
    };

    let profile = ReferenceProfile::from_movie(&searched_movie);

    let candidates = source
        .fetch_candidates(searched_movie.id, &settings.candidates)
        .await?;
    if candidates.is_empty() {
        return Err(AppError::NoCandidates {
            movie: searched_movie.title,
        });
    }

    let ranked = rank_candidates(&profile, candidates, &settings.ranking);

    tracing::info!(
        searched = %searched_movie.title,
        candidates = ranked.counts.candidates_found,
        filtered = ranked.counts.filtered_count,
        deduped = ranked.counts.deduped_count,
        returned = ranked.recommendations.len(),
        "Recommendations ranked"
    );

    let search_criteria = SearchCriteria {
        keywords_count: profile.keywords.len(),
        genres: profile.genres,
        rating: profile.rating,
        popularity: profile.popularity,
    };

    Ok(RecommendationResponse {
        searched_movie,
        total_found: ranked.recommendations.len(),
        recommendations: ranked.recommendations,
        debug: RecommendationDebug {
            counts: ranked.counts,
            search_criteria,
        },
    })
}
