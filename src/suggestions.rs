//! Fuzzy "did you mean" candidates for unknown unit names.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

const THRESHOLD: i64 = 30;
const LIMIT: usize = 3;

/// Returns up to three registered names that fuzzy-match `name`, best
/// match first.
pub(crate) fn similar_names<'a>(
    name: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = candidates
        .filter_map(|candidate| {
            matcher
                .fuzzy_match(candidate, name)
                .filter(|score| *score >= THRESHOLD)
                .map(|score| (score, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.truncate(LIMIT);
    scored
        .into_iter()
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
