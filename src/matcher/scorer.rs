use smallvec::SmallVec;

use crate::models::catalog::CatalogEntry;

use super::normalize::normalize_name;

/// Deterministic confidence of a catalog entry for a normalized query.
///
/// The confidence is the [`similarity`] of the two names, so a closer name
/// never scores lower than a more distant one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScorer;

impl MatchScorer {
    pub fn new() -> Self {
        Self
    }

    /// Best score over the entry's primary and alternative names.
    pub fn score(&self, query: &str, entry: &CatalogEntry) -> f64 {
        entry
            .all_names()
            .map(|name| self.score_name(query, &normalize_name(name)))
            .fold(0.0, f64::max)
    }

    /// Score against a single, already normalized name.
    pub fn score_name(&self, query: &str, name: &str) -> f64 {
        similarity(&query.to_lowercase(), &name.to_lowercase()).clamp(0.0, 1.0)
    }
}

/// Edit-distance ratio in `[0, 1]`, taking the better of the names as written
/// and the names with their words sorted, so shared words count whatever
/// their order. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    edit_ratio(a, b).max(edit_ratio(&sorted_words(a), &sorted_words(b)))
}

/// `1 - levenshtein / longer length`, over chars.
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Every word is kept; only the order changes.
fn sorted_words(s: &str) -> String {
    let mut words: SmallVec<[&str; 8]> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn levenshtein_distances() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("pokémon"), &chars("pokemon")), 1);
    }

    #[test]
    fn similarity_bounds() {
        assert!(approx(similarity("hades", "hades"), 1.0));
        assert!(approx(similarity("", ""), 1.0));
        assert!(approx(similarity("abc", "xyz"), 0.0));
    }

    #[test]
    fn word_order_is_ignored() {
        assert!(approx(similarity("wild hunt witcher", "witcher wild hunt"), 1.0));
        assert!(similarity("witcher", "witcher wild hunt") < 1.0);
        // Sorting never drops words.
        assert!(similarity("hollow knight", "hollow knight x") < 1.0);
    }

    #[test]
    fn exact_match_scores_one() {
        let scorer = MatchScorer::new();
        let entry = CatalogEntry::new(1, "Hollow Knight");
        assert!(approx(scorer.score("Hollow Knight", &entry), 1.0));
        assert!(approx(scorer.score("hollow knight", &entry), 1.0));
    }

    #[test]
    fn alternative_names_take_the_maximum() {
        let scorer = MatchScorer::new();
        let entry = CatalogEntry::new(1, "The Elder Scrolls V: Skyrim")
            .with_alternative_names(["Skyrim"]);
        assert!(approx(scorer.score("Skyrim", &entry), 1.0));
    }

    #[test]
    fn catalog_names_are_normalized() {
        let scorer = MatchScorer::new();
        let entry = CatalogEntry::new(1, "Fallout 4: Game of the Year Edition");
        assert!(approx(scorer.score("Fallout 4", &entry), 1.0));
    }

    #[test]
    fn closer_names_never_score_lower() {
        let scorer = MatchScorer::new();
        let queries = ["hollow knight", "celeste", "the witcher 3", "doom"];
        let names = [
            "hollow knight",
            "hollow knighz",
            "hollow knight x",
            "hollow knight a b",
            "knight hollow",
            "hollow",
            "celeste",
            "celestee",
            "celestial",
            "celery quest",
            "c",
            "witcher 3 the",
            "the witcher 3 x",
            "the witcher",
            "doom",
            "doom ii",
            "doom 2 x",
            "",
        ];
        for query in queries {
            for a in names {
                for b in names {
                    if similarity(query, a) > similarity(query, b) {
                        let (sa, sb) = (scorer.score_name(query, a), scorer.score_name(query, b));
                        assert!(sa >= sb, "{query:?}: {a:?} ({sa}) < {b:?} ({sb})");
                    }
                }
            }
        }

        // A one-letter suffix must not beat a one-letter typo that is closer.
        let typo = scorer.score_name("hollow knight", "hollow knighz");
        let suffix = scorer.score_name("hollow knight", "hollow knight x");
        assert!(edit_ratio("hollow knight", "hollow knighz") > edit_ratio("hollow knight", "hollow knight x"));
        assert!(typo >= suffix, "{typo} < {suffix}");
    }
}
