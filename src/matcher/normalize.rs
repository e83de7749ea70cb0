//! Name normalization for catalog lookups.
//!
//! The pipeline strips release years, edition keywords and "Director's Cut",
//! turns underscores into spaces, drops symbols (letters of any script,
//! accented ones included, survive) and collapses whitespace. It is repeated
//! until the output no longer changes, which makes [`normalize_name`]
//! idempotent even when one stage exposes work for an earlier one
//! (`Game_GOTY` only reveals `GOTY` once the underscore is gone).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static RELEASE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\d{4}\s*\)").expect("valid regex"));

static EDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:the|digital)\s+)?(?:goty|game\s+of\s+the\s+year|deluxe|ultimate|definitive)(?:\s+edition)?\b",
    )
    .expect("valid regex")
});

/// Weaker keywords only count together with "Edition" ("Gold Rush" stays).
static QUALIFIED_EDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:the|digital)\s+)?(?:complete|gold|premium|special|collector['’]?s|enhanced|anniversary|standard|digital)\s+edition\b",
    )
    .expect("valid regex")
});

static DIRECTORS_CUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdirector['’]?s\s+cut\b").expect("valid regex"));

static APOSTROPHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"['’]").expect("valid regex"));

static SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

fn normalize_once(name: &str) -> String {
    let s = RELEASE_YEAR.replace_all(name, " ");
    let s = EDITION.replace_all(&s, " ");
    let s = QUALIFIED_EDITION.replace_all(&s, " ");
    let s = DIRECTORS_CUT.replace_all(&s, " ");
    let s = s.replace('_', " ");
    let s = APOSTROPHE.replace_all(&s, "");
    let s = SYMBOLS.replace_all(&s, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Strips edition/release noise from a raw file or folder name.
pub fn normalize_name(name: &str) -> String {
    // Every pass that changes its input also shortens it, so this ends.
    let mut current = normalize_once(name);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

const ROMAN: [(&str, &str); 9] = [
    ("2", "II"),
    ("3", "III"),
    ("4", "IV"),
    ("5", "V"),
    ("6", "VI"),
    ("7", "VII"),
    ("8", "VIII"),
    ("9", "IX"),
    ("10", "X"),
];

/// Swaps a trailing sequel number between arabic and roman notation.
fn swap_sequel_number(name: &str) -> Option<String> {
    let (head, last) = name.rsplit_once(' ')?;
    ROMAN.iter().find_map(|(arabic, roman)| {
        if last == *arabic {
            Some(format!("{head} {roman}"))
        } else if last.eq_ignore_ascii_case(roman) {
            Some(format!("{head} {arabic}"))
        } else {
            None
        }
    })
}

/// Alternative queries for a raw name: the normalized name first, then the
/// name without a leading "The", the part before a subtitle separator, and
/// the sequel number in the other notation. Duplicates and empty names are
/// dropped.
pub fn query_variants(raw: &str) -> Vec<String> {
    let normalized = normalize_name(raw);
    let mut variants = vec![normalized.clone()];

    if let Some(rest) = normalized
        .strip_prefix("The ")
        .or_else(|| normalized.strip_prefix("the "))
    {
        variants.push(rest.to_string());
    }

    let title = raw
        .split_once(':')
        .or_else(|| raw.split_once(" - "))
        .map(|(title, _)| normalize_name(title));
    if let Some(title) = title {
        variants.push(title);
    }

    if let Some(swapped) = swap_sequel_number(&normalized) {
        variants.push(swapped);
    }

    let mut seen = HashSet::new();
    variants
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_release_year() {
        assert_eq!(normalize_name("Game One (2019)"), "Game One");
        assert_eq!(normalize_name("Doom ( 1993 )"), "Doom");
    }

    #[test]
    fn strips_edition_keywords() {
        assert_eq!(normalize_name("Game_Two GOTY Edition"), "Game Two");
        assert_eq!(normalize_name("Skyrim The Definitive Edition"), "Skyrim");
        assert_eq!(normalize_name("Hades DELUXE"), "Hades");
        assert_eq!(normalize_name("Fallout 4 Game of the Year Edition"), "Fallout 4");
        assert_eq!(normalize_name("Witcher 3 Complete Edition"), "Witcher 3");
        assert_eq!(normalize_name("Gold Rush"), "Gold Rush");
    }

    #[test]
    fn strips_directors_cut() {
        assert_eq!(normalize_name("Death Stranding Director's Cut"), "Death Stranding");
        assert_eq!(normalize_name("Disco Elysium Director’s Cut"), "Disco Elysium");
    }

    #[test]
    fn removes_symbols_and_keeps_accents() {
        assert_eq!(normalize_name("Pokémon: Legends"), "Pokémon Legends");
        assert_eq!(normalize_name("Half-Life²"), "Half Life²");
        assert_eq!(normalize_name("Assassin's Creed"), "Assassins Creed");
        assert_eq!(normalize_name("  Spaced    Out  "), "Spaced Out");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "Game One (2019)",
            "Game_Two GOTY Edition",
            "Game_GOTY",
            "Deluxe-Edition Racer",
            "The_Ultimate_Edition",
            "Director's_Cut",
            "Ōkami HD (2017) [Digital Deluxe]",
            "",
            "___",
        ];
        for input in inputs {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once, "input: {input:?}");
        }
        assert_eq!(normalize_name("Game_GOTY"), "Game");
    }

    #[test]
    fn nested_editions_reach_a_fixpoint() {
        for depth in 1..=12 {
            let input = "Gold ".repeat(depth) + &"Edition ".repeat(depth);
            let once = normalize_name(&input);
            assert_eq!(normalize_name(&once), once, "depth {depth}");
            assert_eq!(once, "", "depth {depth}");
        }
        let wrapped = format!("Racer {}{}Turbo", "Special ".repeat(10), "Edition ".repeat(10));
        assert_eq!(normalize_name(&wrapped), "Racer Turbo");
    }

    #[test]
    fn variants_cover_aliases() {
        let variants = query_variants("The Witcher 3: Wild Hunt (2015)");
        assert_eq!(variants[0], "The Witcher 3 Wild Hunt");
        assert!(variants.contains(&"Witcher 3 Wild Hunt".to_string()));
        assert!(variants.contains(&"The Witcher 3".to_string()));

        let variants = query_variants("Final Fantasy VII");
        assert!(variants.contains(&"Final Fantasy 7".to_string()));

        assert_eq!(query_variants("Celeste"), vec!["Celeste".to_string()]);
        assert!(query_variants("(2019)").is_empty());
    }
}
