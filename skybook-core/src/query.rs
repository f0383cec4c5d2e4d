//! Free-text weather query interpreter.
//!
//! Classifies an arbitrary natural-language question into exactly one of
//! three request shapes. Priority order is fixed and observable behavior:
//! compare > forecast > current. Pure, synchronous string processing; no
//! side effects.

use crate::error::{Error, Result};

pub const DEFAULT_FORECAST_DAYS: u32 = 5;

/// One of the three fixed request shapes a free-text question maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    Current {
        location: String,
    },
    /// `days` is reported as written; clamping to [1, 7] is the caller's job.
    Forecast {
        location: String,
        days: u32,
    },
    Compare {
        location1: String,
        location2: String,
    },
}

/// Interpret a natural-language weather question.
///
/// Fails with a validation error when no location can be extracted (or, for
/// comparisons, when the second location is missing), so the caller never
/// issues a network call for an unusable query.
pub fn interpret(text: &str) -> Result<QueryIntent> {
    let lower = text.to_lowercase();

    if lower.contains("compare") || (lower.contains("between") && lower.contains(" and ")) {
        let pair = extract_pair(text, "between").or_else(|| extract_pair(text, "compare"));
        return match pair {
            Some((location1, location2)) => Ok(QueryIntent::Compare { location1, location2 }),
            None => Err(Error::validation(
                "Please name two locations to compare, e.g. 'compare London and Paris'.",
            )),
        };
    }

    if lower.contains("forecast") {
        let days = day_count(&lower).unwrap_or(DEFAULT_FORECAST_DAYS);
        let location = capture_after_phrase(text, &["forecast", "for"])
            .or_else(|| capture_after_word(text, "in"))
            .or_else(|| capture_after_word(text, "for"));
        return match location {
            Some(location) => Ok(QueryIntent::Forecast { location, days }),
            None => Err(Error::validation(
                "Could not find a location in the query. Try 'forecast for London'.",
            )),
        };
    }

    let location = capture_after_phrase(text, &["weather", "in"])
        .or_else(|| capture_after_word(text, "in"))
        .or_else(|| capture_after_word(text, "for"))
        .or_else(|| strip_weather_preamble(text));

    match location {
        Some(location) => Ok(QueryIntent::Current { location }),
        None => Err(Error::validation(
            "Could not find a location in the query. Try 'weather in London'.",
        )),
    }
}

/// Find the ASCII keyword `word` in `text`, case-insensitively, as a
/// standalone word (not embedded in e.g. "Berlin"). Matching is done on the
/// original string so the returned byte offset is valid for slicing it; a
/// lowercased copy can differ in length ('İ' lowers to two characters).
fn find_word(text: &str, word: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let target = word.as_bytes();
    let mut at = 0;
    while at + target.len() <= bytes.len() {
        // An ASCII match means `at` and the match end are char boundaries.
        if bytes[at..at + target.len()].eq_ignore_ascii_case(target) {
            let end = at + target.len();
            let starts_word = text[..at].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
            let ends_word = text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
            if starts_word && ends_word {
                return Some(at);
            }
        }
        at += 1;
    }
    None
}

/// Take everything after `word` up to a '?', trimmed. `None` when empty.
fn capture_after_word(text: &str, word: &str) -> Option<String> {
    let at = find_word(text, word)?;
    clean_location(&text[at + word.len()..])
}

/// Like [`capture_after_word`], but requires the words to appear in sequence
/// separated only by whitespace, e.g. `["forecast", "for"]`.
fn capture_after_phrase(text: &str, words: &[&str]) -> Option<String> {
    let mut end = 0;
    for (i, word) in words.iter().enumerate() {
        let pos = find_word(&text[end..], word)? + end;
        if i > 0 && text[end..pos].chars().any(|c| !c.is_whitespace()) {
            return None;
        }
        end = pos + word.len();
    }
    clean_location(&text[end..])
}

/// Split `<keyword> X and Y` into the two trimmed location strings.
fn extract_pair(text: &str, keyword: &str) -> Option<(String, String)> {
    let at = find_word(text, keyword)?;
    let rest = &text[at + keyword.len()..];
    let and = find_word(rest, "and")?;

    let first = clean_location(&rest[..and])?;
    let second = clean_location(&rest[and + "and".len()..])?;
    Some((first, second))
}

/// Extract the `N` from `N day` / `N-day`.
fn day_count(lower: &str) -> Option<u32> {
    let bytes = lower.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let mut j = i;
            while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'-') {
                j += 1;
            }
            if lower[j..].starts_with("day") {
                return lower[start..i].parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Fall back to stripping a leading "what's the weather" phrase and using
/// the remainder verbatim.
fn strip_weather_preamble(text: &str) -> Option<String> {
    for prefix in ["what's the weather", "whats the weather", "what is the weather"] {
        if text.len() >= prefix.len()
            && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
        {
            return clean_location(&text[prefix.len()..]);
        }
    }
    None
}

/// Trim whitespace and drop anything from the first '?' onwards.
fn clean_location(raw: &str) -> Option<String> {
    let cut = raw.split('?').next().unwrap_or("").trim();
    if cut.is_empty() { None } else { Some(cut.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret_ok(text: &str) -> QueryIntent {
        interpret(text).expect("query should be interpretable")
    }

    #[test]
    fn current_weather_question() {
        assert_eq!(
            interpret_ok("What's the weather in London?"),
            QueryIntent::Current { location: "London".into() }
        );
    }

    #[test]
    fn bare_preamble_uses_the_remainder_verbatim() {
        assert_eq!(
            interpret_ok("What's the weather Tokyo"),
            QueryIntent::Current { location: "Tokyo".into() }
        );
    }

    #[test]
    fn forecast_with_day_count() {
        assert_eq!(
            interpret_ok("Show me a 5-day forecast for Tokyo"),
            QueryIntent::Forecast { location: "Tokyo".into(), days: 5 }
        );
    }

    #[test]
    fn forecast_defaults_to_five_days() {
        assert_eq!(
            interpret_ok("forecast for Paris"),
            QueryIntent::Forecast { location: "Paris".into(), days: 5 }
        );
    }

    #[test]
    fn forecast_day_count_with_space() {
        assert_eq!(
            interpret_ok("Give me a 3 day forecast in Berlin"),
            QueryIntent::Forecast { location: "Berlin".into(), days: 3 }
        );
    }

    #[test]
    fn compare_via_between_and() {
        assert_eq!(
            interpret_ok("What's the difference between New York and Los Angeles?"),
            QueryIntent::Compare {
                location1: "New York".into(),
                location2: "Los Angeles".into(),
            }
        );
    }

    #[test]
    fn compare_via_compare_keyword() {
        assert_eq!(
            interpret_ok("compare London and Paris"),
            QueryIntent::Compare {
                location1: "London".into(),
                location2: "Paris".into(),
            }
        );
    }

    #[test]
    fn compare_wins_over_forecast() {
        // Priority order is compare > forecast > current.
        assert_eq!(
            interpret_ok("compare the forecast between Oslo and Madrid"),
            QueryIntent::Compare {
                location1: "Oslo".into(),
                location2: "Madrid".into(),
            }
        );
    }

    #[test]
    fn compare_without_second_location_is_a_validation_error() {
        let err = interpret("compare London").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn no_location_is_a_validation_error() {
        let err = interpret("what's the weather?").unwrap_err();
        assert!(err.is_validation());

        let err = interpret("forecast please").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn in_must_be_a_standalone_word() {
        // "Berlin" must not be treated as containing the keyword "in".
        assert_eq!(
            interpret_ok("weather in Berlin"),
            QueryIntent::Current { location: "Berlin".into() }
        );
    }

    #[test]
    fn locations_are_trimmed_and_question_marks_dropped() {
        assert_eq!(
            interpret_ok("compare  San Juan  and  St. John's ?"),
            QueryIntent::Compare {
                location1: "San Juan".into(),
                location2: "St. John's".into(),
            }
        );
    }

    #[test]
    fn non_ascii_queries_do_not_panic() {
        // 'İ' grows from 2 to 3 bytes under to_lowercase(), so any offset
        // arithmetic mixing the two strings would slice mid-character here.
        assert_eq!(
            interpret_ok("İİ in Öland"),
            QueryIntent::Current { location: "Öland".into() }
        );
        assert_eq!(
            interpret_ok("What's the weather in Zürich?"),
            QueryIntent::Current { location: "Zürich".into() }
        );
    }

    #[test]
    fn non_ascii_locations_survive_pair_extraction_intact() {
        assert_eq!(
            interpret_ok("compare İstanbul and Ankara"),
            QueryIntent::Compare {
                location1: "İstanbul".into(),
                location2: "Ankara".into(),
            }
        );
    }

    #[test]
    fn uppercase_keywords_still_match() {
        assert_eq!(
            interpret_ok("WEATHER IN OSLO"),
            QueryIntent::Current { location: "OSLO".into() }
        );
    }
}
