//! Extraction of a timer value out of arbitrary page text.

use std::sync::LazyLock;

use regex::Regex;

/// Matches MM:SS and H:MM:SS clock readings. Minute/second fields are capped
/// at 59 so version strings like 3:87 don't get picked up.
static TIMER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d+:)?[0-5]?\d:[0-5]\d\b").unwrap());

/// Picks the timer reading out of evaluated page text. When several values
/// match, the one with more fields wins (H:MM:SS over MM:SS), since the
/// session countdown is the longest clock on the Brain.fm page.
pub fn find_timer(text: &str) -> Option<&str> {
    if text.is_empty() {
        return None;
    }
    let mut best: Option<&str> = None;
    for m in TIMER_PATTERN.find_iter(text) {
        let candidate = m.as_str();
        let longer =
            best.map_or(true, |b| candidate.matches(':').count() > b.matches(':').count());
        // Earlier match wins on equal length, same as the page lists it.
        if longer {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::find_timer;

    #[test]
    fn extracts_minute_second_timer() {
        assert_eq!(find_timer("focus 12:34 remaining"), Some("12:34"));
    }

    #[test]
    fn prefers_timer_with_hours() {
        let text = "session 5:12 | total 1:05:12 left";
        assert_eq!(find_timer(text), Some("1:05:12"));
    }

    #[test]
    fn rejects_out_of_range_seconds() {
        assert_eq!(find_timer("version 3:87 build"), None);
    }

    #[test]
    fn allows_single_digit_minutes() {
        assert_eq!(find_timer("up next in 7:05"), Some("7:05"));
    }

    #[test]
    fn first_match_wins_on_equal_length() {
        assert_eq!(find_timer("12:34 then 56:07"), Some("12:34"));
    }

    #[test]
    fn empty_and_plain_text_yield_nothing() {
        assert_eq!(find_timer(""), None);
        assert_eq!(find_timer("deep work"), None);
    }
}
