use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::SelectionError;
use crate::history::{window_start, HistoryEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCandidate {
    pub text: String,
    pub overlap_score: usize,
}

/// Lower-cased whitespace tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

/// Picks the candidate least similar to what was published recently.
#[derive(Debug, Clone)]
pub struct TopicScorer {
    novelty_window: Duration,
}

impl TopicScorer {
    pub fn new(novelty_window: Duration) -> Self {
        Self { novelty_window }
    }

    /// Tokens of every topic and keyword recorded inside the novelty window.
    pub fn recent_tokens(&self, history: &[HistoryEntry], now: DateTime<Utc>) -> HashSet<String> {
        let cutoff = window_start(now, self.novelty_window);
        history
            .iter()
            .filter(|e| e.timestamp > cutoff)
            .flat_map(|e| {
                tokenize(&e.topic)
                    .chain(e.keywords.iter().flat_map(|k| tokenize(k)))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// All candidates ranked by ascending overlap; ties keep input order.
    pub fn score_at(
        &self,
        candidates: &[String],
        history: &[HistoryEntry],
        now: DateTime<Utc>,
    ) -> Vec<TopicCandidate> {
        let recent = self.recent_tokens(history, now);

        let mut scored: Vec<TopicCandidate> = candidates
            .iter()
            .map(|text| {
                let distinct: HashSet<String> = tokenize(text).collect();
                TopicCandidate {
                    text: text.clone(),
                    overlap_score: distinct.iter().filter(|t| recent.contains(*t)).count(),
                }
            })
            .collect();

        // sort_by_key is stable
        scored.sort_by_key(|c| c.overlap_score);
        scored
    }

    pub fn score(&self, candidates: &[String], history: &[HistoryEntry]) -> Vec<TopicCandidate> {
        self.score_at(candidates, history, Utc::now())
    }

    pub fn select_at(
        &self,
        candidates: &[String],
        history: &[HistoryEntry],
        now: DateTime<Utc>,
    ) -> Result<TopicCandidate, SelectionError> {
        self.score_at(candidates, history, now)
            .into_iter()
            .next()
            .ok_or(SelectionError::NoCandidatesAvailable)
    }

    pub fn select(
        &self,
        candidates: &[String],
        history: &[HistoryEntry],
    ) -> Result<TopicCandidate, SelectionError> {
        self.select_at(candidates, history, Utc::now())
    }
}

impl Default for TopicScorer {
    fn default() -> Self {
        Self::new(Duration::days(7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_candidates_fail() {
        let scorer = TopicScorer::default();
        assert_eq!(scorer.select(&[], &[]), Err(SelectionError::NoCandidatesAvailable));
    }

    #[test]
    fn test_no_history_picks_first_candidate() {
        let scorer = TopicScorer::default();
        let chosen = scorer.select(&strings(&["A topic", "B topic"]), &[]).unwrap();
        assert_eq!(chosen.text, "A topic");
        assert_eq!(chosen.overlap_score, 0);
    }

    #[test]
    fn test_zero_overlap_candidate_wins() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now - Duration::days(1), "Christmas Gift Ideas")];
        let candidates = strings(&[
            "Christmas Gifts For Him",
            "Gift Ideas For Her",
            "Baby Shower Presents",
        ]);

        let chosen = TopicScorer::default().select_at(&candidates, &history, now).unwrap();
        assert_eq!(chosen.text, "Baby Shower Presents");
        assert_eq!(chosen.overlap_score, 0);
    }

    #[test]
    fn test_keywords_count_towards_overlap() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now - Duration::hours(5), "Something Else")
            .with_keywords(["wedding favours"])];
        let candidates = strings(&["Wedding Invitation Ideas", "Anniversary Ideas"]);

        let ranked = TopicScorer::default().score_at(&candidates, &history, now);
        assert_eq!(ranked[0].text, "Anniversary Ideas");
        assert_eq!(ranked[1].overlap_score, 1);
    }

    #[test]
    fn test_tokens_are_case_insensitive() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now, "BIRTHDAY gifts")];
        let ranked = TopicScorer::default().score_at(&strings(&["birthday Gifts"]), &history, now);
        assert_eq!(ranked[0].overlap_score, 2);
    }

    #[test]
    fn test_entries_outside_novelty_window_ignored() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now - Duration::days(20), "Birthday Gifts")];
        let scorer = TopicScorer::new(Duration::days(7));
        let chosen = scorer.select_at(&strings(&["Birthday Gifts", "Wedding Gifts"]), &history, now).unwrap();
        assert_eq!(chosen.text, "Birthday Gifts");
    }

    #[test]
    fn test_unbounded_novelty_window_counts_all_history() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now - Duration::days(900), "Birthday Gifts")];
        let scorer = TopicScorer::new(Duration::MAX);
        let chosen = scorer.select_at(&strings(&["Birthday Gifts", "Wedding Gifts"]), &history, now).unwrap();
        assert_eq!(chosen.text, "Wedding Gifts");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now, "gifts")];
        let candidates = strings(&["Gifts One", "Gifts Two", "Gifts Three"]);
        let ranked = TopicScorer::default().score_at(&candidates, &history, now);
        let order: Vec<&str> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, vec!["Gifts One", "Gifts Two", "Gifts Three"]);
    }

    #[test]
    fn test_repeated_tokens_count_once() {
        let now = Utc::now();
        let history = vec![HistoryEntry::new(now, "gift")];
        let ranked = TopicScorer::default().score_at(&strings(&["Gift gift GIFT"]), &history, now);
        assert_eq!(ranked[0].overlap_score, 1);
    }

    #[test]
    fn test_selection_is_deterministic_and_from_input() {
        let now = Utc::now();
        let history = vec![
            HistoryEntry::new(now - Duration::days(2), "Valentine's Day Gifts").with_keywords(["romantic"]),
            HistoryEntry::new(now - Duration::days(1), "Thank You Gifts"),
        ];
        let candidates = strings(&["Romantic Valentine's Ideas", "Thank You Cards", "Corporate Gift Ideas"]);
        let scorer = TopicScorer::default();

        let first = scorer.select_at(&candidates, &history, now).unwrap();
        let second = scorer.select_at(&candidates, &history, now).unwrap();
        assert_eq!(first, second);
        assert!(candidates.contains(&first.text));
    }
}
