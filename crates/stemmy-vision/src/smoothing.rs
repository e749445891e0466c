//! Temporal smoothing of per-frame emotion labels.
//!
//! Single frames flicker between neighbouring expressions.  The smoother keeps
//! the last `window` labels and reports the majority, so one odd frame does not
//! flip the tutor's tone.

use std::collections::{HashMap, VecDeque};

/// Result of a majority vote over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedLabel {
    pub label: String,
    /// Mean confidence of the frames that voted for `label`.
    pub confidence: f32,
    pub votes: usize,
}

#[derive(Debug, Clone)]
pub struct LabelSmoother {
    window: usize,
    history: VecDeque<(String, f32)>,
}

impl LabelSmoother {
    /// A window of 0 is treated as 1 (no smoothing).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Record one frame's label and return the smoothed result.
    pub fn push(&mut self, label: impl Into<String>, confidence: f32) -> SmoothedLabel {
        let label = label.into();
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back((label.clone(), confidence));
        self.current().unwrap_or(SmoothedLabel {
            label,
            confidence,
            votes: 1,
        })
    }

    /// Majority label of the current window.  Ties go to the label seen most
    /// recently.
    pub fn current(&self) -> Option<SmoothedLabel> {
        // label -> (votes, confidence sum, recency rank; 0 = newest)
        let mut tally: HashMap<&str, (usize, f32, usize)> = HashMap::new();
        for (rank, (label, confidence)) in self.history.iter().rev().enumerate() {
            let entry = tally.entry(label.as_str()).or_insert((0, 0.0, rank));
            entry.0 += 1;
            entry.1 += confidence;
        }

        tally
            .into_iter()
            .min_by(|(_, (va, _, ra)), (_, (vb, _, rb))| vb.cmp(va).then(ra.cmp(rb)))
            .map(|(label, (votes, sum, _))| SmoothedLabel {
                label: label.to_owned(),
                confidence: sum / votes as f32,
                votes,
            })
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn majority_wins() {
        let mut s = LabelSmoother::new(3);
        s.push("happy", 0.8);
        s.push("sad", 0.6);
        let out = s.push("happy", 0.6);
        assert_eq!(out.label, "happy");
        assert_eq!(out.votes, 2);
        assert!((out.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn tie_goes_to_most_recent_label() {
        let mut s = LabelSmoother::new(4);
        s.push("happy", 0.9);
        s.push("sad", 0.5);
        s.push("happy", 0.9);
        let out = s.push("sad", 0.5);
        assert_eq!(out.label, "sad");
    }

    #[test]
    fn window_drops_oldest() {
        let mut s = LabelSmoother::new(2);
        s.push("angry", 0.9);
        s.push("angry", 0.9);
        s.push("neutral", 0.4);
        let out = s.push("neutral", 0.6);
        assert_eq!(out.label, "neutral");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn single_frame_window_follows_input() {
        let mut s = LabelSmoother::new(0);
        assert_eq!(s.window(), 1);
        s.push("happy", 0.9);
        assert_eq!(s.push("surprised", 0.3).label, "surprised");
    }

    #[test]
    fn clear_empties_window() {
        let mut s = LabelSmoother::new(3);
        s.push("happy", 0.9);
        s.clear();
        assert!(s.is_empty());
        assert!(s.current().is_none());
    }
}
