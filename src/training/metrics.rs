//! Evaluation metrics for the classifier.

use indexmap::IndexSet;

/// Fraction of positions where `predicted` equals `truth`. Zero for empty input.
pub fn accuracy_score<T: PartialEq>(truth: &[T], predicted: &[T]) -> f64 {
    let total = truth.len().min(predicted.len());
    if total == 0 {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / total as f64
}

#[derive(Debug, Clone)]
/// Confusion matrix over class labels, rows are the true class.
pub struct ConfusionMatrix {
    labels: IndexSet<String>,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: IndexSet<String> = labels.into_iter().map(Into::into).collect();
        let k = labels.len();
        Self {
            labels,
            counts: vec![0; k * k],
        }
    }

    /// Record one prediction. Labels outside the matrix are ignored.
    pub fn add(&mut self, truth: &str, predicted: &str) {
        let k = self.labels.len();
        let (Some(t), Some(p)) = (self.labels.get_index_of(truth), self.labels.get_index_of(predicted)) else {
            return;
        };
        let idx = t * k + p;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: &str, predicted: &str) -> u32 {
        let k = self.labels.len();
        match (self.labels.get_index_of(truth), self.labels.get_index_of(predicted)) {
            (Some(t), Some(p)) => self.counts[t * k + p],
            _ => 0,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Overall accuracy (diagonal over total).
    pub fn accuracy(&self) -> f64 {
        let k = self.labels.len();
        let correct: u64 = (0..k).map(|i| self.counts[i * k + i] as u64).sum();
        match self.total() {
            0 => 0.0,
            total => correct as f64 / total as f64,
        }
    }

    /// `TP / (TP + FN)` for one class, `None` when the class never occurs.
    pub fn recall(&self, label: &str) -> Option<f64> {
        let support: u32 = self.labels().map(|p| self.get(label, p)).sum();
        (support > 0).then(|| self.get(label, label) as f64 / support as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        let truth = ["a", "b", "a", "c"];
        let predicted = ["a", "b", "c", "c"];
        assert_eq!(accuracy_score(&truth, &predicted), 0.75);
        assert_eq!(accuracy_score::<&str>(&[], &[]), 0.0);
    }

    #[test]
    fn confusion_matrix_tracks_pairs() {
        let mut cm = ConfusionMatrix::new(["a", "b"]);
        cm.add("a", "a");
        cm.add("a", "b");
        cm.add("b", "b");
        cm.add("zzz", "a");
        assert_eq!(cm.total(), 3);
        assert_eq!(cm.get("a", "b"), 1);
        assert_eq!(cm.recall("a"), Some(0.5));
        assert_eq!(cm.recall("b"), Some(1.0));
        assert!((cm.accuracy() - 2.0 / 3.0).abs() < 1e-12);
    }
}
