// Confusion matrix over the fixed emotion set

use serde::Serialize;

use crate::emotion::types::EmotionLabel;

const N: usize = EmotionLabel::ALL.len();

/// Counts of (true, predicted) pairs; rows are true labels, columns
/// predicted labels, both in `EmotionLabel::ALL` order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[u32; N]; N],
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (EmotionLabel, EmotionLabel)>,
    {
        let mut matrix = Self::new();
        for (actual, predicted) in pairs {
            matrix.record(actual, predicted);
        }
        matrix
    }

    pub fn record(&mut self, actual: EmotionLabel, predicted: EmotionLabel) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    #[cfg(test)]
    pub fn count(&self, actual: EmotionLabel, predicted: EmotionLabel) -> u32 {
        self.counts[actual.index()][predicted.index()]
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[[u32; N]; N] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Correctly classified pairs
    pub fn trace(&self) -> u32 {
        (0..N).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.trace() as f64 / total as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EmotionLabel::*;

    #[test]
    fn test_perfect_predictions_are_diagonal() {
        let labels = [Happy, Sad, Calm, Calm, Anger, Mixed, Happy];
        let matrix = ConfusionMatrix::from_pairs(labels.iter().map(|&l| (l, l)));

        assert_eq!(matrix.trace(), labels.len() as u32);
        assert_eq!(matrix.total(), labels.len() as u32);
        assert_eq!(matrix.accuracy(), Some(1.0));
        for (i, row) in matrix.rows().iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                if i != j {
                    assert_eq!(count, 0);
                }
            }
        }
        assert_eq!(matrix.count(Calm, Calm), 2);
    }

    #[test]
    fn test_rows_are_true_labels() {
        let matrix = ConfusionMatrix::from_pairs([(Joy, Happy), (Joy, Happy), (Fear, Anger), (Sad, Sad)]);

        assert_eq!(matrix.count(Joy, Happy), 2);
        assert_eq!(matrix.count(Happy, Joy), 0);
        assert_eq!(matrix.rows()[Fear.index()][Anger.index()], 1);
        assert_eq!(matrix.trace(), 1);
        assert_eq!(matrix.accuracy(), Some(0.25));
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = ConfusionMatrix::new();
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.accuracy(), None);
    }
}
