use serde::{Deserialize, Serialize};

pub use crate::types::{Text, UserKey};

/// One (user, message) pair as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Author key; consecutive records with equal keys form one group.
    pub key: UserKey,
    /// Message body.
    pub value: Text,
}

impl Record {
    /// Build a record from anything convertible into byte vectors.
    pub fn new(key: impl Into<UserKey>, value: impl Into<Text>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Pair label for one comparison unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairLabel {
    /// Anchor text was written by the query group's author.
    SameAuthor,
    /// Anchor text was drawn from an independently sampled group.
    DifferentAuthor,
}

impl PairLabel {
    /// Binary classifier target: `1` for same author, `0` otherwise.
    pub fn value(self) -> u8 {
        match self {
            Self::SameAuthor => 1,
            Self::DifferentAuthor => 0,
        }
    }
}

/// Batch of comparison units flattened for an encoder.
///
/// `texts` is split by `group_sizes` into alternating query groups and single
/// anchors: unit `i` owns `group_sizes[2 * i]` query texts followed by one anchor
/// text, and is labelled by `labels[i]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Query and anchor texts of every unit, in draw order.
    pub texts: Vec<Text>,
    /// Alternating query-group and anchor sizes (anchors are always 1).
    pub group_sizes: Vec<usize>,
    /// One label per unit.
    pub labels: Vec<PairLabel>,
}

impl Batch {
    /// Whether the batch holds no units.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of comparison units in the batch.
    pub fn num_units(&self) -> usize {
        self.labels.len()
    }

    /// Labels as float targets, in unit order.
    pub fn label_values(&self) -> Vec<f32> {
        self.labels
            .iter()
            .map(|label| f32::from(label.value()))
            .collect()
    }

    /// Iterate comparison units as `(query texts, anchor text, label)`.
    ///
    /// Stops at the first unit whose sizes run past `texts`, so a batch with
    /// inconsistent fields yields only its well-formed prefix.
    pub fn units(&self) -> impl Iterator<Item = (&[Text], &Text, PairLabel)> + '_ {
        let mut start = 0usize;
        self.group_sizes
            .chunks_exact(2)
            .zip(self.labels.iter().copied())
            .map_while(move |(sizes, label)| {
                let anchor_at = start.checked_add(sizes[0])?;
                let query = self.texts.get(start..anchor_at)?;
                let anchor = self.texts.get(anchor_at)?;
                start = anchor_at.checked_add(sizes[1])?;
                Some((query, anchor, label))
            })
    }

    pub(crate) fn push_unit(&mut self, texts: Vec<Text>, label: PairLabel) {
        let query_size = texts.len() - 1;
        self.texts.extend(texts);
        self.group_sizes.push(query_size);
        self.group_sizes.push(1);
        self.labels.push(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_follow_group_sizes() {
        let mut batch = Batch::default();
        batch.push_unit(
            vec![b"a1".to_vec(), b"a2".to_vec(), b"a3".to_vec()],
            PairLabel::SameAuthor,
        );
        batch.push_unit(
            vec![b"b1".to_vec(), b"x".to_vec()],
            PairLabel::DifferentAuthor,
        );

        assert_eq!(batch.num_units(), 2);
        assert_eq!(batch.group_sizes, vec![2, 1, 1, 1]);
        assert_eq!(batch.label_values(), vec![1.0, 0.0]);

        let units: Vec<_> = batch.units().collect();
        assert_eq!(units[0].0, &[b"a1".to_vec(), b"a2".to_vec()][..]);
        assert_eq!(units[0].1, &b"a3".to_vec());
        assert_eq!(units[1].0, &[b"b1".to_vec()][..]);
        assert_eq!(units[1].1, &b"x".to_vec());
        assert_eq!(units[1].2, PairLabel::DifferentAuthor);
    }

    #[test]
    fn units_stop_at_inconsistent_sizes() {
        let batch = Batch {
            texts: vec![b"a1".to_vec(), b"a2".to_vec(), b"b1".to_vec()],
            group_sizes: vec![1, 1, 5, 1],
            labels: vec![PairLabel::SameAuthor, PairLabel::DifferentAuthor],
        };
        let units: Vec<_> = batch.units().collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, &[b"a1".to_vec()][..]);
        assert_eq!(units[0].1, &b"a2".to_vec());

        let overflow = Batch {
            texts: vec![b"a1".to_vec()],
            group_sizes: vec![usize::MAX, 1],
            labels: vec![PairLabel::SameAuthor],
        };
        assert_eq!(overflow.units().count(), 0);
    }

    #[test]
    fn empty_batch_has_no_units() {
        let batch = Batch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.units().count(), 0);
        assert!(batch.label_values().is_empty());
    }
}
