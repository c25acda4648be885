//! Dataset and batching for Burn training.

use burn::prelude::*;

/// A single transformed loan row with its default label.
#[derive(Debug, Clone)]
pub struct CreditDatasetItem {
    /// Scaled (and optionally projected) feature vector.
    pub features: Vec<f32>,
    /// 1.0 if the loan defaulted, otherwise 0.0.
    pub label: f32,
}

/// Dataset for credit default training.
#[derive(Debug, Clone)]
pub struct CreditDataset {
    items: Vec<CreditDatasetItem>,
}

impl CreditDataset {
    /// Creates a dataset from transformed rows and their labels.
    ///
    /// Rows and labels are paired positionally; surplus entries on either
    /// side are ignored.
    #[must_use]
    pub fn new(rows: &[Vec<f64>], labels: &[u8]) -> Self {
        let items = rows
            .iter()
            .zip(labels)
            .map(|(row, &label)| CreditDatasetItem {
                features: row.iter().map(|&v| v as f32).collect(),
                label: f32::from(label),
            })
            .collect();
        Self { items }
    }

    /// Splits off the trailing `fraction` of items as a validation set.
    ///
    /// Returns `(train, valid)`. The cut is at `floor(len * (1 - fraction))`,
    /// so the validation set rounds up; the training set always keeps at
    /// least one row when the dataset is non-empty.
    #[must_use]
    pub fn split_tail(&self, fraction: f64) -> (Self, Self) {
        let len = self.items.len();
        let fraction = fraction.clamp(0.0, 1.0);
        let cut = ((len as f64) * (1.0 - fraction)).floor() as usize;
        let cut = cut.max(1).min(len);

        (
            Self {
                items: self.items[..cut].to_vec(),
            },
            Self {
                items: self.items[cut..].to_vec(),
            },
        )
    }

    /// Width of the feature vectors, or 0 for an empty dataset.
    #[must_use]
    pub fn width(&self) -> usize {
        self.items.first().map_or(0, |item| item.features.len())
    }
}

impl burn::data::dataset::Dataset<CreditDatasetItem> for CreditDataset {
    fn get(&self, index: usize) -> Option<CreditDatasetItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A batch of training data.
#[derive(Debug, Clone)]
pub struct CreditBatch<B: Backend> {
    /// Input features tensor of shape `[batch_size, width]`.
    pub inputs: Tensor<B, 2>,
    /// Labels tensor of shape `[batch_size, 1]`.
    pub targets: Tensor<B, 2>,
}

/// Batcher for creating training batches.
#[derive(Debug, Clone)]
pub struct CreditBatcher<B: Backend> {
    device: B::Device,
    width: usize,
}

impl<B: Backend> CreditBatcher<B> {
    /// Creates a new batcher for rows of the given width.
    #[must_use]
    pub const fn new(device: B::Device, width: usize) -> Self {
        Self { device, width }
    }

    /// Creates a batch from a vector of items.
    pub fn batch(&self, items: Vec<CreditDatasetItem>) -> CreditBatch<B> {
        let batch_size = items.len();

        let mut features_data = Vec::with_capacity(batch_size * self.width);
        let mut targets_data = Vec::with_capacity(batch_size);

        for item in items {
            debug_assert_eq!(item.features.len(), self.width);
            features_data.extend_from_slice(&item.features);
            targets_data.push(item.label);
        }

        let inputs = Tensor::<B, 1>::from_floats(features_data.as_slice(), &self.device)
            .reshape([batch_size, self.width]);

        let targets = Tensor::<B, 1>::from_floats(targets_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        CreditBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::data::dataset::Dataset;

    use super::*;

    type TestBackend = NdArray;

    fn sample(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let rows = (0..n).map(|i| vec![i as f64, 1.0, -1.0]).collect();
        let labels = (0..n).map(|i| u8::from(i % 3 == 0)).collect();
        (rows, labels)
    }

    #[test]
    fn test_dataset_creation() {
        let (rows, labels) = sample(2);
        let dataset = CreditDataset::new(&rows, &labels);

        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());
        assert_eq!(dataset.width(), 3);

        let first = dataset.get(0).expect("first item");
        assert!((first.label - 1.0).abs() < f32::EPSILON);
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_split_tail() {
        let (rows, labels) = sample(10);
        let dataset = CreditDataset::new(&rows, &labels);

        let (train, valid) = dataset.split_tail(0.2);
        assert_eq!(train.len(), 8);
        assert_eq!(valid.len(), 2);
        // The validation rows are the last ones, not a random sample.
        let first_valid = valid.get(0).expect("valid item");
        assert!((first_valid.features[0] - 8.0).abs() < f32::EPSILON);

        let (rows, labels) = sample(11);
        let (train, valid) = CreditDataset::new(&rows, &labels).split_tail(0.2);
        assert_eq!(train.len(), 8);
        assert_eq!(valid.len(), 3);

        let (train, valid) = CreditDataset::new(&rows, &labels).split_tail(0.0);
        assert_eq!(train.len(), 11);
        assert!(valid.is_empty());

        let (train, valid) = CreditDataset::new(&rows[..1], &labels[..1]).split_tail(0.5);
        assert_eq!(train.len(), 1);
        assert!(valid.is_empty());
    }

    #[test]
    fn test_batcher() {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let batcher = CreditBatcher::<TestBackend>::new(device, 3);

        let (rows, labels) = sample(4);
        let dataset = CreditDataset::new(&rows, &labels);
        let items: Vec<_> = (0..dataset.len()).filter_map(|i| dataset.get(i)).collect();

        let batch = batcher.batch(items);

        assert_eq!(batch.inputs.dims(), [4, 3]);
        assert_eq!(batch.targets.dims(), [4, 1]);

        let targets = batch.targets.into_data().to_vec::<f32>().expect("targets");
        assert_eq!(targets, vec![1.0, 0.0, 0.0, 1.0]);
    }
}
