//! Tests for the bitonic schedule, sort batches and rank tables

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use tilesynth::SynthesisError;
    use tilesynth::compute::sort::{
        BitonicPass, PADDING_KEY, bitonic_schedule, pair_first_index, pair_is_ascending,
    };
    use tilesynth::compute::{ComputeBackend, CpuBackend, ParallelRankSort, SortBatch};
    use tilesynth::io::pixels::PixelBuffer;

    struct CountingBackend {
        sorts: Cell<usize>,
    }

    impl ComputeBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn bitonic_sort(&self, batch: &mut SortBatch) -> tilesynth::Result<()> {
            self.sorts.set(self.sorts.get() + 1);
            CpuBackend::new().bitonic_sort(batch)
        }

        fn blend_borders(&self, input: &PixelBuffer, _border: u32) -> tilesynth::Result<PixelBuffer> {
            Ok(input.clone())
        }
    }

    // Tests the (k, j) pass sequence of the standard network
    // Verified by iterating j upwards within each stage
    #[test]
    fn test_bitonic_schedule() {
        assert!(bitonic_schedule(0).is_empty());
        assert!(bitonic_schedule(1).is_empty());
        assert_eq!(bitonic_schedule(2), vec![BitonicPass { k: 2, j: 1 }]);

        let passes: Vec<(u32, u32)> = bitonic_schedule(8).iter().map(|p| (p.k, p.j)).collect();
        assert_eq!(passes, vec![(2, 1), (4, 2), (4, 1), (8, 4), (8, 2), (8, 1)]);

        // log2(n) * (log2(n) + 1) / 2 passes
        assert_eq!(bitonic_schedule(1 << 10).len(), 55);
    }

    // Tests that every index is visited exactly once per pass
    // Verified by computing the first index as 2 * pair
    #[test]
    fn test_pair_indexing_covers_every_element() {
        let n = 16u32;
        for pass in bitonic_schedule(n as usize) {
            let mut visited = vec![0u8; n as usize];
            for pair in 0..n / 2 {
                let first = pair_first_index(pair, pass.j);
                for index in [first, first + pass.j] {
                    if let Some(count) = visited.get_mut(index as usize) {
                        *count += 1;
                    }
                }
            }
            assert!(visited.iter().all(|&c| c == 1), "Pass {pass:?} overlaps");
        }
        assert!(pair_is_ascending(0, 4));
        assert!(!pair_is_ascending(4, 4));
        assert!(pair_is_ascending(9, 4));
    }

    // Tests interleaving and padding of a batch
    // Verified by padding with zero keys
    #[test]
    fn test_batch_layout() {
        let batch =
            SortBatch::from_channels(&[vec![3.0, 1.0, 2.0], vec![-1.0, -2.0, -3.0]]).expect("batch");
        assert_eq!(batch.channels(), 2);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.padded_len(), 4);
        assert_eq!(
            batch.keys(),
            &[3.0, -1.0, 1.0, -2.0, 2.0, -3.0, PADDING_KEY, PADDING_KEY]
        );
        assert_eq!(batch.payload(), &[0, 0, 1, 1, 2, 2, 0, 0]);
    }

    // Tests batch construction errors
    // Verified by truncating channels to the shortest length
    #[test]
    fn test_batch_rejects_malformed_channels() {
        assert!(matches!(
            SortBatch::from_channels(&[]),
            Err(SynthesisError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            SortBatch::from_channels(&[vec![1.0, 2.0], vec![1.0]]),
            Err(SynthesisError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let mut batch = SortBatch::from_channels(&[vec![1.0, 2.0]]).expect("batch");
        assert!(batch.replace(vec![1.0], vec![0, 1]).is_err());
    }

    // Tests that extraction detects unsorted or sentinel-polluted output
    // Verified by skipping the post-sort checks
    #[test]
    fn test_rank_tables_validate_device_output() {
        let batch = SortBatch::from_channels(&[vec![2.0, 1.0]]).expect("batch");
        assert!(matches!(
            batch.clone().into_rank_tables(),
            Err(SynthesisError::Computation { .. })
        ));

        let mut polluted = SortBatch::from_channels(&[vec![1.0, 2.0, 3.0]]).expect("batch");
        polluted
            .replace(vec![1.0, PADDING_KEY, 2.0, 3.0], vec![0, 0, 1, 2])
            .expect("same length");
        assert!(polluted.into_rank_tables().is_err());
    }

    // Tests key-value sorting of several channels on the reference device
    // Verified by sorting keys without moving the payload
    #[test]
    fn test_parallel_rank_sort_on_cpu() {
        let backend = CpuBackend::new();
        let channels = vec![
            vec![0.5, -1.0, 3.0, 0.5, 2.0],
            vec![9.0, 8.0, 7.0, 6.0, 5.0],
        ];
        let tables = ParallelRankSort::new(&backend).sort(&channels).expect("sort");
        assert_eq!(tables.len(), 2);

        for (table, channel) in tables.iter().zip(&channels) {
            assert_eq!(table.len(), 5);
            assert!(table.values().is_sorted());
            for (index, value) in table.iter() {
                assert_eq!(channel.get(index as usize), Some(&value));
            }
            let mut indices = table.indices().to_vec();
            indices.sort_unstable();
            assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(tables[1].indices(), &[4, 3, 2, 1, 0]);
        assert_eq!(tables[0].value_at(0), Some(-1.0));
        assert_eq!(tables[0].value_at(99), Some(3.0));
    }

    // Tests that empty input returns immediately without a dispatch
    // Verified by always calling the backend
    #[test]
    fn test_empty_input_skips_device() {
        let backend = CountingBackend { sorts: Cell::new(0) };
        let tables = ParallelRankSort::new(&backend)
            .sort(&[Vec::new(), Vec::new(), Vec::new()])
            .expect("sort");
        assert_eq!(tables.len(), 3);
        assert!(tables.iter().all(|t| t.is_empty() && t.value_at(0).is_none()));
        assert_eq!(backend.sorts.get(), 0);

        ParallelRankSort::new(&backend).sort(&[vec![1.0]]).expect("sort");
        assert_eq!(backend.sorts.get(), 1);
    }
}
