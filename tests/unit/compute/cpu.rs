//! Tests for the serial reference device

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tilesynth::compute::{ComputeBackend, CpuBackend, SortBatch};
    use tilesynth::io::pixels::PixelBuffer;
    use tilesynth::spatial::border::blend_borders_reference;

    // Tests the device name used in logs
    // Verified by renaming the device
    #[test]
    fn test_name() {
        assert_eq!(CpuBackend::new().name(), "cpu-reference");
    }

    // Tests that the border kernel matches the reference implementation exactly
    // Verified by dispatching with the border off by one
    #[test]
    fn test_blend_borders_matches_reference() {
        let data: Vec<f32> = (0..8 * 6 * 4).map(|v| ((v * 37) % 101) as f32 / 101.0).collect();
        let input = PixelBuffer::new(data, 8, 6).expect("valid buffer");
        let device = CpuBackend::new().blend_borders(&input, 3).expect("blend");
        let reference = blend_borders_reference(&input, 3).expect("blend");
        assert_eq!(device, reference);
    }

    proptest! {
        // Tests that the network sorts every channel and permutes payload with keys
        // Verified by swapping keys only
        #[test]
        fn test_bitonic_sort_is_key_value_permutation(
            channels in (1usize..4, 0usize..70).prop_flat_map(|(c, n)| {
                prop::collection::vec(prop::collection::vec(-1.0e3f32..1.0e3, n), c)
            })
        ) {
            let mut batch = SortBatch::from_channels(&channels).expect("batch");
            CpuBackend::new().bitonic_sort(&mut batch).expect("sort");
            let tables = batch.into_rank_tables().expect("sorted output");

            for (table, channel) in tables.iter().zip(&channels) {
                prop_assert!(table.values().is_sorted());
                let mut sorted = channel.clone();
                sorted.sort_by(f32::total_cmp);
                prop_assert_eq!(table.values(), sorted.as_slice());
                for (index, value) in table.iter() {
                    prop_assert_eq!(channel.get(index as usize).copied(), Some(value));
                }
            }
        }
    }
}
