//! Tests for the wraparound border blend

#[cfg(test)]
mod tests {
    use tilesynth::SynthesisError;
    use tilesynth::compute::{ComputeBackend, CpuBackend, SortBatch};
    use tilesynth::io::pixels::PixelBuffer;
    use tilesynth::spatial::border::{BorderBlender, band_weight, blend_borders_reference};

    fn ramp_image(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let (fx, fy) = (x as f32 / width as f32, y as f32 / height as f32);
                data.extend_from_slice(&[fx, fy, fx * fy, 0.25 + 0.5 * fy]);
            }
        }
        PixelBuffer::new(data, width, height).expect("valid image")
    }

    struct OpaqueBackend;

    impl ComputeBackend for OpaqueBackend {
        fn name(&self) -> &str {
            "opaque"
        }

        fn bitonic_sort(&self, batch: &mut SortBatch) -> tilesynth::Result<()> {
            CpuBackend::new().bitonic_sort(batch)
        }

        fn blend_borders(&self, input: &PixelBuffer, border: u32) -> tilesynth::Result<PixelBuffer> {
            let mut output = blend_borders_reference(input, border)?;
            for px in output.data_mut().chunks_exact_mut(4) {
                px[3] = 1.0;
            }
            Ok(output)
        }
    }

    struct ShrinkingBackend;

    impl ComputeBackend for ShrinkingBackend {
        fn name(&self) -> &str {
            "shrinking"
        }

        fn bitonic_sort(&self, batch: &mut SortBatch) -> tilesynth::Result<()> {
            CpuBackend::new().bitonic_sort(batch)
        }

        fn blend_borders(&self, _input: &PixelBuffer, _border: u32) -> tilesynth::Result<PixelBuffer> {
            PixelBuffer::zeroed(2, 2)
        }
    }

    // Tests the band weight profile
    // Verified by measuring distance from the pixel corner instead of its centre
    #[test]
    fn test_band_weight_profile() {
        assert!((band_weight(0, 10, 4) - 0.5625).abs() < 1e-6);
        assert!((band_weight(9, 10, 4) - 0.5625).abs() < 1e-6);
        assert!((band_weight(3, 10, 4) - 0.9375).abs() < 1e-6);
        assert!((band_weight(5, 10, 4) - 1.0).abs() < f32::EPSILON);
        for p in 0..10 {
            let w = band_weight(p, 10, 4);
            assert!((0.5..=1.0).contains(&w));
        }
    }

    // Tests that pixels outside both bands keep their value
    // Verified by dropping the normalization
    #[test]
    fn test_interior_untouched() {
        let input = ramp_image(20, 16);
        let output = blend_borders_reference(&input, 3).expect("blend");
        for y in 4..12 {
            for x in 4..16 {
                assert_eq!(output.pixel(x, y), input.pixel(x, y), "pixel ({x}, {y})");
            }
        }
    }

    // Tests that opposite edges move towards each other
    // Verified by mixing with the neighbour instead of the mirror pixel
    #[test]
    fn test_edges_converge() {
        let input = ramp_image(20, 16);
        let output = blend_borders_reference(&input, 4).expect("blend");
        for y in 5..11 {
            let before = input.pixel(0, y).expect("left")[0] - input.pixel(19, y).expect("right")[0];
            let after = output.pixel(0, y).expect("left")[0] - output.pixel(19, y).expect("right")[0];
            assert!(after.abs() < 0.5 * before.abs(), "row {y}: {before} -> {after}");
        }
        for x in 5..15 {
            let before = input.pixel(x, 0).expect("top")[1] - input.pixel(x, 15).expect("bottom")[1];
            let after = output.pixel(x, 0).expect("top")[1] - output.pixel(x, 15).expect("bottom")[1];
            assert!(after.abs() < 0.5 * before.abs(), "column {x}: {before} -> {after}");
        }
    }

    // Tests that the reference blend leaves alpha alone
    // Verified by blending all four channels
    #[test]
    fn test_reference_keeps_alpha() {
        let input = ramp_image(12, 12);
        let output = blend_borders_reference(&input, 3).expect("blend");
        for (a, b) in input.pixels().zip(output.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }

    // Tests that the blender restores alpha whatever the device returns
    // Verified by returning the device output unchanged
    #[test]
    fn test_blender_restores_alpha() {
        let input = ramp_image(12, 10);
        let output = BorderBlender::new(&OpaqueBackend)
            .blend(&input, 3)
            .expect("blend");
        for (a, b) in input.pixels().zip(output.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }

    // Tests border validation against the shorter side
    // Verified by validating against the longer side
    #[test]
    fn test_blender_rejects_invalid_border() {
        let input = ramp_image(20, 8);
        let backend = CpuBackend::new();
        let blender = BorderBlender::new(&backend);
        for border in [0, 1, 5] {
            assert!(matches!(
                blender.blend(&input, border),
                Err(SynthesisError::InvalidGeometry { .. })
            ));
        }
        assert!(blender.blend(&input, 4).is_ok());
    }

    // Tests detection of a device returning the wrong size
    // Verified by trusting the device output
    #[test]
    fn test_blender_rejects_resized_output() {
        let input = ramp_image(8, 8);
        let result = BorderBlender::new(&ShrinkingBackend).blend(&input, 2);
        assert!(matches!(result, Err(SynthesisError::LengthMismatch { .. })));
    }
}
