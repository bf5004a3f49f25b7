//! Tests that the WGSL kernels parse and validate

#[cfg(test)]
mod tests {
    use tilesynth::compute::shaders::{BITONIC_SORT_SHADER, BORDER_BLEND_SHADER, KERNEL_ENTRY_POINT};
    use tilesynth::io::configuration::{BORDER_WORKGROUP_SIZE, SORT_WORKGROUP_SIZE};

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("WGSL parse failed:\n{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("WGSL validation failed: {e:?}"));
        module
    }

    fn compute_entry(module: &naga::Module) -> &naga::EntryPoint {
        let entry = module
            .entry_points
            .iter()
            .find(|ep| ep.name == KERNEL_ENTRY_POINT)
            .unwrap_or_else(|| panic!("missing entry point {KERNEL_ENTRY_POINT}"));
        assert_eq!(entry.stage, naga::ShaderStage::Compute);
        entry
    }

    // Tests the bitonic compare-and-swap kernel
    // Verified by declaring the key buffer read-only
    #[test]
    fn test_bitonic_sort_shader_validates() {
        let module = validate(BITONIC_SORT_SHADER);
        let entry = compute_entry(&module);
        assert_eq!(entry.workgroup_size, [SORT_WORKGROUP_SIZE, 1, 1]);
    }

    // Tests the border blend kernel
    // Verified by indexing the output with a float
    #[test]
    fn test_border_blend_shader_validates() {
        let module = validate(BORDER_BLEND_SHADER);
        let entry = compute_entry(&module);
        assert_eq!(
            entry.workgroup_size,
            [BORDER_WORKGROUP_SIZE, BORDER_WORKGROUP_SIZE, 1]
        );
    }
}
