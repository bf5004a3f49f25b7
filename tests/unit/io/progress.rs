//! Tests for stage progress display bookkeeping

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;
    use tilesynth::Stage;
    use tilesynth::io::progress::ProgressManager;

    // Tests a full single-file lifecycle through every stage
    // Verified by indexing file states by stage instead of file
    #[test]
    fn test_single_file_lifecycle() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);
        assert_eq!(pm.file_count(), 1);

        pm.start_file(0, Path::new("dir/brick.png"));
        for stage in Stage::ALL {
            pm.update_stage(0, stage);
        }
        pm.complete_file(0, Duration::from_millis(1500));
        pm.finish();
    }

    // Tests that large batches and out-of-order indices are tolerated
    // Verified by indexing bars by file index without the rolling window
    #[test]
    fn test_batch_mode_with_many_files() {
        let mut pm = ProgressManager::default();
        pm.initialize(12);
        for index in 0..12 {
            pm.start_file(index, Path::new("tile.png"));
            pm.update_stage(index, Stage::Quilt);
            pm.complete_file(index, Duration::ZERO);
        }
        pm.update_stage(40, Stage::Restore);
        pm.finish();
        assert_eq!(pm.file_count(), 12);
    }
}
