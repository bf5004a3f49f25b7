//! Command-line interface for batch conversion of PNG files into tileable textures

use crate::algorithm::{SynthesisOptions, TileableSynthesizer};
use crate::compute::{ComputeBackend, CpuBackend, GpuContext, WgpuBackend};
use crate::io::configuration::{
    DEFAULT_BORDER_PERCENT, DEFAULT_SEED, OUTPUT_SUFFIX, PREVIEW_REPEAT, PREVIEW_SUFFIX,
};
use crate::io::error::{Result, path_error};
use crate::io::image::{load_png, save_png, tile_preview};
use crate::io::progress::ProgressManager;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tilesynth")]
#[command(
    author,
    version,
    about = "Turn photographs into seamlessly tiling textures"
)]
/// Command-line arguments for the synthesis tool
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input PNG file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Border band as a percentage of half the shorter side (0 copies the input)
    #[arg(short, long, default_value_t = DEFAULT_BORDER_PERCENT)]
    pub border: f32,

    /// Seed for the tile placement stream
    #[arg(short, long, default_value_t = DEFAULT_SEED, allow_negative_numbers = true)]
    pub seed: i64,

    /// Run on the serial reference device instead of the GPU
    #[arg(short, long)]
    pub cpu: bool,

    /// Also write a 2x2 repetition of each result
    #[arg(short, long)]
    pub preview: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process files even if output exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Synthesis options selected on the command line
    pub const fn options(&self) -> SynthesisOptions {
        SynthesisOptions::with_border_percent(self.border).seed(self.seed)
    }

    /// Acquire the compute device requested on the command line
    ///
    /// # Errors
    ///
    /// Returns [`crate::SynthesisError::UnsupportedBackend`] if the GPU was
    /// requested and none is available
    pub fn backend(&self) -> Result<Box<dyn ComputeBackend>> {
        if self.cpu {
            return Ok(Box::new(CpuBackend::new()));
        }
        let context = GpuContext::shared()?;
        Ok(Box::new(WgpuBackend::new(context)?))
    }
}

/// Orchestrates batch processing of PNG files with progress tracking
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process files according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid, the device cannot be
    /// acquired, or any file fails to load, synthesize or save
    pub fn process(&mut self) -> Result<()> {
        let files = self.collect_files()?;

        if files.is_empty() {
            return Ok(());
        }

        let options = self.cli.options();
        options.validate()?;
        let backend = self.cli.backend()?;
        tracing::info!(backend = backend.name(), files = files.len(), "processing");
        let synthesizer = TileableSynthesizer::new(backend, options)?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for (index, file) in files.iter().enumerate() {
            self.process_file(&synthesizer, file, index)?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    /// PNG files the target resolves to, minus skipped ones, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a PNG file nor a readable
    /// directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        if target.is_file() {
            if !is_png(target) {
                return Err(path_error(target, "target file must be a PNG image"));
            }
            Ok(self
                .should_process_file(target)
                .then(|| target.clone())
                .into_iter()
                .collect())
        } else if target.is_dir() {
            let entries = std::fs::read_dir(target).map_err(|e| {
                crate::SynthesisError::FileSystem {
                    path: target.clone(),
                    operation: "read directory",
                    source: e,
                }
            })?;
            let mut files = Vec::new();
            for entry in entries {
                let path = entry?.path();
                if is_png(&path) && !is_generated(&path) && self.should_process_file(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(path_error(target, "target must be a PNG file or directory"))
        }
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        let output_path = Self::output_path(input_path);
        if output_path.exists() {
            // Allow print for user feedback for progress messages
            #[allow(clippy::print_stderr)]
            if !self.cli.quiet {
                eprintln!("Skipping: {} (output exists)", input_path.display());
            }
            false
        } else {
            true
        }
    }

    fn process_file<B: ComputeBackend>(
        &mut self,
        synthesizer: &TileableSynthesizer<B>,
        input_path: &Path,
        index: usize,
    ) -> Result<()> {
        let start_time = Instant::now();
        let _span = tracing::info_span!("file", path = %input_path.display()).entered();

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path);
        }

        let input = load_png(input_path)?;
        let progress = &mut self.progress_manager;
        let output = synthesizer.synthesize_with_progress(&input, |stage| {
            if let Some(pm) = progress.as_mut() {
                pm.update_stage(index, stage);
            }
        })?;

        save_png(&output, &Self::output_path(input_path))?;
        if self.cli.preview {
            let preview = tile_preview(&output, PREVIEW_REPEAT, PREVIEW_REPEAT)?;
            save_png(&preview, &Self::preview_path(input_path))?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file(index, start_time.elapsed());
        }
        tracing::debug!(elapsed_ms = start_time.elapsed().as_millis(), "file written");

        Ok(())
    }

    /// Path of the tileable result for `input_path`
    pub fn output_path(input_path: &Path) -> PathBuf {
        sibling_with_suffix(input_path, OUTPUT_SUFFIX)
    }

    /// Path of the repeated preview for `input_path`
    pub fn preview_path(input_path: &Path) -> PathBuf {
        sibling_with_suffix(input_path, PREVIEW_SUFFIX)
    }
}

fn sibling_with_suffix(input_path: &Path, suffix: &str) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let name = format!("{}{suffix}.png", stem.to_string_lossy());

    if let Some(parent) = input_path.parent() {
        parent.join(name)
    } else {
        PathBuf::from(name)
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

// Outputs of earlier runs living next to their sources
fn is_generated(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX) || stem.ends_with(PREVIEW_SUFFIX))
}
