//! End-to-end tileable texture synthesis
//!
//! The stages run strictly in sequence; each one consumes the fully
//! materialized output of the previous one:
//!
//! 1. Analyze: principal axes of the color covariance
//! 2. Gaussianize: rank every axis and replace values by normal quantiles
//! 3. Blend borders: mix the edge bands across the wraparound
//! 4. Quilt: accumulate randomly offset tiles into a periodic image
//! 5. Restore: map the quilted values back onto the source histogram
//!
//! Any failure aborts the whole call; no partial image is returned.

use std::fmt;

use crate::analysis::{ColorPca, DeGaussianizer, Gaussianizer};
use crate::compute::ComputeBackend;
use crate::io::configuration::{DEFAULT_BORDER_PERCENT, DEFAULT_SEED, MIN_BORDER_PIXELS};
use crate::io::error::{Result, invalid_geometry};
use crate::io::pixels::PixelBuffer;
use crate::math::random::RandomSource;
use crate::spatial::{BorderBlender, TileGeometry, TileQuilter};

/// Validated synthesis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisOptions {
    /// Border band as a percentage of half the shorter side; zero disables
    /// synthesis and returns the input unchanged
    pub border_percent: f32,
    /// Seed of the tile offset stream
    pub seed: i64,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            border_percent: DEFAULT_BORDER_PERCENT,
            seed: DEFAULT_SEED,
        }
    }
}

impl SynthesisOptions {
    /// Options with the given border percentage and the default seed
    pub const fn with_border_percent(border_percent: f32) -> Self {
        Self {
            border_percent,
            seed: DEFAULT_SEED,
        }
    }

    /// Replace the seed
    #[must_use]
    pub const fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the border percentage
    ///
    /// # Errors
    ///
    /// Returns an error if the percentage is not a finite value in `0..=100`
    pub fn validate(&self) -> Result<()> {
        if !self.border_percent.is_finite() || !(0.0..=100.0).contains(&self.border_percent) {
            return Err(invalid_geometry(
                "border_percent",
                &self.border_percent,
                &"must be a finite percentage between 0 and 100",
            ));
        }
        Ok(())
    }

    /// Whether these options leave the input untouched
    pub fn is_bypass(&self) -> bool {
        self.border_percent == 0.0
    }

    /// Border width in pixels for a `width x height` image
    ///
    /// Never wider than half the shorter side, rounded down, and never below
    /// the minimum band.
    pub fn border_pixels(&self, width: u32, height: u32) -> u32 {
        let limit = width.min(height) / 2;
        let half = f64::from(width.min(height)) / 2.0;
        let pixels = (f64::from(self.border_percent) / 100.0 * half).round() as u32;
        pixels.min(limit).max(MIN_BORDER_PIXELS)
    }
}

/// Pipeline stage, reported as it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Color covariance and eigen decomposition
    Analyze,
    /// Forward rank transform
    Gaussianize,
    /// Wraparound border blend
    BlendBorders,
    /// Tile placement and accumulation
    Quilt,
    /// Inverse rank transform
    Restore,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Self; 5] = [
        Self::Analyze,
        Self::Gaussianize,
        Self::BlendBorders,
        Self::Quilt,
        Self::Restore,
    ];

    /// Zero-based position in the pipeline
    pub const fn position(self) -> usize {
        match self {
            Self::Analyze => 0,
            Self::Gaussianize => 1,
            Self::BlendBorders => 2,
            Self::Quilt => 3,
            Self::Restore => 4,
        }
    }

    /// Short human readable label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Analyze => "analyzing colors",
            Self::Gaussianize => "gaussianizing",
            Self::BlendBorders => "blending borders",
            Self::Quilt => "quilting tiles",
            Self::Restore => "restoring histogram",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Histogram-preserving tileable texture synthesizer
///
/// Generic over the compute device so tests can inject the reference device
/// or a mock.
pub struct TileableSynthesizer<B: ComputeBackend> {
    backend: B,
    options: SynthesisOptions,
    pca: ColorPca,
}

impl<B: ComputeBackend> TileableSynthesizer<B> {
    /// Create a synthesizer running on `backend`
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid
    pub fn new(backend: B, options: SynthesisOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            backend,
            options,
            pca: ColorPca::default(),
        })
    }

    /// The injected device
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The options in use
    pub const fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Produce a seamlessly tiling version of `input`
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is invalid for the image, the input
    /// holds non-finite samples, or any device stage fails
    pub fn synthesize(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        self.synthesize_with_progress(input, |_| {})
    }

    /// Like [`Self::synthesize`], calling `on_stage` as each stage begins
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is invalid for the image, the input
    /// holds non-finite samples, or any device stage fails
    pub fn synthesize_with_progress<F>(&self, input: &PixelBuffer, mut on_stage: F) -> Result<PixelBuffer>
    where
        F: FnMut(Stage),
    {
        if self.options.is_bypass() {
            tracing::debug!("border is zero, returning input unchanged");
            return Ok(input.clone());
        }

        let (width, height) = (input.width(), input.height());
        let border = self.options.border_pixels(width, height);
        let geometry = TileGeometry::new(width, height, border)?;

        let _span = tracing::info_span!(
            "synthesize",
            backend = self.backend.name(),
            width,
            height,
            border,
            seed = self.options.seed
        )
        .entered();
        tracing::debug!(
            tiles_w = geometry.tile_count_w,
            tiles_h = geometry.tile_count_h,
            radius_w = geometry.tile_radius_w,
            radius_h = geometry.tile_radius_h,
            "tile geometry"
        );

        on_stage(Stage::Analyze);
        let basis = self.pca.analyze(input)?;

        on_stage(Stage::Gaussianize);
        let (gaussian, targets) = Gaussianizer::new(&self.backend)
            .gaussianize(input, &basis)?
            .into_parts();

        on_stage(Stage::BlendBorders);
        let blended = BorderBlender::new(&self.backend).blend(&gaussian, border)?;

        on_stage(Stage::Quilt);
        let mut rng = RandomSource::seed(self.options.seed);
        let quilted = TileQuilter::new(&geometry).quilt(&blended, &gaussian, &mut rng)?;

        on_stage(Stage::Restore);
        let mut output = DeGaussianizer::new(&targets, &basis)?.degaussianize(&quilted)?;
        output.copy_alpha_from(input)?;

        tracing::info!("synthesis complete");
        Ok(output)
    }
}
