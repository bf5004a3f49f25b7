//! Key-value bitonic sorting network over several channels at once
//!
//! Keys of all channels are interleaved (`keys[i * channels + c]`) so that one
//! dispatch per `(k, j)` pass serves every channel. The element count is padded
//! to a power of two with `+∞` keys, which sort behind every finite key and
//! are cut off again when the rank tables are extracted.

use crate::compute::ComputeBackend;
use crate::io::error::{Result, SynthesisError, computation_error, invalid_geometry};

/// Key used for padding slots
pub const PADDING_KEY: f32 = f32::INFINITY;

/// One compare-and-swap pass of the bitonic schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitonicPass {
    /// Size of the bitonic sequences being merged
    pub k: u32,
    /// Distance between compared elements
    pub j: u32,
}

/// Every pass needed to sort `padded_len` elements, in dispatch order
///
/// `padded_len` must be a power of two. Lengths below two need no passes.
pub fn bitonic_schedule(padded_len: usize) -> Vec<BitonicPass> {
    let mut passes = Vec::new();
    let n = padded_len as u64;
    let mut k = 2u64;
    while k <= n {
        let mut j = k / 2;
        while j > 0 {
            passes.push(BitonicPass {
                k: k as u32,
                j: j as u32,
            });
            j /= 2;
        }
        k *= 2;
    }
    passes
}

/// Position of the first element of compare pair `pair` in a pass with stride `j`
///
/// The partner sits at `first + j`. Shared by every device so that all of
/// them visit exactly the same index pairs.
pub const fn pair_first_index(pair: u32, j: u32) -> u32 {
    (pair / j) * (2 * j) + pair % j
}

/// Whether the pair starting at `first` sorts ascending in a pass of size `k`
pub const fn pair_is_ascending(first: u32, k: u32) -> bool {
    first & k == 0
}

/// Interleaved, padded (value, pixel index) pairs ready for the network
#[derive(Debug, Clone, PartialEq)]
pub struct SortBatch {
    keys: Vec<f32>,
    payload: Vec<u32>,
    channels: usize,
    len: usize,
    padded_len: usize,
}

impl SortBatch {
    /// Interleave equally long channels and pad them to a power of two
    ///
    /// # Errors
    ///
    /// Returns an error if no channel is given, the channels differ in
    /// length, or there are more elements than a `u32` index can address
    pub fn from_channels(channels: &[Vec<f32>]) -> Result<Self> {
        let channel_count = channels.len();
        let len = channels.first().map_or(0, Vec::len);
        if channel_count == 0 {
            return Err(invalid_geometry(
                "channels",
                &channel_count,
                &"at least one channel is required",
            ));
        }
        if let Some(bad) = channels.iter().find(|c| c.len() != len) {
            return Err(SynthesisError::LengthMismatch {
                expected: len,
                actual: bad.len(),
            });
        }
        if u32::try_from(len).is_err() {
            return Err(invalid_geometry(
                "pixel count",
                &len,
                &"exceeds the 32-bit pixel index range",
            ));
        }

        let padded_len = if len == 0 { 0 } else { len.next_power_of_two() };
        let mut keys = vec![PADDING_KEY; padded_len * channel_count];
        let mut payload = vec![0u32; padded_len * channel_count];

        for (c, channel) in channels.iter().enumerate() {
            for (i, &value) in channel.iter().enumerate() {
                let slot = i * channel_count + c;
                if let (Some(key), Some(index)) = (keys.get_mut(slot), payload.get_mut(slot)) {
                    *key = value;
                    *index = i as u32;
                }
            }
        }

        Ok(Self {
            keys,
            payload,
            channels: channel_count,
            len,
            padded_len,
        })
    }

    /// Number of interleaved channels
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Real (unpadded) element count per channel
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the batch holds no real elements
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element count per channel after padding
    pub const fn padded_len(&self) -> usize {
        self.padded_len
    }

    /// Interleaved keys including padding
    pub fn keys(&self) -> &[f32] {
        &self.keys
    }

    /// Interleaved pixel indices including padding
    pub fn payload(&self) -> &[u32] {
        &self.payload
    }

    /// Keys and payload for in-place sorting
    pub fn parts_mut(&mut self) -> (&mut [f32], &mut [u32]) {
        (&mut self.keys, &mut self.payload)
    }

    /// Passes required for this batch
    pub fn schedule(&self) -> Vec<BitonicPass> {
        bitonic_schedule(self.padded_len)
    }

    /// Swap in keys and payload read back from a device
    ///
    /// # Errors
    ///
    /// Returns an error if either vector has the wrong length
    pub fn replace(&mut self, keys: Vec<f32>, payload: Vec<u32>) -> Result<()> {
        let expected = self.keys.len();
        for actual in [keys.len(), payload.len()] {
            if actual != expected {
                return Err(SynthesisError::LengthMismatch { expected, actual });
            }
        }
        self.keys = keys;
        self.payload = payload;
        Ok(())
    }

    /// Split the sorted batch into one rank table per channel
    ///
    /// # Errors
    ///
    /// Returns an error if a padding sentinel sorted into the real ranks
    /// or any channel is out of order
    pub fn into_rank_tables(self) -> Result<Vec<RankTable>> {
        let mut tables: Vec<RankTable> = (0..self.channels)
            .map(|_| RankTable::with_capacity(self.len))
            .collect();

        let prefix = self.len * self.channels;
        let keys = self.keys.get(..prefix).unwrap_or_default();
        let payload = self.payload.get(..prefix).unwrap_or_default();
        for (slot, (&key, &index)) in keys.iter().zip(payload).enumerate() {
            if let Some(table) = tables.get_mut(slot % self.channels) {
                table.values.push(key);
                table.indices.push(index);
            }
        }

        for (channel, table) in tables.iter().enumerate() {
            if table.values.iter().any(|v| !v.is_finite()) {
                return Err(computation_error(
                    "rank sort",
                    &format!("channel {channel} has a padding sentinel among real ranks"),
                ));
            }
            if !table.values.is_sorted() {
                return Err(computation_error(
                    "rank sort",
                    &format!("channel {channel} is not in ascending order"),
                ));
            }
        }
        Ok(tables)
    }
}

/// Sorted values of one channel with the pixel each came from
///
/// Rank `r` holds the `r`-th smallest value; `indices[r]` is the pixel that
/// produced it. Ties are ordered arbitrarily.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankTable {
    values: Vec<f32>,
    indices: Vec<u32>,
}

impl RankTable {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Number of ranked samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-decreasing sample values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Pixel index for each rank
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// `(pixel index, value)` in rank order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `rank`, clamped into the table
    pub fn value_at(&self, rank: usize) -> Option<f32> {
        let last = self.values.len().checked_sub(1)?;
        self.values.get(rank.min(last)).copied()
    }
}

/// Rank samples of several channels with one bitonic network run
pub struct ParallelRankSort<'a, B: ComputeBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: ComputeBackend + ?Sized> ParallelRankSort<'a, B> {
    /// Sort on the given device
    pub const fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Sort each channel ascending, carrying the pixel index along
    ///
    /// Empty channels return empty tables without touching the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the channels are malformed or the device fails
    pub fn sort(&self, channels: &[Vec<f32>]) -> Result<Vec<RankTable>> {
        let mut batch = SortBatch::from_channels(channels)?;
        if batch.is_empty() {
            return Ok(vec![RankTable::default(); batch.channels()]);
        }

        tracing::debug!(
            backend = self.backend.name(),
            channels = batch.channels(),
            len = batch.len(),
            padded_len = batch.padded_len(),
            passes = batch.schedule().len(),
            "bitonic rank sort"
        );
        self.backend.bitonic_sort(&mut batch)?;
        batch.into_rank_tables()
    }
}
