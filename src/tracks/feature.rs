//! Per-observation feature data: image location and binary descriptor.

use std::sync::Arc;

use anyhow::{Context, Result};
use nalgebra::Vector2;

/// A detected image feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    /// Pixel location (x, y).
    pub location: Vector2<f64>,
    /// Detector response strength.
    pub magnitude: f64,
    /// Detection scale (pyramid scale factor).
    pub scale: f64,
    /// Orientation in radians.
    pub angle: f64,
}

impl Feature {
    /// Create a feature at the given location with unit scale and no orientation.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            location: Vector2::new(x, y),
            magnitude: 0.0,
            scale: 1.0,
            angle: 0.0,
        }
    }
}

impl Default for Feature {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// Binary feature descriptor (e.g. 32-byte ORB).
///
/// The bytes are reference counted so that active-track queries can hand out
/// descriptor vectors without copying the underlying data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor(Arc<[u8]>);

impl Descriptor {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hamming distance to another descriptor.
    ///
    /// Only the common prefix is compared when the lengths differ.
    pub fn distance(&self, other: &Descriptor) -> u32 {
        hamming_distance(&self.0, &other.0)
    }

    /// Lower-case hex encoding, two characters per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse a hex string produced by [`Descriptor::to_hex`]. Either case is
    /// accepted; surrounding whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text.trim()).context("Invalid descriptor hex")?;
        Ok(Self::new(bytes))
    }
}

/// Compute the Hamming distance between two binary descriptors.
/// Returns the number of differing bits over the common length.
pub fn hamming_distance(desc1: &[u8], desc2: &[u8]) -> u32 {
    desc1
        .iter()
        .zip(desc2.iter())
        .map(|(a, b)| (a ^ b).count_ones())
        .sum()
}
