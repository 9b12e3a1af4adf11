use std::fmt;

use smallvec::SmallVec;

/// One valid combination of dimension values within a segmentation level.
///
/// Values are small integer codes (e.g. purpose 1..8, mode 1..6), stored in
/// the defining-column order of the owning [`SegmentationLevel`]. Most
/// segmentations have four or fewer dimensions, so the values live inline.
///
/// [`SegmentationLevel`]: crate::SegmentationLevel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment(SmallVec<[u16; 4]>);

impl Segment {
    pub fn new(values: &[u16]) -> Self {
        Self(SmallVec::from_slice(values))
    }

    #[inline]
    pub fn values(&self) -> &[u16] {
        &self.0
    }

    /// Number of dimensions in this segment.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u16]> for Segment {
    fn from(values: &[u16]) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[u16; N]> for Segment {
    fn from(values: [u16; N]) -> Self {
        Self(SmallVec::from_slice(&values))
    }
}

impl FromIterator<u16> for Segment {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Segment {
    /// Underscore-joined value codes, e.g. `1_2_3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "_")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
