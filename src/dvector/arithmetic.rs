use crate::error::{DemandError, Result};

use super::DVector;

/// Tagged cellwise operator for combining two demand vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    /// Division saturates to zero wherever the divisor cell is zero,
    /// whatever the numerator: a factor built against an empty base carries
    /// no demand. Sums over the result therefore stay finite.
    Div,
}

impl ArithmeticOp {
    /// Apply the operator to one pair of cells.
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithmeticOp::Add => lhs + rhs,
            ArithmeticOp::Sub => lhs - rhs,
            ArithmeticOp::Mul => lhs * rhs,
            ArithmeticOp::Div => {
                if rhs == 0.0 {
                    0.0
                } else {
                    lhs / rhs
                }
            }
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            ArithmeticOp::Add => '+',
            ArithmeticOp::Sub => '-',
            ArithmeticOp::Mul => '*',
            ArithmeticOp::Div => '/',
        }
    }
}

/// Which operand carries the finer segmentation, plus the projection of its
/// segments onto the coarser operand's.
enum Alignment {
    Same,
    LhsFiner(Vec<u32>),
    RhsFiner(Vec<u32>),
}

impl DVector {
    /// Combine two vectors cellwise.
    ///
    /// Both operands must live on the same zoning system. The result takes
    /// the finer operand's segmentation; the coarser operand's values are
    /// broadcast across every fine segment that projects onto them. If
    /// neither segmentation aggregates to the other the vectors cannot be
    /// combined.
    pub fn combine(&self, op: ArithmeticOp, other: &DVector) -> Result<DVector> {
        if self.zoning() != other.zoning() {
            return Err(DemandError::IncompatibleZoning {
                left: self.zoning().name().to_string(),
                right: other.zoning().name().to_string(),
            });
        }

        let alignment = self.resolve_alignment(other)?;

        tracing::debug!(
            op = %op.symbol(),
            lhs = self.segmentation().name(),
            rhs = other.segmentation().name(),
            "combining demand vectors"
        );

        let result = match alignment {
            Alignment::Same => {
                let mut data = self.data().clone();
                data.zip_mut_with(other.data(), |a, &b| *a = op.apply(*a, b));
                DVector::from_dense(self.zoning().clone(), self.segmentation().clone(), data)?
            }
            Alignment::LhsFiner(map) => {
                let mut data = self.data().clone();
                for (f, &c) in map.iter().enumerate() {
                    let mut column = data.column_mut(f);
                    let coarse = other.data().column(c as usize);
                    column.zip_mut_with(&coarse, |a, &b| *a = op.apply(*a, b));
                }
                DVector::from_dense(self.zoning().clone(), self.segmentation().clone(), data)?
            }
            Alignment::RhsFiner(map) => {
                let mut data = other.data().clone();
                for (f, &c) in map.iter().enumerate() {
                    let mut column = data.column_mut(f);
                    let coarse = self.data().column(c as usize);
                    column.zip_mut_with(&coarse, |a, &b| *a = op.apply(b, *a));
                }
                DVector::from_dense(self.zoning().clone(), other.segmentation().clone(), data)?
            }
        };

        Ok(result)
    }

    /// Named compatibility-resolution step: find the finer operand and the
    /// projection of its segments onto the coarser one.
    fn resolve_alignment(&self, other: &DVector) -> Result<Alignment> {
        if self.segmentation() == other.segmentation() {
            return Ok(Alignment::Same);
        }
        if let Some(map) = self.segmentation().projection_map(other.segmentation()) {
            return Ok(Alignment::LhsFiner(map));
        }
        if let Some(map) = other.segmentation().projection_map(self.segmentation()) {
            return Ok(Alignment::RhsFiner(map));
        }
        Err(DemandError::IncompatibleSegmentation {
            left: self.segmentation().name().to_string(),
            right: other.segmentation().name().to_string(),
        })
    }

    pub fn add(&self, other: &DVector) -> Result<DVector> {
        self.combine(ArithmeticOp::Add, other)
    }

    pub fn sub(&self, other: &DVector) -> Result<DVector> {
        self.combine(ArithmeticOp::Sub, other)
    }

    pub fn mul(&self, other: &DVector) -> Result<DVector> {
        self.combine(ArithmeticOp::Mul, other)
    }

    pub fn div(&self, other: &DVector) -> Result<DVector> {
        self.combine(ArithmeticOp::Div, other)
    }
}
