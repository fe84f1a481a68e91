use super::CyCxHW;
use crate::common::*;

/// Axis-aligned affine transform: `y' = y * sy + ty`, `x' = x * sx + tx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num,
{
    /// Pure scaling about the origin.
    pub fn scaling(sy: T, sx: T) -> Self {
        Self {
            sy,
            sx,
            ty: T::zero(),
            tx: T::zero(),
        }
    }
}

impl<T> Mul<&CyCxHW<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = CyCxHW<T>;

    fn mul(self, rhs: &CyCxHW<T>) -> Self::Output {
        rhs.transform(self)
    }
}
