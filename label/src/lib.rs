//! Class-tagged bounding boxes and the YOLO label file format.

use bbox::{CyCxHW, Rect, Transform};
use num_traits::Num;
use std::ops::Mul;

pub use unit::*;
pub mod unit;

pub use yolo::*;
pub mod yolo;

/// A rectangle tagged with its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<'a, T, C> Mul<&'a Label<CyCxHW<T>, C>> for &'a Transform<T>
where
    T: Copy + Num + PartialOrd,
    C: Copy,
{
    type Output = Label<CyCxHW<T>, C>;

    fn mul(self, rhs: &'a Label<CyCxHW<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class,
        }
    }
}
