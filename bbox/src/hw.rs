use crate::{common::*, TLBR};

/// The height and width of an image or a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "height and width must be non-negative"
        );
        Ok(Self { h, w })
    }

    /// Panics if either extent is negative.
    pub fn from_hw(hw: [T; 2]) -> Self {
        match Self::try_from_hw(hw) {
            Ok(size) => size,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    /// The rectangle spanning this size with its top-left corner at the origin.
    pub fn to_rect(&self) -> TLBR<T> {
        let zero = T::zero();
        TLBR {
            t: zero,
            l: zero,
            b: self.h,
            r: self.w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn negative_size_is_rejected() {
        assert!(HW::try_from_hw([-1.0, 2.0]).is_err());
        assert!(HW::try_from_hw([0.0, 2.0]).is_ok());
    }

    #[test]
    fn size_to_rect() {
        let size = HW::from_hw([700usize, 1000]);
        assert_eq!(size.to_rect().tlbr(), [0, 0, 700, 1000]);
        assert_eq!((size.h(), size.w()), (700, 1000));
    }
}
