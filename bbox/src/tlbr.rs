use super::{CyCxHW, Rect};
use crate::common::*;

/// Bounding box stored as its top, left, bottom and right edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T> {
    /// Convert every edge with `f`.
    ///
    /// `f` must be monotonically non-decreasing, otherwise the edge order
    /// of the result is not guaranteed.
    pub fn map<U, F>(self, mut f: F) -> TLBR<U>
    where
        F: FnMut(T) -> U,
    {
        TLBR {
            t: f(self.t),
            l: f(self.l),
            b: f(self.b),
            r: f(self.r),
        }
    }
}

impl<T> TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Pull the bottom and right edges back to `b_max` and `r_max` when they
    /// exceed them. The top-left corner is kept.
    pub fn clamp_br(&self, b_max: T, r_max: T) -> Self {
        let b = if self.b > b_max { b_max } else { self.b };
        let r = if self.r > r_max { r_max } else { self.r };
        Self {
            t: self.t,
            l: self.l,
            b: if b < self.t { self.t } else { b },
            r: if r < self.l { self.l } else { r },
        }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> T {
        self.t
    }

    fn l(&self) -> T {
        self.l
    }

    fn b(&self) -> T {
        self.b
    }

    fn r(&self) -> T {
        self.r
    }

    fn cy(&self) -> T {
        let two = T::one() + T::one();
        self.t + self.h() / two
    }

    fn cx(&self) -> T {
        let two = T::one() + T::one();
        self.l + self.w() / two
    }

    fn h(&self) -> T {
        self.b - self.t
    }

    fn w(&self) -> T {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [T; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");
        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [T; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");
        Ok(Self {
            t,
            l,
            b: t + h,
            r: l + w,
        })
    }

    fn try_from_cycxhw(cycxhw: [T; 4]) -> Result<Self> {
        let [cy, cx, h, w] = cycxhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");

        let two = T::one() + T::one();
        Ok(Self {
            t: cy - h / two,
            l: cx - w / two,
            b: cy + h / two,
            r: cx + w / two,
        })
    }
}

impl<T> From<&CyCxHW<T>> for TLBR<T>
where
    T: Copy + Num,
{
    fn from(from: &CyCxHW<T>) -> Self {
        let two = T::one() + T::one();
        let CyCxHW { cy, cx, h, w } = *from;
        Self {
            t: cy - h / two,
            l: cx - w / two,
            b: cy + h / two,
            r: cx + w / two,
        }
    }
}

impl<T> From<CyCxHW<T>> for TLBR<T>
where
    T: Copy + Num,
{
    fn from(from: CyCxHW<T>) -> Self {
        Self::from(&from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn tlbr_rejects_inverted_edges() {
        assert!(TLBR::try_from_tlbr([10.0, 0.0, 5.0, 1.0]).is_err());
        assert!(TLBR::try_from_tlhw([0.0, 0.0, -1.0, 1.0]).is_err());
    }

    #[test]
    fn clamp_bottom_right_edges() {
        let nominal = TLBR::from_tlbr([640usize, 640, 1280, 1280]);
        let clamped = nominal.clamp_br(700, 1000);
        assert_eq!(clamped.tlbr(), [640, 640, 700, 1000]);

        let inside = TLBR::from_tlbr([0usize, 0, 640, 640]);
        assert_eq!(inside.clamp_br(700, 1000), inside);
    }

    #[test]
    fn map_edges() {
        let rect = TLBR::from_tlbr([1usize, 2, 3, 4]);
        let rect: TLBR<f64> = rect.map(|value| value as f64 * 0.5);
        assert_eq!(rect.tlbr(), [0.5, 1.0, 1.5, 2.0]);
    }
}
