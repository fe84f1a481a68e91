use super::TLBR;
use crate::common::*;

/// Read access to an axis-aligned rectangle, whatever its storage layout.
///
/// The y axis grows downwards, so `t <= b` and `l <= r` for every valid
/// rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_cycxhw(cycxhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

/// Operations available on rectangles over any ordered numeric type,
/// including pixel indices.
pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd + Copy,
{
    /// Panics if `b < t` or `r < l`.
    fn from_tlbr(tlbr: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        match Self::try_from_tlbr(tlbr) {
            Ok(rect) => rect,
            Err(err) => panic!("{}", err),
        }
    }

    /// Panics if `h` or `w` is negative.
    fn from_cycxhw(cycxhw: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        match Self::try_from_cycxhw(cycxhw) {
            Ok(rect) => rect,
            Err(err) => panic!("{}", err),
        }
    }

    fn tlbr(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.b(), self.r()]
    }

    fn area(&self) -> Self::Type {
        self.h() * self.w()
    }

    /// Whether `other` lies entirely inside `self`. Shared edges count as inside.
    fn contains_rect<R>(&self, other: &R) -> bool
    where
        R: Rect<Type = Self::Type>,
    {
        self.t() <= other.t() && self.l() <= other.l() && other.b() <= self.b() && other.r() <= self.r()
    }

    /// The overlapping region of two rectangles.
    ///
    /// Returns `None` unless the overlap has a positive area. Rectangles
    /// that only share an edge or a corner do not intersect.
    fn intersect_with<R>(&self, other: &R) -> Option<TLBR<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let t = partial_max(self.t(), other.t());
        let l = partial_max(self.l(), other.l());
        let b = partial_min(self.b(), other.b());
        let r = partial_min(self.r(), other.r());
        (b > t && r > l).then(|| TLBR { t, l, b, r })
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd + Copy,
{
}

fn partial_max<T: PartialOrd>(lhs: T, rhs: T) -> T {
    if rhs > lhs {
        rhs
    } else {
        lhs
    }
}

fn partial_min<T: PartialOrd>(lhs: T, rhs: T) -> T {
    if rhs < lhs {
        rhs
    } else {
        lhs
    }
}
