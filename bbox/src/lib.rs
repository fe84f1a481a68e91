//! Axis-aligned bounding box types and rectangle arithmetic.

mod common;

pub use cycxhw::*;
pub mod cycxhw;

pub use hw::*;
pub mod hw;

pub use rect::*;
pub mod rect;

pub use tlbr::*;
pub mod tlbr;

pub use transform::*;
pub mod transform;

pub mod prelude {
    pub use crate::rect::{Rect, RectNum};
}
