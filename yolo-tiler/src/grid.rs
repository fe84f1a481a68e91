//! Tile grid planning.

use crate::common::*;

/// The tile layout of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    image_size: HW<usize>,
    size: usize,
    rows: usize,
    cols: usize,
}

impl TileGrid {
    /// Plan the grid for an image.
    ///
    /// The grid has `ceil(h / size)` rows and `ceil(w / size)` columns. With
    /// `no_padding` the last row and the last column are dropped, even when
    /// the image extent is an exact multiple of `size`.
    pub fn plan(image_size: &HW<usize>, size: NonZeroUsize, no_padding: bool) -> Self {
        let size = size.get();
        let mut rows = image_size.h().div_ceil(size);
        let mut cols = image_size.w().div_ceil(size);

        if no_padding {
            rows = rows.saturating_sub(1);
            cols = cols.saturating_sub(1);
        }

        Self {
            image_size: *image_size,
            size,
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<Tile> {
        (row < self.rows && col < self.cols).then(|| self.make_tile(row, col))
    }

    /// Iterate over all tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        iproduct!(0..self.rows, 0..self.cols).map(move |(row, col)| self.make_tile(row, col))
    }

    fn make_tile(&self, row: usize, col: usize) -> Tile {
        let t = row * self.size;
        let l = col * self.size;
        let nominal = TLBR::from_tlbr([
            t,
            l,
            t.saturating_add(self.size),
            l.saturating_add(self.size),
        ]);
        let true_rect = nominal.clamp_br(self.image_size.h(), self.image_size.w());
        Tile {
            row,
            col,
            nominal,
            true_rect,
        }
    }
}

/// One cell of a [TileGrid].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub row: usize,
    pub col: usize,
    nominal: TLBR<usize>,
    true_rect: TLBR<usize>,
}

impl Tile {
    /// The full `size` by `size` rectangle at the tile's grid position.
    pub fn nominal(&self) -> &TLBR<usize> {
        &self.nominal
    }

    /// The true rectangle: the nominal one clamped to the image bounds. It is the
    /// region copied out of the image and tested against boxes.
    pub fn crop_rect(&self) -> &TLBR<usize> {
        &self.true_rect
    }

    /// Whether the tile reaches past the bottom or right image edge.
    pub fn is_partial(&self) -> bool {
        self.nominal != self.true_rect
    }
}
