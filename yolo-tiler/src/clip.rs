//! Clipping of image boxes against tiles.

use crate::{common::*, grid::Tile};

/// Compute the tile-local labels of a tile.
///
/// A box contributes to the tile only if its overlap with the tile's true
/// rectangle has positive area. The overlap is expressed relative to the
/// nominal rectangle, so coordinates are fractions of the slice size even on
/// border tiles. Classes are carried over and input order is kept.
pub fn clip_labels(tile: &Tile, labels: &[PixelLabel]) -> Vec<RatioLabel> {
    let to_r64 = |value: usize| r64(value as f64);
    let true_rect = tile.crop_rect().map(to_r64);
    let size = to_r64(tile.nominal().h());
    let top = to_r64(tile.nominal().t());
    let left = to_r64(tile.nominal().l());

    labels
        .iter()
        .filter_map(|label| {
            let overlap = label.rect.intersect_with(&true_rect)?;

            // offsets are taken before dividing by the slice size
            let t = (overlap.t() - top) / size;
            let l = (overlap.l() - left) / size;
            let h = (overlap.b() - overlap.t()) / size;
            let w = (overlap.r() - overlap.l()) / size;
            let two = r64(2.0);
            let rect = CyCxHW::from_cycxhw([t + h / two, l + w / two, h, w]);

            Some(RatioLabel::new(label.class, rect))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;
    use approx::assert_abs_diff_eq;

    fn pixel_label(class: usize, tlbr: [f64; 4]) -> PixelLabel {
        let [t, l, b, r] = tlbr;
        Pixel(Label {
            rect: TLBR::from_tlbr([r64(t), r64(l), r64(b), r64(r)]),
            class,
        })
    }

    fn grid(h: usize, w: usize) -> TileGrid {
        TileGrid::plan(&HW::from_hw([h, w]), NonZeroUsize::new(640).unwrap(), false)
    }

    fn clip_all(grid: &TileGrid, labels: &[PixelLabel]) -> Vec<((usize, usize), RatioLabel)> {
        grid.tiles()
            .flat_map(|tile| {
                clip_labels(&tile, labels)
                    .into_iter()
                    .map(move |label| ((tile.row, tile.col), label))
            })
            .collect()
    }

    #[test]
    fn box_inside_first_tile() {
        let grid = grid(1280, 1280);
        let labels = [pixel_label(2, [100.0, 100.0, 200.0, 200.0])];
        let clipped = clip_all(&grid, &labels);

        assert_eq!(clipped.len(), 1);
        let ((row, col), label) = &clipped[0];
        assert_eq!((*row, *col), (0, 0));
        assert_eq!(label.to_string(), "2 0.234375 0.234375 0.156250 0.156250");
    }

    #[test]
    fn box_across_tile_boundary_is_split() {
        let grid = grid(1280, 1280);
        let labels = [pixel_label(5, [100.0, 600.0, 200.0, 700.0])];
        let clipped = clip_all(&grid, &labels);

        assert_eq!(clipped.len(), 2);

        let ((row, col), left) = &clipped[0];
        assert_eq!((*row, *col), (0, 0));
        assert_eq!(left.class, 5);
        assert_abs_diff_eq!(left.rect.cx().raw(), 620.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.rect.w().raw(), 40.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.rect.cy().raw(), 150.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.rect.h().raw(), 100.0 / 640.0, epsilon = 1e-12);

        let ((row, col), right) = &clipped[1];
        assert_eq!((*row, *col), (0, 1));
        assert_abs_diff_eq!(right.rect.cx().raw(), 30.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right.rect.w().raw(), 60.0 / 640.0, epsilon = 1e-12);
    }

    #[test]
    fn contained_box_round_trips_to_pixels() {
        let grid = grid(1280, 1920);
        let tile = grid.tile(1, 2).unwrap();
        let labels = [pixel_label(0, [700.0, 1300.0, 760.0, 1400.0])];

        let clipped = clip_labels(&tile, &labels);
        assert_eq!(clipped.len(), 1);

        let rect = &clipped[0].rect;
        let to_pixel = |ratio: R64, origin: usize| ratio.raw() * 640.0 + origin as f64;
        assert_abs_diff_eq!(to_pixel(rect.t(), 640), 700.0, epsilon = 1e-9);
        assert_abs_diff_eq!(to_pixel(rect.l(), 1280), 1300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(to_pixel(rect.b(), 640), 760.0, epsilon = 1e-9);
        assert_abs_diff_eq!(to_pixel(rect.r(), 1280), 1400.0, epsilon = 1e-9);

        assert!(grid
            .tiles()
            .filter(|other| other != &tile)
            .all(|other| clip_labels(&other, &labels).is_empty()));
    }

    #[test]
    fn box_touching_tile_edge_is_ignored() {
        let grid = grid(1280, 1280);
        let labels = [pixel_label(1, [100.0, 540.0, 200.0, 640.0])];
        let clipped = clip_all(&grid, &labels);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].0, (0, 0));
    }

    #[test]
    fn border_tile_is_normalized_by_slice_size() {
        let grid = grid(700, 1000);
        let tile = grid.tile(1, 1).unwrap();
        let labels = [pixel_label(3, [650.0, 900.0, 690.0, 980.0])];

        let clipped = clip_labels(&tile, &labels);
        assert_eq!(clipped.len(), 1);
        let rect = &clipped[0].rect;
        assert_abs_diff_eq!(rect.cy().raw(), 30.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.cx().raw(), 300.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.h().raw(), 40.0 / 640.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.w().raw(), 80.0 / 640.0, epsilon = 1e-12);
    }

    #[test]
    fn one_pixel_box_rounds_like_direct_division() {
        let grid = grid(1280, 1280);
        let tile = grid.tile(1, 1).unwrap();
        let labels = [pixel_label(0, [641.0, 641.0, 642.0, 642.0])];

        let clipped = clip_labels(&tile, &labels);
        assert_eq!(clipped.len(), 1);
        let rect = &clipped[0].rect;
        assert_eq!(format!("{:.6}", rect.w().raw()), "0.001563");
        assert_eq!(format!("{:.6}", rect.h().raw()), "0.001563");
        assert_eq!(rect.w().raw(), 1.0 / 640.0);
        assert_eq!(rect.cx().raw(), 1.0 / 640.0 + 1.0 / 640.0 / 2.0);
    }

    #[test]
    fn keep_input_order_and_classes() {
        let grid = grid(640, 640);
        let tile = grid.tile(0, 0).unwrap();
        let labels = [
            pixel_label(7, [10.0, 10.0, 20.0, 20.0]),
            pixel_label(1, [700.0, 700.0, 710.0, 710.0]),
            pixel_label(3, [30.0, 30.0, 40.0, 40.0]),
        ];
        let classes: Vec<_> = clip_labels(&tile, &labels)
            .iter()
            .map(|label| label.class)
            .collect();
        assert_eq!(classes, vec![7, 3]);
    }
}
