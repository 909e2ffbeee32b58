use crate::config::CameraOptions;
use crate::layout::{Bounds, TreeLayout};
use crate::types::{CameraTransform, Margin, PositionedNode, Viewport};

/// Transform that puts layout point `(x, y)` at the viewport centre, nudged by
/// `offset` expressed as fractions of the viewport size.
pub fn center_on(
    x: f64,
    y: f64,
    margin: Margin,
    scale: f64,
    viewport: Viewport,
    offset: (f64, f64),
) -> CameraTransform {
    CameraTransform {
        translate_x: viewport.width / 2.0 - (x + margin.left) * scale + offset.0 * viewport.width,
        translate_y: viewport.height / 2.0 - (y + margin.top) * scale + offset.1 * viewport.height,
        scale,
    }
}

/// Scale and translation that fit `bounds` inside the viewport. Extents
/// narrower than the fit padding are widened to it so a single node still
/// yields a finite scale.
pub fn fit_bounds(bounds: &Bounds, margin: Margin, options: &CameraOptions) -> CameraTransform {
    let padding = options.fit_padding.max(1.0);
    let extent_w = bounds.width().max(padding) + padding * 2.0;
    let extent_h = bounds.height().max(padding) + padding * 2.0;
    let scale = (options.viewport.width / extent_w)
        .min(options.viewport.height / extent_h)
        .clamp(options.min_scale, options.max_scale);
    let (cx, cy) = bounds.center();
    center_on(cx, cy, margin, scale, options.viewport, (0.0, 0.0))
}

/// The node at `path`, or the root when the path is absent from the layout.
pub fn anchor<'a>(layout: &'a TreeLayout, path: &str) -> Option<&'a PositionedNode> {
    layout.get(path).or_else(|| layout.root())
}

pub fn player_transform(layout: &TreeLayout, path: &str, options: &CameraOptions) -> CameraTransform {
    match anchor(layout, path) {
        Some(node) => center_on(
            node.x,
            node.y,
            layout.margin,
            options.player_scale,
            options.viewport,
            options.player_offset,
        ),
        None => CameraTransform::IDENTITY,
    }
}

pub fn focus_transform(
    layout: &TreeLayout,
    path: &str,
    scale: f64,
    options: &CameraOptions,
) -> CameraTransform {
    match anchor(layout, path) {
        Some(node) => center_on(
            node.x,
            node.y,
            layout.margin,
            scale,
            options.viewport,
            (0.0, 0.0),
        ),
        None => CameraTransform::IDENTITY,
    }
}

pub fn fit_tree(layout: &TreeLayout, options: &CameraOptions) -> CameraTransform {
    match layout.bounds() {
        Some(bounds) => fit_bounds(&bounds, layout.margin, options),
        None => CameraTransform::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::layout::layout;
    use crate::tree::fixtures::{dir, sample_tree};

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 600.0,
        }
    }

    #[test]
    fn center_on_maps_node_to_viewport_center() {
        let margin = Margin::uniform(10.0);
        let transform = center_on(100.0, 50.0, margin, 2.0, viewport(), (0.0, 0.0));
        let screen_x = (100.0 + margin.left) * transform.scale + transform.translate_x;
        let screen_y = (50.0 + margin.top) * transform.scale + transform.translate_y;
        assert!((screen_x - 500.0).abs() < 1e-9);
        assert!((screen_y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn offset_shifts_by_viewport_fraction() {
        let base = center_on(0.0, 0.0, Margin::default(), 1.0, viewport(), (0.0, 0.0));
        let nudged = center_on(0.0, 0.0, Margin::default(), 1.0, viewport(), (0.1, -0.2));
        assert!((nudged.translate_x - base.translate_x - 100.0).abs() < 1e-9);
        assert!((nudged.translate_y - base.translate_y + 120.0).abs() < 1e-9);
    }

    #[test]
    fn fitting_a_single_node_stays_finite() {
        let single = layout(&dir("/", vec![]), &LayoutOptions::default());
        let transform = fit_tree(&single, &CameraOptions::default());
        assert!(transform.scale.is_finite());
        assert!(transform.translate_x.is_finite());
        assert!(transform.translate_y.is_finite());
        let options = CameraOptions::default();
        assert!(transform.scale <= options.max_scale);
    }

    #[test]
    fn fit_keeps_every_node_on_screen() {
        let options = CameraOptions::default();
        let tree_layout = layout(&sample_tree(), &LayoutOptions::default());
        let transform = fit_tree(&tree_layout, &options);
        for node in &tree_layout.nodes {
            let sx = (node.x + tree_layout.margin.left) * transform.scale + transform.translate_x;
            let sy = (node.y + tree_layout.margin.top) * transform.scale + transform.translate_y;
            assert!(sx >= 0.0 && sx <= options.viewport.width, "{} off x", node.node.path);
            assert!(sy >= 0.0 && sy <= options.viewport.height, "{} off y", node.node.path);
        }
    }

    #[test]
    fn missing_anchor_falls_back_to_root() {
        let options = CameraOptions::default();
        let tree_layout = layout(&sample_tree(), &LayoutOptions::default());
        assert_eq!(
            player_transform(&tree_layout, "/gone", &options),
            player_transform(&tree_layout, "/", &options)
        );
        assert_eq!(
            player_transform(&TreeLayout::default(), "/", &options),
            CameraTransform::IDENTITY
        );
    }
}
