//! Aspect-fit placement of an image inside the viewport.

use crate::surface::{LayoutRect, Viewport};

/// Scale `(image_width, image_height)` to fit the viewport, preserving aspect
/// ratio and centering on the axis with slack.
///
/// Returns `None` when either size has a zero dimension; the caller decides
/// how to show the image unscaled.
pub fn aspect_fit(image_width: u32, image_height: u32, viewport: Viewport) -> Option<LayoutRect> {
    if image_width == 0 || image_height == 0 || viewport.width == 0 || viewport.height == 0 {
        return None;
    }

    let image_aspect = f64::from(image_width) / f64::from(image_height);
    let window_aspect = f64::from(viewport.width) / f64::from(viewport.height);
    let (w, h) = (f64::from(viewport.width), f64::from(viewport.height));

    let rect = if image_aspect > window_aspect {
        // Wider than the screen: full width, letterboxed.
        let height = (w / image_aspect).round();
        LayoutRect {
            left: 0,
            top: ((h - height) / 2.0).round() as u32,
            width: viewport.width,
            height: height as u32,
        }
    } else {
        // Taller than the screen: full height, pillarboxed.
        let width = (h * image_aspect).round();
        LayoutRect {
            left: ((w - width) / 2.0).round() as u32,
            top: 0,
            width: width as u32,
            height: viewport.height,
        }
    };
    Some(rect)
}

/// The whole viewport, used when no aspect-fit placement can be computed.
pub fn full_viewport(viewport: Viewport) -> LayoutRect {
    LayoutRect {
        left: 0,
        top: 0,
        width: viewport.width,
        height: viewport.height,
    }
}
