//! # Signature Overlay
//!
//! A signature is an uploaded image floating over the last page, positioned
//! freely by dragging but kept within reach of the "Prepared by:" entry it
//! signs. Only one signature may exist at a time.
//!
//! Coordinates are unscaled page pixels. Pointer events arrive in screen
//! pixels of a page that may be zoomed, so drag deltas are divided by the
//! zoom scale before they move anything.

use serde::{Deserialize, Serialize};

use crate::config::SignatureConfig;
use crate::error::PagewrightError;
use crate::image_loader::{self, LoadedImage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The rectangle grown by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            top: self.top - margin,
            left: self.left - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

pub type SignatureId = u64;

/// A placed signature image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: SignatureId,
    pub image_data_uri: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Signature {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.y, self.x, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Placed(SignatureId),
    /// A signature already exists; nothing changed.
    Rejected,
}

/// An in-progress drag. Existing at all means the move/up listeners are
/// attached.
#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    pointer_start: Point,
    origin: Point,
    scale: f64,
}

/// Clamp a `w × h` box at `p` so it stays inside `bounds`. When the box is
/// larger than `bounds` it is pinned to the top-left corner.
pub fn clamp_to(p: Point, w: f64, h: f64, bounds: &Rect) -> Point {
    let max_x = (bounds.right() - w).max(bounds.left);
    let max_y = (bounds.bottom() - h).max(bounds.top);
    Point {
        x: p.x.clamp(bounds.left, max_x),
        y: p.y.clamp(bounds.top, max_y),
    }
}

#[derive(Debug)]
pub struct SignatureLayer {
    signature: Option<Signature>,
    drag: Option<DragSession>,
    next_id: SignatureId,
    clamp_margin: f64,
    display_width: f64,
}

impl SignatureLayer {
    pub fn new(config: &SignatureConfig) -> Self {
        Self {
            signature: None,
            drag: None,
            next_id: 1,
            clamp_margin: config.clamp_margin,
            display_width: config.display_width,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn signatures(&self) -> Vec<Signature> {
        self.signature.iter().cloned().collect()
    }

    /// Place `image` at `at`, clamped to `region`. Rejected when a signature
    /// already exists.
    pub fn place(&mut self, image: &LoadedImage, at: Point, region: &Rect) -> Placement {
        if self.signature.is_some() {
            log::warn!("a signature is already placed; remove it before adding another");
            return Placement::Rejected;
        }
        let (width, height) = image.scaled_to_width(self.display_width);
        let bounds = region.expand(self.clamp_margin);
        let pos = clamp_to(at, width, height, &bounds);
        let id = self.next_id;
        self.next_id += 1;
        self.signature = Some(Signature {
            id,
            image_data_uri: image.data_uri.clone(),
            x: pos.x,
            y: pos.y,
            width,
            height,
        });
        Placement::Placed(id)
    }

    /// Load an uploaded data URI and place it. Checks for an existing
    /// signature before decoding anything.
    pub fn place_data_uri(&mut self, src: &str, at: Point, region: &Rect) -> Result<Placement, PagewrightError> {
        if self.signature.is_some() {
            log::warn!("a signature is already placed; remove it before adding another");
            return Ok(Placement::Rejected);
        }
        let image = image_loader::load_image(src)?;
        Ok(self.place(&image, at, region))
    }

    /// Restore a signature saved with a draft, clamped to `region` as it is
    /// laid out now.
    pub fn restore(&mut self, mut signature: Signature, region: &Rect) -> Placement {
        if self.signature.is_some() {
            return Placement::Rejected;
        }
        let pos = clamp_to(
            Point::new(signature.x, signature.y),
            signature.width,
            signature.height,
            &region.expand(self.clamp_margin),
        );
        signature.x = pos.x;
        signature.y = pos.y;
        self.next_id = self.next_id.max(signature.id + 1);
        let id = signature.id;
        self.signature = Some(signature);
        Placement::Placed(id)
    }

    pub fn remove(&mut self) -> Option<Signature> {
        self.drag = None;
        self.signature.take()
    }

    /// Pointer-down over the signature. `pointer` is in screen pixels,
    /// `scale` the current zoom factor.
    pub fn begin_drag(&mut self, pointer: Point, scale: f64) -> bool {
        let Some(sig) = &self.signature else {
            return false;
        };
        self.drag = Some(DragSession {
            pointer_start: pointer,
            origin: Point::new(sig.x, sig.y),
            scale: if scale > 0.0 { scale } else { 1.0 },
        });
        true
    }

    /// Pointer-move during a drag. Returns the new position, or `None` when
    /// no drag is in progress.
    pub fn drag_to(&mut self, pointer: Point, region: &Rect) -> Option<Point> {
        let drag = self.drag.as_ref()?;
        let sig = self.signature.as_mut()?;
        let target = Point {
            x: drag.origin.x + (pointer.x - drag.pointer_start.x) / drag.scale,
            y: drag.origin.y + (pointer.y - drag.pointer_start.y) / drag.scale,
        };
        let pos = clamp_to(target, sig.width, sig.height, &region.expand(self.clamp_margin));
        sig.x = pos.x;
        sig.y = pos.y;
        Some(pos)
    }

    /// Pointer-up. Always ends the drag, whatever state it was in.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::tests::png_base64;

    fn layer() -> SignatureLayer {
        SignatureLayer::new(&SignatureConfig::default())
    }

    fn image(w: u32, h: u32) -> LoadedImage {
        image_loader::load_image(&png_base64(w, h)).unwrap()
    }

    #[test]
    fn drag_is_clamped_to_the_region() {
        let region = Rect::new(100.0, 50.0, 300.0, 80.0);
        let mut layer = layer();
        layer.place(&image(300, 100), Point::new(60.0, 110.0), &region);
        assert!(layer.begin_drag(Point::new(0.0, 0.0), 1.0));
        let pos = layer.drag_to(Point::new(1000.0, 1000.0), &region).unwrap();
        let sig = layer.signature().unwrap();
        assert_eq!(pos, Point::new(sig.x, sig.y));
        assert!(region.expand(10.0).encloses(&sig.bounds()));
        // pinned to the bottom-right of the expanded region
        assert!((sig.x - (360.0 - 150.0)).abs() < 1e-9);
        assert!((sig.y - (190.0 - 50.0)).abs() < 1e-9);
    }

    #[test]
    fn deltas_are_divided_by_zoom() {
        let region = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let mut layer = layer();
        layer.place(&image(150, 50), Point::new(100.0, 100.0), &region);
        layer.begin_drag(Point::new(500.0, 500.0), 2.0);
        let pos = layer.drag_to(Point::new(600.0, 540.0), &region).unwrap();
        assert_eq!(pos, Point::new(150.0, 120.0));
    }

    #[test]
    fn second_signature_is_rejected_without_changes() {
        let region = Rect::new(0.0, 0.0, 400.0, 200.0);
        let mut layer = layer();
        assert_eq!(layer.place(&image(10, 10), Point::new(5.0, 5.0), &region), Placement::Placed(1));
        let before = layer.signature().cloned();
        assert_eq!(layer.place(&image(20, 20), Point::new(50.0, 50.0), &region), Placement::Rejected);
        assert_eq!(layer.signature().cloned(), before);
        assert_eq!(layer.signatures().len(), 1);
    }

    #[test]
    fn removing_allows_a_new_signature() {
        let region = Rect::new(0.0, 0.0, 400.0, 200.0);
        let mut layer = layer();
        layer.place(&image(10, 10), Point::default(), &region);
        assert!(layer.remove().is_some());
        assert_eq!(layer.place(&image(10, 10), Point::default(), &region), Placement::Placed(2));
    }

    #[test]
    fn pointer_up_always_detaches() {
        let region = Rect::new(0.0, 0.0, 400.0, 200.0);
        let mut layer = layer();
        layer.end_drag();
        assert!(!layer.is_dragging());
        assert!(!layer.begin_drag(Point::default(), 1.0));
        layer.place(&image(10, 10), Point::default(), &region);
        layer.begin_drag(Point::default(), 1.0);
        assert!(layer.is_dragging());
        layer.end_drag();
        assert!(!layer.is_dragging());
        assert!(layer.drag_to(Point::new(5.0, 5.0), &region).is_none());
    }

    #[test]
    fn oversized_signature_pins_to_corner() {
        let bounds = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(clamp_to(Point::new(30.0, 30.0), 100.0, 100.0, &bounds), Point::new(0.0, 0.0));
    }
}
