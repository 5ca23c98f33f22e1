//! Atlas page packing: consumes bitmaps into pages via MaxRects placement.

mod maxrects;

pub use maxrects::Rect;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bitmap::Bitmap;
use crate::config::Heuristic;
use maxrects::MaxRectsBin;

/// Placement of one bitmap within an atlas page.
///
/// `x`/`y` address the top-left of the bitmap's pixels (inside any stretch
/// halo). `dup_id` names the index of the bitmap whose placement this one
/// shares when duplicate coalescing matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
    pub dup_id: Option<usize>,
    /// True iff the bitmap was placed rotated 90° clockwise.
    pub rot: bool,
}

/// One atlas page. Owns the bitmaps placed on it; `points` is parallel to
/// `bitmaps`. A bitmap lands in exactly one packer (the first it fit into);
/// duplicates share pixels through `dup_id`.
pub struct Packer {
    /// Page extents; shrunk to the smallest power-of-two envelope after
    /// packing.
    pub width: u32,
    pub height: u32,
    pub pad: u32,
    pub stretch: u32,
    pub bitmaps: Vec<Bitmap>,
    pub points: Vec<Point>,
    dup_lookup: HashMap<u64, usize>,
}

impl Packer {
    pub fn new(width: u32, height: u32, pad: u32, stretch: u32) -> Self {
        Self {
            width,
            height,
            pad,
            stretch,
            bitmaps: Vec::new(),
            points: Vec::new(),
            dup_lookup: HashMap::new(),
        }
    }

    /// Greedily consumes bitmaps from the tail of `pending` until one does
    /// not fit; the leftovers are the next packer's input. Afterwards the
    /// page extents are halved down to the smallest power-of-two bound that
    /// still contains the packed content.
    pub fn pack(
        &mut self,
        pending: &mut Vec<Bitmap>,
        unique: bool,
        rotate: bool,
        heuristic: Heuristic,
    ) {
        let mut bin = MaxRectsBin::new(self.width + self.pad, self.height + self.pad, rotate, heuristic);
        let expand = self.pad + self.stretch * 2;
        let mut ww = 0u32;
        let mut hh = 0u32;

        loop {
            let (bw, bh, hash_value) = match pending.last() {
                Some(b) => {
                    trace!(remaining = pending.len(), name = %b.name, "placing bitmap");
                    (b.width, b.height, b.hash_value)
                }
                None => break,
            };

            if unique {
                if let Some(&at) = self.dup_lookup.get(&hash_value) {
                    let bitmap = pending.last().expect("checked non-empty");
                    if bitmap.equals(&self.bitmaps[at]) {
                        let mut point = self.points[at];
                        point.dup_id = Some(at);
                        self.points.push(point);
                        self.bitmaps.push(pending.pop().expect("checked non-empty"));
                        continue;
                    }
                }
            }

            let Some(rect) = bin.insert(bw + expand, bh + expand) else {
                break;
            };

            if unique {
                self.dup_lookup.insert(hash_value, self.points.len());
            }

            self.points.push(Point {
                x: rect.x + self.stretch,
                y: rect.y + self.stretch,
                dup_id: None,
                rot: rotate && bw != rect.w - expand,
            });
            ww = ww.max(rect.x + rect.w - self.pad);
            hh = hh.max(rect.y + rect.h - self.pad);
            self.bitmaps.push(pending.pop().expect("checked non-empty"));
        }

        // Tight bound is zero only when nothing was placed; the driver
        // reports that as a fatal error, so the shrink is skipped.
        if ww > 0 {
            while self.width / 2 >= ww {
                self.width /= 2;
            }
        }
        if hh > 0 {
            while self.height / 2 >= hh {
                self.height /= 2;
            }
        }
        debug!(
            placed = self.bitmaps.len(),
            width = self.width,
            height = self.height,
            "packed page"
        );
    }
}
