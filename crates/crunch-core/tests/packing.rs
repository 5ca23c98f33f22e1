use crunch_core::{Bitmap, Heuristic, Packer, Point};
use image::{Rgba, RgbaImage};

fn bitmap(name: &str, w: u32, h: u32) -> Bitmap {
    Bitmap::from_rgba(name, RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255])), false, false)
}

/// Reserved rectangle for a placement, including the padding/stretch halo.
fn reserved(packer: &Packer, bitmap: &Bitmap, point: &Point) -> (u32, u32, u32, u32) {
    let e = packer.pad + 2 * packer.stretch;
    let (pw, ph) = if point.rot {
        (bitmap.height, bitmap.width)
    } else {
        (bitmap.width, bitmap.height)
    };
    (point.x - packer.stretch, point.y - packer.stretch, pw + e, ph + e)
}

fn disjoint(rects: &[(u32, u32, u32, u32)]) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let (ax, ay, aw, ah) = rects[i];
            let (bx, by, bw, bh) = rects[j];
            let overlap = !(ax >= bx + bw || bx >= ax + aw || ay >= by + bh || by >= ay + ah);
            if overlap {
                return false;
            }
        }
    }
    true
}

#[test]
fn placements_are_disjoint_and_contained() {
    let sizes = [
        (64, 64),
        (32, 64),
        (64, 32),
        (48, 48),
        (16, 80),
        (80, 16),
        (40, 40),
        (30, 50),
        (50, 30),
        (10, 10),
        (7, 13),
        (13, 7),
    ];
    let mut pending: Vec<Bitmap> = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| bitmap(&format!("r{i}"), w, h))
        .collect();

    let mut packer = Packer::new(256, 256, 2, 1);
    packer.pack(&mut pending, false, true, Heuristic::BestShortSideFit);
    assert!(pending.is_empty(), "everything should fit in one page");

    let rects: Vec<_> = packer
        .bitmaps
        .iter()
        .zip(&packer.points)
        .map(|(b, p)| reserved(&packer, b, p))
        .collect();
    assert!(disjoint(&rects));

    for (b, p) in packer.bitmaps.iter().zip(&packer.points) {
        let (pw, ph) = if p.rot { (b.height, b.width) } else { (b.width, b.height) };
        assert!(p.x + pw <= packer.width);
        assert!(p.y + ph <= packer.height);
    }
    assert!(packer.width.is_power_of_two());
    assert!(packer.height.is_power_of_two());
}

#[test]
fn pack_consumes_from_the_tail_and_leaves_the_rest() {
    let mut pending = vec![
        bitmap("a", 60, 60),
        bitmap("b", 60, 60),
        bitmap("c", 60, 60),
    ];
    let mut packer = Packer::new(64, 64, 1, 0);
    packer.pack(&mut pending, false, false, Heuristic::BestShortSideFit);

    // only the tail bitmap fits a 64x64 page
    assert_eq!(packer.bitmaps.len(), 1);
    assert_eq!(packer.bitmaps[0].name, "c");
    assert_eq!(pending.len(), 2);
    assert_eq!(pending.last().unwrap().name, "b");
}

#[test]
fn identical_runs_produce_identical_placements() {
    let build = || {
        let mut pending: Vec<Bitmap> = (0..20u32)
            .map(|i| bitmap(&format!("r{i}"), 5 + (i * 7) % 40, 5 + (i * 11) % 40))
            .collect();
        let mut packer = Packer::new(256, 256, 1, 0);
        packer.pack(&mut pending, false, true, Heuristic::BestAreaFit);
        packer.points.clone()
    };
    assert_eq!(build(), build());
}
