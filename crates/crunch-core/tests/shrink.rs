use crunch_core::{Bitmap, Heuristic, Packer};
use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};

fn bitmap(name: &str, w: u32, h: u32) -> Bitmap {
    Bitmap::from_rgba(name, RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])), false, false)
}

/// A single 10x20 sprite with 1px padding needs 11x21, so the page lands on
/// the 16x32 power-of-two envelope.
#[test]
fn single_sprite_shrinks_to_the_pow2_envelope() {
    let mut pending = vec![bitmap("sprite", 10, 20)];
    let mut packer = Packer::new(64, 64, 1, 0);
    packer.pack(&mut pending, false, false, Heuristic::BestShortSideFit);

    assert_eq!((packer.points[0].x, packer.points[0].y), (0, 0));
    assert_eq!((packer.width, packer.height), (16, 32));
}

#[test]
fn page_never_shrinks_below_its_content() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for round in 0..20 {
        let count = rng.gen_range(1..=24);
        let mut pending: Vec<Bitmap> = (0..count)
            .map(|i| {
                bitmap(
                    &format!("r{round}_{i}"),
                    rng.gen_range(1..=60),
                    rng.gen_range(1..=60),
                )
            })
            .collect();
        let mut packer = Packer::new(512, 512, 1, 0);
        packer.pack(&mut pending, false, true, Heuristic::BestShortSideFit);
        assert!(pending.is_empty());

        // tight bound over the placed content (image + right/bottom pad
        // already excluded by the shrink pass)
        let mut ww = 0;
        let mut hh = 0;
        for (b, p) in packer.bitmaps.iter().zip(&packer.points) {
            let (pw, ph) = if p.rot { (b.height, b.width) } else { (b.width, b.height) };
            ww = ww.max(p.x + pw);
            hh = hh.max(p.y + ph);
        }
        assert!(packer.width.is_power_of_two());
        assert!(packer.height.is_power_of_two());
        assert!(packer.width >= ww);
        assert!(packer.height >= hh);
        // smallest such envelope
        assert!(packer.width / 2 < ww);
        assert!(packer.height / 2 < hh);
    }
}

#[test]
fn page_at_capacity_keeps_the_full_extent() {
    let mut pending = vec![bitmap("big", 500, 260)];
    let mut packer = Packer::new(512, 512, 1, 0);
    packer.pack(&mut pending, false, false, Heuristic::BestShortSideFit);
    assert_eq!(packer.width, 512);
    assert_eq!(packer.height, 512);
}
