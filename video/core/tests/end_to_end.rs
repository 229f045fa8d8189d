//! Whole frames through the software coprocessor and a virtual display.

use cosmo_rcp::{DisplayUnit, DmaArena, FramebufferInfo, SoftRcp, VecRdram, VirtualDisplay};
use cosmo_video::palette::lit_color;
use cosmo_video::{Fade, NoopTicker, RdpBackend, Rgb, SubmitPolicy, VideoConfig, VideoContext};

const RDRAM: u32 = 0x40_0000;

type Ctx = VideoContext<RdpBackend<SoftRcp>, VirtualDisplay>;

fn setup(config: VideoConfig) -> Ctx {
    let mut arena = DmaArena::new(0, RDRAM);
    let display = VirtualDisplay::new(&mut arena, 2, config.display_width, config.display_height)
        .unwrap()
        .with_auto_vblank(true);
    let backend = RdpBackend::from_config(SoftRcp::new(VecRdram::new(RDRAM)), &config);
    VideoContext::init(&config, backend, display, &mut arena).unwrap()
}

fn frame(ctx: &Ctx, info: FramebufferInfo) -> Vec<u16> {
    let bytes = ctx.backend().coprocessor().rdram().slice(info.region).unwrap();
    bytes.chunks(2).map(|b| u16::from_be_bytes([b[0], b[1]])).collect()
}

fn game_row_for(y: usize) -> usize {
    let (band, within) = (y / 6, y % 6);
    band * 5 + within.saturating_sub(1)
}

#[test]
fn game_surface_is_stretched_to_240_lines() {
    let mut ctx = setup(VideoConfig::default());
    for (y, row) in ctx.game_surface_mut().rows_mut().enumerate() {
        for (x, p) in row.iter_mut().enumerate() {
            *p = ((x + y) % 16) as u8;
        }
    }

    let info = ctx.update().unwrap();
    let fb = frame(&ctx, info);
    assert_eq!(fb.len(), 320 * 240);

    for y in 0..240 {
        let src_y = game_row_for(y);
        for x in 0..320 {
            let expect = lit_color((x + src_y) % 16).to_native();
            assert_eq!(fb[y * 320 + x], expect, "display ({}, {}) from source row {}", x, y, src_y);
        }
    }
    assert_eq!(ctx.backend().coprocessor().rdp().pixels_written(), 320 * 240);
}

#[test]
fn text_surface_is_scaled_through_its_own_palette_slot() {
    let mut ctx = setup(VideoConfig::default());
    let reversed: Vec<Rgb> = (0..16).map(|i| lit_color(15 - i)).collect();
    ctx.text_surface_mut().palette_mut().set_colors(0, &reversed).unwrap();
    for (y, row) in ctx.text_surface_mut().rows_mut().enumerate() {
        for (x, p) in row.iter_mut().enumerate() {
            *p = ((x / 2 + y) % 16) as u8;
        }
    }

    ctx.set_text_mode();
    let info = ctx.update().unwrap();
    let fb = frame(&ctx, info);

    for y in 0..240 {
        let src_y = (y / 3) * 5 + [0, 1, 3][y % 3];
        for x in 0..320 {
            let index = (x + src_y) % 16;
            assert_eq!(fb[y * 320 + x], reversed[index].to_native(), "display ({}, {})", x, y);
        }
    }

    // the game palette is still intact in its own slot
    let tmem = ctx.backend().coprocessor().rdp().tmem();
    for i in 0..16u8 {
        assert_eq!(tmem.tlut_entry(i), lit_color(i as usize).to_native());
        assert_eq!(tmem.tlut_entry(16 + i), reversed[i as usize].to_native());
    }
}

#[test]
fn fade_in_lights_one_entry_per_frame() {
    let mut ctx = setup(VideoConfig::default());
    for i in 0..16 {
        ctx.update_palette(i, Rgb::BLACK).unwrap();
    }
    // sixteen vertical stripes, one per palette entry
    for row in ctx.game_surface_mut().rows_mut() {
        for (x, p) in row.iter_mut().enumerate() {
            *p = (x / 20) as u8;
        }
    }

    let mut frames = Vec::new();
    ctx.fade_with(Fade::InFromBlack, 3, &mut NoopTicker, |ctx, info| frames.push(frame(ctx, info)))
        .unwrap();

    assert_eq!(frames.len(), 16);
    for (step, fb) in frames.iter().enumerate() {
        for entry in 0..16 {
            let expect = if entry <= step { lit_color(entry) } else { Rgb::BLACK };
            assert_eq!(fb[100 * 320 + entry * 20 + 10], expect.to_native(), "step {} entry {}", step, entry);
        }
    }
    assert_eq!(ctx.game_surface().palette().colors(), cosmo_video::Palette::lit().colors());
}

#[test]
fn unchanged_palette_is_not_reloaded() {
    let mut ctx = setup(VideoConfig::default());
    // the first list also carries the palette preloads from init
    ctx.update().unwrap();
    ctx.update().unwrap();
    assert!(!ctx.last_frame().unwrap().palette_reloaded);

    let clean_words = ctx.last_frame().unwrap().words;

    ctx.update_palette(1, Rgb::WHITE).unwrap();
    ctx.update().unwrap();
    let reload = ctx.last_frame().unwrap();
    assert!(reload.palette_reloaded);
    assert_eq!(reload.words, clean_words + 6);
    assert_eq!(ctx.backend().coprocessor().rdp().tmem().tlut_entry(1), Rgb::WHITE.to_native());

    ctx.update().unwrap();
    assert!(!ctx.last_frame().unwrap().palette_reloaded);
    assert_eq!(ctx.last_frame().unwrap().words, clean_words);
}

#[test]
fn pixels_drawn_after_a_frame_show_up_in_the_next() {
    let config = VideoConfig { display_lists: 1, submit_policy: SubmitPolicy::Synchronous, ..VideoConfig::default() };
    let mut ctx = setup(config);

    let first = ctx.update().unwrap();
    assert!(frame(&ctx, first).iter().all(|c| *c == lit_color(0).to_native()));

    ctx.game_surface_mut().fill(15);
    let second = ctx.update().unwrap();
    assert_ne!(first.region, second.region);
    assert!(frame(&ctx, second).iter().all(|c| *c == Rgb::WHITE.to_native()));
    assert_eq!(ctx.frames(), 2);

    let (backend, mut display) = ctx.shutdown();
    assert_eq!(backend.coprocessor().rdp().sync_full_count(), 2);
    assert_eq!(display.frames_shown(), 0);
    display.vblank();
    display.vblank();
    let showing = display.showing().unwrap();
    assert_eq!(display.framebuffer(showing).region, second.region);
}
