mod scene;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use cosmo_rcp::color::unpack_rgba8;
use cosmo_rcp::{DmaArena, FramebufferInfo, SoftRcp, VecRdram, VirtualDisplay};
use cosmo_video::{BitmapFont, Fade, RdpBackend, SubmitPolicy, Ticker, VideoConfig, VideoContext};
use image::RgbaImage;
use tracing::{debug, info, Level};
use tracing_subscriber::util::SubscriberInitExt;

/// Coprocessor-visible memory, as on the console.
const RDRAM_SIZE: u32 = 4 * 1024 * 1024;

type Video = VideoContext<RdpBackend<SoftRcp>, VirtualDisplay>;

#[derive(Parser, Debug)]
#[command(name = "framedump")]
#[command(version, about = "Render video frames through the software coprocessor", long_about = None)]
struct Cli {
    /// Surface to present
    #[arg(short, long, value_enum, default_value_t = ModeArg::Game)]
    mode: ModeArg,

    /// Palette fade to run after the first frame
    #[arg(short, long, value_enum)]
    fade: Option<FadeArg>,

    /// Directory the frames are written to
    #[arg(short, long, default_value = "frames")]
    out: PathBuf,

    /// Number of display lists to rotate through
    #[arg(long, default_value_t = 2)]
    display_lists: usize,

    /// Wait for every display list to finish before building the next
    #[arg(long)]
    sync: bool,

    /// 8x16 bitmap font, 256 glyphs (4096 bytes)
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,

    /// Game ticks to wait between fade steps
    #[arg(long, default_value_t = 3)]
    fade_ticks: u16,

    /// Actually sleep through waits instead of only counting them
    #[arg(long)]
    realtime: bool,

    /// Frames to present before any fade
    #[arg(long, default_value_t = 1)]
    frames: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Game,
    Text,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FadeArg {
    Black,
    White,
    In,
}

impl From<FadeArg> for Fade {
    fn from(f: FadeArg) -> Self {
        match f {
            FadeArg::Black => Fade::ToBlack,
            FadeArg::White => Fade::ToWhite,
            FadeArg::In => Fade::InFromBlack,
        }
    }
}

/// Waits on the host clock, or just keeps count of what was asked for.
#[derive(Default)]
struct HostTicker {
    realtime: bool,
    waited_ms: u64,
    pumps: u64,
}

impl Ticker for HostTicker {
    fn wait_ms(&mut self, ms: u32) {
        if ms == 0 {
            self.pumps += 1;
            return
        }
        self.waited_ms += ms as u64;
        if self.realtime {
            std::thread::sleep(Duration::from_millis(ms as u64));
        }
    }
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn config(cli: &Cli) -> VideoConfig {
    VideoConfig {
        display_lists: cli.display_lists,
        submit_policy: if cli.sync { SubmitPolicy::Synchronous } else { SubmitPolicy::RoundRobin },
        ..VideoConfig::default()
    }
}

fn load_font(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    let Some(path) = path else {
        return Ok(scene::fallback_font())
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    if bytes.len() != scene::FONT_BYTES {
        bail!("{}: expected {} bytes of 8x16 glyphs, found {}", path.display(), scene::FONT_BYTES, bytes.len());
    }
    Ok(bytes)
}

/// Writes one presented framebuffer as `frame_NNN.png`.
fn save_frame(ctx: &Video, info: FramebufferInfo, out: &Path, index: usize) -> anyhow::Result<PathBuf> {
    let bytes = ctx.backend().coprocessor().rdram().slice(info.region)?;
    let rgba: Vec<u8> = bytes.chunks_exact(2)
        .flat_map(|b| unpack_rgba8(u16::from_be_bytes([b[0], b[1]])))
        .collect();

    let image = RgbaImage::from_raw(info.width as u32, info.height as u32, rgba)
        .context("framebuffer size does not match its dimensions")?;
    let path = out.join(format!("frame_{:03}.png", index));
    image.save(&path).with_context(|| format!("writing {}", path.display()))?;
    debug!("wrote {}", path.display());
    Ok(path)
}

fn run(cli: &Cli) -> anyhow::Result<Vec<PathBuf>> {
    let config = config(cli);
    config.validate()?;
    std::fs::create_dir_all(&cli.out).with_context(|| format!("creating {}", cli.out.display()))?;

    let mut arena = DmaArena::new(0, RDRAM_SIZE);
    let display = VirtualDisplay::new(&mut arena, 2, config.display_width, config.display_height)
        .context("no room for framebuffers")?
        .with_auto_vblank(true);
    let backend = RdpBackend::from_config(SoftRcp::new(VecRdram::new(RDRAM_SIZE)), &config);
    let mut ctx = VideoContext::init(&config, backend, display, &mut arena)?;

    let glyphs = load_font(cli.font.as_deref())?;
    let font = BitmapFont::vga_8x16(&glyphs).context("font table is not a whole number of glyphs")?;

    scene::paint_game(&mut ctx);
    scene::paint_text(&mut ctx, &font, &[
        "COSMO'S COSMIC ADVENTURE",
        "",
        "Text mode: 640x400 in 16 colours,",
        "scaled onto the 320x240 display.",
    ]);
    if cli.mode == ModeArg::Text {
        ctx.set_text_mode();
    }

    let mut written = Vec::new();
    for _ in 0..cli.frames {
        let info = ctx.update()?;
        written.push(save_frame(&ctx, info, &cli.out, written.len())?);
    }

    let mut ticker = HostTicker { realtime: cli.realtime, ..HostTicker::default() };
    if let Some(fade) = cli.fade {
        let mut failed = None;
        ctx.fade_with(fade.into(), cli.fade_ticks, &mut ticker, |ctx, info| {
            if failed.is_some() {
                return
            }
            match save_frame(ctx, info, &cli.out, written.len()) {
                Ok(path) => written.push(path),
                Err(e) => failed = Some(e),
            }
        })?;
        if let Some(e) = failed {
            return Err(e)
        }
    }

    let (backend, vi) = ctx.shutdown();
    info!(
        "{} frames written to {}; {} lists executed, {} retraces, {} ms waited, {} pumps",
        written.len(),
        cli.out.display(),
        backend.coprocessor().rdp().sync_full_count(),
        vi.vblank_count(),
        ticker.waited_ms,
        ticker.pumps,
    );
    Ok(written)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);
    info!("framedump started");

    let written = run(&cli)?;
    println!("wrote {} frames to {}", written.len(), cli.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(out: &Path, args: &[&str]) -> Cli {
        let mut argv = vec!["framedump", "--out", out.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn game_frames_with_a_fade() {
        let dir = tempfile::tempdir().unwrap();
        let written = run(&cli(dir.path(), &["--fade", "black", "--fade-ticks", "0"])).unwrap();

        assert_eq!(written.len(), 17);
        assert!(dir.path().join("frame_000.png").exists());
        assert!(dir.path().join("frame_016.png").exists());

        let last = image::open(&written[16]).unwrap().to_rgba8();
        assert_eq!(last.dimensions(), (320, 240));
        // the fade ends with every entry black
        assert!(last.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        let first = image::open(&written[0]).unwrap().to_rgba8();
        assert!(first.pixels().any(|p| p.0 != [0, 0, 0, 255]));
    }

    #[test]
    fn text_mode_with_synchronous_lists() {
        let dir = tempfile::tempdir().unwrap();
        let written = run(&cli(dir.path(), &["--mode", "text", "--sync", "--display-lists", "1", "--frames", "2"])).unwrap();
        assert_eq!(written.len(), 2);
        let frame = image::open(&written[1]).unwrap().to_rgba8();
        assert_eq!(frame.dimensions(), (320, 240));
    }

    #[test]
    fn bad_fonts_and_configs_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("short.fnt");
        std::fs::write(&font, [0u8; 100]).unwrap();

        let err = run(&cli(dir.path(), &["--font", font.to_str().unwrap()])).unwrap_err();
        assert!(err.to_string().contains("expected 4096 bytes"));

        assert!(run(&cli(dir.path(), &["--display-lists", "1"])).is_err());
    }

    #[test]
    fn realtime_fade_in_sleeps_through_its_waits() {
        let dir = tempfile::tempdir().unwrap();
        let written = run(&cli(dir.path(), &["--fade", "in", "--fade-ticks", "1", "--realtime", "--log-level", "debug"])).unwrap();
        assert_eq!(written.len(), 17);
        assert!(written.iter().all(|p| p.exists()));
    }
}
