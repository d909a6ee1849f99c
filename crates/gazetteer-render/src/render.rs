//! Draw [`SummaryLines`] onto an 800×400 bitmap and save it as PNG.

use std::{
  path::{Path, PathBuf},
  sync::Once,
};

use gazetteer_core::summary::SummarySnapshot;
use plotters::{
  prelude::*,
  style::{
    FontFamily,
    text_anchor::{HPos, Pos, VPos},
  },
};
use plotters_bitmap::BitMapBackend;

use crate::{Error, Result, layout::SummaryLines};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 400;

const BACKGROUND: RGBColor = RGBColor(0x1C, 0x28, 0x33);
const TITLE_COLOR: RGBColor = RGBColor(0xFF, 0xFF, 0xFF);
const SUBTITLE_COLOR: RGBColor = RGBColor(0xBB, 0xBB, 0xBB);
const NAME_COLOR: RGBColor = RGBColor(0xDD, 0xDD, 0xDD);
const GDP_COLOR: RGBColor = RGBColor(0x82, 0xE0, 0xAA);

const MARGIN_X: i32 = 30;

static INIT_FONTS: Once = Once::new();

/// `ab_glyph` does not discover system fonts; register the bundled one.
fn ensure_fonts_registered() {
  INIT_FONTS.call_once(|| {
    let _ = plotters::style::register_font(
      "sans-serif",
      plotters::style::FontStyle::Normal,
      include_bytes!("../assets/DejaVuSans.ttf"),
    );
  });
}

fn draw_err<E: std::fmt::Debug>(e: E) -> Error { Error::Draw(format!("{e:?}")) }

fn style(px: u32, color: &'static RGBColor) -> TextStyle<'static> {
  TextStyle::from((FontFamily::SansSerif, px))
    .color(color)
    .pos(Pos::new(HPos::Left, VPos::Top))
}

fn draw_lines(lines: &SummaryLines, path: &Path) -> Result<()> {
  let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
  root.fill(&BACKGROUND).map_err(draw_err)?;

  let text = |s: &str, x: i32, y: i32, st: TextStyle<'static>| {
    root.draw(&Text::new(s.to_owned(), (x, y), st)).map_err(draw_err)
  };

  text(&lines.title, MARGIN_X, 24, style(32, &TITLE_COLOR))?;
  text(&lines.total, MARGIN_X, 70, style(20, &SUBTITLE_COLOR))?;
  text(&lines.heading, MARGIN_X, 120, style(20, &SUBTITLE_COLOR))?;

  let name_style = style(18, &NAME_COLOR);
  for (i, leader) in lines.leaders.iter().enumerate() {
    let y = 158 + i as i32 * 30;
    let prefix = leader.prefix();
    let (prefix_w, _) = root.estimate_text_size(&prefix, &name_style).map_err(draw_err)?;
    text(&prefix, MARGIN_X, y, name_style.clone())?;
    text(&leader.value, MARGIN_X + prefix_w as i32, y, style(18, &GDP_COLOR))?;
  }

  text(&lines.refreshed, MARGIN_X, 350, style(20, &SUBTITLE_COLOR))?;

  root.present().map_err(draw_err)?;
  Ok(())
}

/// The sibling file the image is drawn into before being renamed into place.
/// Keeps the `.png` extension so the encoder picks the right format.
fn staging_path(target: &Path) -> PathBuf {
  let stem = target
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "summary".into());
  target.with_file_name(format!(".{stem}.partial.png"))
}

/// Render `snapshot` to `target`, replacing any previous image atomically.
///
/// Blocking: the drawing and encoding are CPU-bound. Parent directories are
/// created as needed.
pub fn render_summary_blocking(snapshot: &SummarySnapshot, target: &Path) -> Result<()> {
  ensure_fonts_registered();

  if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)?;
  }

  let lines = SummaryLines::from_snapshot(snapshot);
  let staging = staging_path(target);
  if let Err(e) = draw_lines(&lines, &staging) {
    let _ = std::fs::remove_file(&staging);
    return Err(e);
  }
  std::fs::rename(&staging, target)?;
  Ok(())
}

/// Async wrapper running [`render_summary_blocking`] on the blocking pool.
pub async fn render_summary(snapshot: SummarySnapshot, target: PathBuf) -> Result<()> {
  tracing::debug!(path = %target.display(), "rendering summary image");
  tokio::task::spawn_blocking(move || render_summary_blocking(&snapshot, &target)).await?
}
