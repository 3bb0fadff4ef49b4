//! SVG rendering for infographics.
//!
//! Uses `quick-xml`'s writer so every piece of user text is escaped on the
//! way out.

use std::io::Cursor;

use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{Error, Result};

// ─── Layout ──────────────────────────────────────────────────────────────────

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 700;
const PADDING: u32 = 40;
const WRAP_COLUMNS: usize = 50;
const LINE_HEIGHT: u32 = 25;

const BACKGROUND: &str = "#0e172a";
const ACCENT: &str = "#0ea5e9";
const TEXT: &str = "#f8fafc";

/// Render the summary card for a session as a standalone SVG document.
pub fn render_svg(title: &str, key_points: &[String], source_count: usize) -> Result<Vec<u8>> {
  let mut w = Writer::new(Cursor::new(Vec::new()));
  let size = [WIDTH.to_string(), HEIGHT.to_string()];
  let view_box = format!("0 0 {WIDTH} {HEIGHT}");

  event(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
  event(
    &mut w,
    Event::Start(BytesStart::new("svg").with_attributes([
      ("xmlns", "http://www.w3.org/2000/svg"),
      ("width", size[0].as_str()),
      ("height", size[1].as_str()),
      ("viewBox", view_box.as_str()),
      ("font-family", "sans-serif"),
    ])),
  )?;

  event(
    &mut w,
    Event::Empty(BytesStart::new("rect").with_attributes([
      ("width", "100%"),
      ("height", "100%"),
      ("fill", BACKGROUND),
    ])),
  )?;

  let mut y = PADDING + 20;
  text(&mut w, y, ACCENT, 20, "Research Infograph")?;
  y += 40;
  text(&mut w, y, TEXT, 28, title)?;
  y += 30;

  let (x1, x2, line_y) = (PADDING.to_string(), (WIDTH - PADDING).to_string(), y.to_string());
  event(
    &mut w,
    Event::Empty(BytesStart::new("line").with_attributes([
      ("x1", x1.as_str()),
      ("y1", line_y.as_str()),
      ("x2", x2.as_str()),
      ("y2", line_y.as_str()),
      ("stroke", ACCENT),
      ("stroke-width", "2"),
    ])),
  )?;
  y += 40;

  text(&mut w, y, TEXT, 18, &format!("Sources: {source_count}"))?;
  y += 40;

  for point in key_points {
    for (i, line) in wrap(point, WRAP_COLUMNS).iter().enumerate() {
      let marker = if i == 0 { "\u{2022} " } else { "  " };
      text(&mut w, y, TEXT, 16, &format!("{marker}{line}"))?;
      y += LINE_HEIGHT;
    }
    y += 5;
  }

  event(&mut w, Event::End(BytesEnd::new("svg")))?;
  Ok(w.into_inner().into_inner())
}

// ─── Writer helpers ──────────────────────────────────────────────────────────

fn event(w: &mut Writer<Cursor<Vec<u8>>>, ev: Event<'_>) -> Result<()> {
  w.write_event(ev).map_err(|e| Error::Render(e.to_string()))
}

fn text(
  w: &mut Writer<Cursor<Vec<u8>>>,
  y: u32,
  fill: &str,
  size: u32,
  content: &str,
) -> Result<()> {
  let (x, y, size) = (PADDING.to_string(), y.to_string(), size.to_string());
  event(
    w,
    Event::Start(BytesStart::new("text").with_attributes([
      ("x", x.as_str()),
      ("y", y.as_str()),
      ("fill", fill),
      ("font-size", size.as_str()),
    ])),
  )?;
  event(w, Event::Text(BytesText::new(content)))?;
  event(w, Event::End(BytesEnd::new("text")))
}

/// Greedy word wrap on character count. Words longer than a line are split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();
  let mut len = 0;

  for word in text.split_whitespace() {
    let chars: Vec<char> = word.chars().collect();
    for chunk in chars.chunks(columns) {
      let needed = if len == 0 { chunk.len() } else { len + 1 + chunk.len() };
      if needed > columns && len > 0 {
        lines.push(std::mem::take(&mut current));
        len = 0;
      }
      if len > 0 {
        current.push(' ');
        len += 1;
      }
      current.extend(chunk);
      len += chunk.len();
    }
  }
  if len > 0 {
    lines.push(current);
  }
  lines
}
