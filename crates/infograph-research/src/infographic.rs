//! [`InfographicService`]: condense a session's sources into an SVG card.

use std::path::{Path, PathBuf};

use infograph_core::{
  infographic::{Infographic, NewInfographic},
  session::ResearchSession,
  source::Source,
  store::InfographicStore,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::{Error, Result, render::render_svg};

pub const TEMPLATE_BASIC: &str = "basic";

const MAX_KEY_POINTS: usize = 4;
const FALLBACK_POINT: &str = "AI-generated insight";

#[derive(Clone)]
pub struct InfographicService<S> {
  store:      S,
  output_dir: PathBuf,
}

impl<S: InfographicStore> InfographicService<S> {
  pub fn new(store: S, output_dir: impl Into<PathBuf>) -> Self {
    Self { store, output_dir: output_dir.into() }
  }

  pub fn output_dir(&self) -> &Path { &self.output_dir }

  /// Render the card for `session`, write it under the output directory and
  /// record it.
  ///
  /// Files are named by content hash, so regenerating an unchanged card
  /// rewrites the same file.
  pub async fn generate_for_session(
    &self,
    session: &ResearchSession,
    sources: &[Source],
  ) -> Result<Infographic> {
    let key_points = build_key_points(sources);
    let svg = render_svg(&session.prompt, &key_points, sources.len())?;

    tokio::fs::create_dir_all(&self.output_dir)
      .await
      .map_err(|source| Error::Write { path: self.output_dir.clone(), source })?;
    let path = self.output_dir.join(file_name(&svg));
    tokio::fs::write(&path, &svg)
      .await
      .map_err(|source| Error::Write { path: path.clone(), source })?;

    let new = NewInfographic {
      session_id:    session.session_id,
      image_path:    path.to_string_lossy().into_owned(),
      template_type: TEMPLATE_BASIC.to_string(),
      layout_data:   json!({
        "title": session.prompt,
        "key_points": key_points,
        "source_count": sources.len(),
      }),
    };
    let infographic = self.store.create_infographic(new).await?;
    tracing::info!(
      session_id = %session.session_id,
      path = %path.display(),
      "infographic generated"
    );
    Ok(infographic)
  }
}

/// The first sentence of up to four snippets, falling back to the title for
/// empty snippets and to a placeholder when there is nothing at all.
pub fn build_key_points(sources: &[Source]) -> Vec<String> {
  let mut points: Vec<String> = sources
    .iter()
    .take(MAX_KEY_POINTS)
    .filter_map(|s| {
      let snippet = s.snippet.trim();
      if snippet.is_empty() {
        let title = s.title.trim();
        return (!title.is_empty()).then(|| title.to_string());
      }
      let sentence = snippet.split('.').next().unwrap_or_default().trim();
      Some(if sentence.is_empty() { snippet } else { sentence }.to_string())
    })
    .collect();

  if points.is_empty() {
    points.push(FALLBACK_POINT.to_string());
  }
  points
}

fn file_name(svg: &[u8]) -> String {
  let digest = Sha256::digest(svg);
  format!("infographic-{}.svg", &hex::encode(digest)[..16])
}
