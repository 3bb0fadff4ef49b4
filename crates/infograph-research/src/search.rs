//! Mock source gathering.

use infograph_core::{
  source::{NewSource, Source},
  store::SourceStore,
};
use uuid::Uuid;

use crate::Result;

/// Turns a prompt into a fixed set of plausible sources and stores them.
#[derive(Clone)]
pub struct SearchService<S> {
  store: S,
}

struct Template {
  title:      &'static str,
  host:       &'static str,
  path:       &'static str,
  snippet:    fn(&str) -> String,
  confidence: f64,
}

const TEMPLATES: [Template; 3] = [
  Template {
    title:      "Research overview",
    host:       "research.example.com",
    path:       "overview",
    snippet:    |p| format!("An authoritative overview of {p} with immediate takeaways."),
    confidence: 0.92,
  },
  Template {
    title:      "Expert insights",
    host:       "insights.example.com",
    path:       "experts",
    snippet:    |p| format!("Experts share best practices and emerging trends for {p}."),
    confidence: 0.86,
  },
  Template {
    title:      "Data & timelines",
    host:       "data.example.com",
    path:       "timeline",
    snippet:    |p| {
      format!("Latest data, milestones, and forecasts that shape {p} initiatives.")
    },
    confidence: 0.79,
  },
];

impl<S: SourceStore> SearchService<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// Generate and persist the sources for `prompt` under `session_id`, in
  /// descending confidence.
  pub async fn gather_sources(&self, session_id: Uuid, prompt: &str) -> Result<Vec<Source>> {
    let slug = slugify(prompt);
    let mut sources = Vec::with_capacity(TEMPLATES.len());
    for t in &TEMPLATES {
      let new = NewSource {
        session_id,
        title: format!("{prompt} — {}", t.title),
        url: format!("https://{}/{slug}/{}", t.host, t.path),
        snippet: (t.snippet)(prompt),
        confidence: t.confidence,
      };
      sources.push(self.store.create_source(new).await?);
    }
    tracing::debug!(%session_id, count = sources.len(), "sources gathered");
    Ok(sources)
  }
}

/// Lowercase ASCII alphanumerics joined by single hyphens; `"research"` when
/// nothing survives.
pub fn slugify(prompt: &str) -> String {
  let mut slug = String::with_capacity(prompt.len());
  let mut pending_dash = false;
  for c in prompt.trim().chars().flat_map(char::to_lowercase) {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c);
    } else {
      pending_dash = true;
    }
  }
  if slug.is_empty() { "research".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
  use infograph_core::{
    record::Page,
    session::NewSession,
    store::{SessionStore, UserStore},
    user::NewUser,
  };
  use infograph_store_sqlite::SqliteStore;

  use super::*;

  #[test]
  fn slugify_collapses_punctuation() {
    assert_eq!(slugify("  Rust & WebAssembly: 2024!  "), "rust-webassembly-2024");
    assert_eq!(slugify("already-slugged"), "already-slugged");
  }

  #[test]
  fn slugify_falls_back_when_nothing_is_left() {
    assert_eq!(slugify("   "), "research");
    assert_eq!(slugify("¿¡!"), "research");
  }

  #[tokio::test]
  async fn gathers_three_ranked_sources() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let user = store
      .create_user(NewUser {
        email:     "a@b.com".into(),
        name:      "A".into(),
        google_id: "g-1".into(),
      })
      .await
      .unwrap();
    let session = store
      .create_session(NewSession { user_id: user.user_id, prompt: "Solar Power".into() })
      .await
      .unwrap();

    let search = SearchService::new(store.clone());
    let sources = search
      .gather_sources(session.session_id, &session.prompt)
      .await
      .unwrap();

    let confidences: Vec<_> = sources.iter().map(|s| s.confidence).collect();
    assert_eq!(confidences, [0.92, 0.86, 0.79]);
    assert_eq!(sources[0].url, "https://research.example.com/solar-power/overview");
    assert_eq!(sources[0].title, "Solar Power — Research overview");
    assert_eq!(sources[2].title, "Solar Power — Data & timelines");
    assert!(sources[1].snippet.contains("Solar Power"));

    let stored = store
      .list_sources_for_session(session.session_id, Page::default())
      .await
      .unwrap();
    assert_eq!(stored.len(), 3);
  }
}
