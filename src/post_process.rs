//! Transforms applied to converter output before it is returned.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Content;

type RenderedFn = dyn Fn(Content) -> Content + Send + Sync;
type WithSourceFn = dyn Fn(Content, &Content) -> Content + Send + Sync;

/// Optional post-processing step, chosen when the runner is built.
#[derive(Clone, Default)]
pub enum PostProcess {
    /// Return the sanitized output as-is.
    #[default]
    None,
    /// Transform the sanitized output alone.
    Rendered(Arc<RenderedFn>),
    /// Transform the sanitized output with the original source at hand.
    WithSource(Arc<WithSourceFn>),
}

impl PostProcess {
    /// Wraps a callback that only sees the rendered output.
    pub fn rendered(f: impl Fn(Content) -> Content + Send + Sync + 'static) -> Self {
        Self::Rendered(Arc::new(f))
    }

    /// Wraps a callback that sees the rendered output and the source.
    pub fn with_source(f: impl Fn(Content, &Content) -> Content + Send + Sync + 'static) -> Self {
        Self::WithSource(Arc::new(f))
    }

    /// Runs the step on `rendered`.
    #[must_use]
    pub fn apply(&self, rendered: Content, source: &Content) -> Content {
        match self {
            Self::None => rendered,
            Self::Rendered(f) => f(rendered),
            Self::WithSource(f) => f(rendered, source),
        }
    }
}

impl fmt::Debug for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "PostProcess::None",
            Self::Rendered(_) => "PostProcess::Rendered(..)",
            Self::WithSource(_) => "PostProcess::WithSource(..)",
        })
    }
}

/// Post-processors that can be named in the converter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessKind {
    /// No post-processing.
    #[default]
    None,
    /// Keep only the inside of `<body>` for converters emitting full pages.
    ExtractBody,
    /// Fall back to the source when the output is only whitespace.
    SourceIfBlank,
}

impl From<PostProcessKind> for PostProcess {
    fn from(kind: PostProcessKind) -> Self {
        match kind {
            PostProcessKind::None => Self::None,
            PostProcessKind::ExtractBody => {
                Self::rendered(|rendered| rendered.map_text(|html| extract_body(html).to_owned()))
            }
            PostProcessKind::SourceIfBlank => Self::with_source(|rendered, source| {
                if rendered.to_string_lossy().trim().is_empty() {
                    source.clone()
                } else {
                    rendered
                }
            }),
        }
    }
}

/// Returns the trimmed inside of the first `<body ...>` element, or the
/// whole input when there is none.
fn extract_body(html: &str) -> &str {
    let lower = html.to_ascii_lowercase();
    let Some(open) = find_body_open(&lower) else {
        return html;
    };
    let Some(tag_end) = lower[open..].find('>').map(|i| open + i + 1) else {
        return html;
    };
    match lower[tag_end..].rfind("</body>") {
        Some(close) => html[tag_end..tag_end + close].trim(),
        None => html,
    }
}

fn find_body_open(lower: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = lower[from..].find("<body") {
        let at = from + i;
        // Skip tags like <bodyfoo>.
        match lower.as_bytes().get(at + 5) {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r') => return Some(at),
            _ => from = at + 5,
        }
    }
    None
}
