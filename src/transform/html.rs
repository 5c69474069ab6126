//! HTML shell rewriting: bootstrap script injection and comment stripping.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::OverlayConfig;
use crate::error::Result;
use crate::transform::DocumentTransform;

/// Upper bound on stripping passes over a single document.
pub const MAX_STRIP_PASSES: usize = 256;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

fn comment_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment regex"))
}

/// Inserts the application bootstrap after the mount element and strips comments.
#[derive(Debug, Clone)]
pub struct HtmlInjection {
  anchor: String,
  script_tag: String,
}

impl HtmlInjection {
  /// Inject a module script pointing at `entry_path` right after `anchor`.
  pub fn new(anchor: impl Into<String>, entry_path: &str) -> Self {
    Self {
      anchor: anchor.into(),
      script_tag: format!(r#"<script type="module" src="{entry_path}"></script>"#),
    }
  }

  /// Injection configured from the project's mount anchor and entry path.
  pub fn from_config(config: &OverlayConfig) -> Self {
    Self::new(config.mount_anchor.clone(), &config.entry_path)
  }

  /// The tag inserted after the anchor.
  pub fn script_tag(&self) -> &str {
    &self.script_tag
  }

  /// Inject the bootstrap script, then strip every comment.
  pub fn transform(&self, html: &str) -> String {
    strip_html_comments(&self.inject_script(html))
  }

  /// Insert the script tag after the first anchor occurrence.
  ///
  /// A document without the anchor is returned unchanged, as is one where the tag already
  /// follows the anchor.
  pub fn inject_script(&self, html: &str) -> String {
    let Some(index) = html.find(&self.anchor) else {
      tracing::debug!(anchor = %self.anchor, "mount anchor not found, skipping script injection");
      return html.to_string();
    };

    let insert_at = index + self.anchor.len();
    if html[insert_at..].starts_with(&self.script_tag) {
      return html.to_string();
    }

    let mut output = String::with_capacity(html.len() + self.script_tag.len());
    output.push_str(&html[..insert_at]);
    output.push_str(&self.script_tag);
    output.push_str(&html[insert_at..]);
    output
  }
}

impl DocumentTransform for HtmlInjection {
  fn transform_document(&self, html: &str) -> Result<String> {
    Ok(self.transform(html))
  }
}

/// Remove HTML comments until no comment marker remains.
///
/// Whole `<!-- ... -->` pairs go first; removing them can splice fragments into new pairs, so
/// the scan repeats. Once no pair is left, unmatched `<!--` or `-->` markers are dropped.
pub fn strip_html_comments(html: &str) -> String {
  let mut current = html.to_string();

  for _ in 0..MAX_STRIP_PASSES {
    let stripped = comment_pattern().replace_all(&current, "");
    let next = if stripped.len() < current.len() {
      stripped.into_owned()
    } else {
      current.replace(COMMENT_OPEN, "").replace(COMMENT_CLOSE, "")
    };

    if next.len() == current.len() {
      return current;
    }
    current = next;
  }

  tracing::warn!(
    passes = MAX_STRIP_PASSES,
    "comment stripping stopped before reaching a fixed point"
  );
  current
}

#[cfg(test)]
mod tests {
  use super::*;

  fn injection() -> HtmlInjection {
    HtmlInjection::from_config(&OverlayConfig::default())
  }

  #[test]
  fn inserts_single_script_after_anchor() {
    let output = injection().transform(r#"<div id="main"></div>"#);
    assert_eq!(
      output,
      r#"<div id="main"></div><script type="module" src="/src/main.jsx"></script>"#
    );
    assert_eq!(output.matches("<script").count(), 1);
  }

  #[test]
  fn script_tag_points_at_configured_entry() {
    let config = OverlayConfig {
      entry_path: "/app/boot.tsx".to_string(),
      ..OverlayConfig::default()
    };
    let injection = HtmlInjection::from_config(&config);
    assert_eq!(
      injection.script_tag(),
      r#"<script type="module" src="/app/boot.tsx"></script>"#
    );
    assert_eq!(
      injection.transform(r#"<div id="main"></div>"#),
      format!(r#"<div id="main"></div>{}"#, injection.script_tag())
    );
  }

  #[test]
  fn only_first_anchor_receives_script() {
    let output = injection().inject_script(r#"<div id="main"></div><div id="main"></div>"#);
    assert_eq!(output.matches("<script").count(), 1);
    assert!(output.starts_with(r#"<div id="main"></div><script"#));
  }

  #[test]
  fn missing_anchor_is_a_no_op() {
    let html = r#"<body><div id="root"></div></body>"#;
    assert_eq!(injection().transform(html), html);
  }

  #[test]
  fn transform_is_idempotent() {
    let html = r#"<html><!-- head --><body><div id="main"></div><!-- a --><!-- b --></body></html>"#;
    let once = injection().transform(html);
    let twice = injection().transform(&once);
    assert_eq!(once, twice);
    assert_eq!(twice.matches("<script").count(), 1);
  }

  #[test]
  fn strips_nested_comments() {
    let output = strip_html_comments("<!-- a <!-- nested --> b -->");
    assert!(!output.contains("<!--"));
    assert!(!output.contains("-->"));
    assert_eq!(output, " b ");
  }

  #[test]
  fn strips_comments_spliced_together_by_removal() {
    let output = strip_html_comments("x<!<!-- inner -->-- outer -->y");
    assert_eq!(output, "xy");
  }

  #[test]
  fn strips_multiline_and_sequential_comments() {
    let html = "<p>keep</p><!--\n  multi\n  line\n--><!-- one --><!-- two --><p>also</p>";
    assert_eq!(strip_html_comments(html), "<p>keep</p><p>also</p>");
  }

  #[test]
  fn stripping_is_idempotent() {
    for html in [
      "<!-- a <!-- nested --> b -->",
      "plain",
      "<!-->",
      "a --> b <!-- c",
      "<!<!---->-->",
    ] {
      let once = strip_html_comments(html);
      assert!(!once.contains(COMMENT_OPEN) && !once.contains(COMMENT_CLOSE), "{html}");
      assert_eq!(strip_html_comments(&once), once, "{html}");
    }
  }
}
