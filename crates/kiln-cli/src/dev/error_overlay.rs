//! HTML page shown in place of the app while the last build is failing.

use crate::dev::server::RELOAD_SCRIPT_PATH;

/// Render the overlay for `errors`.
///
/// The page loads the reload client, so it replaces itself with the app as
/// soon as a build succeeds.
pub fn render_overlay(errors: &[String]) -> String {
    let items: String = errors
        .iter()
        .map(|error| format!("      <li><pre>{}</pre></li>\n", html_escape(error)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Build failed</title>
  <style>
    body {{ margin: 0; background: #1e1e1e; color: #eee; font-family: ui-monospace, monospace; }}
    main {{ padding: 2rem; }}
    h1 {{ color: #ff6b6b; font-size: 1.25rem; }}
    ul {{ list-style: none; padding: 0; }}
    li {{ border-left: 3px solid #ff6b6b; margin-bottom: 1rem; padding-left: 1rem; }}
    pre {{ white-space: pre-wrap; margin: 0; }}
  </style>
</head>
<body>
  <main>
    <h1>Build failed with {count} error(s)</h1>
    <ul>
{items}    </ul>
    <p>Waiting for changes...</p>
  </main>
  <script src="{script}"></script>
</body>
</html>
"#,
        count = errors.len(),
        items = items,
        script = RELOAD_SCRIPT_PATH,
    )
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
