/* 📖 # Why render the docs page ourselves?

The documentation viewer is Scalar's standalone bundle loaded from a CDN, so the
page is a small HTML shell: a mount point, the script tag, and a configuration
object pointing at the API description. The live server and the static export
render the same shell and differ only in the description URL and whether the
"test request" button is shown (there is no server behind a static export).
*/

use serde_json::json;

const SCALAR_SCRIPT_URL: &str =
    "https://unpkg.com/@scalar/api-reference@latest/dist/browser/standalone.js";

/// HTML page hosting the Scalar API reference viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsPage {
    pub title: String,
    /// URL of the OpenAPI document, relative or absolute.
    pub spec_url: String,
    pub hide_test_requests: bool,
}

impl DocsPage {
    pub fn new(title: impl Into<String>, spec_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            spec_url: spec_url.into(),
            hide_test_requests: false,
        }
    }

    pub fn with_hidden_test_requests(mut self) -> Self {
        self.hide_test_requests = true;
        self
    }

    pub fn render(&self) -> String {
        let mut config = json!({
            "theme": "moon",
            "darkMode": true,
            "spec": { "url": self.spec_url },
        });
        if self.hide_test_requests {
            config["hideTestRequestButton"] = json!(true);
        }
        // `</` inside a script block would end it early
        let config = config.to_string().replace("</", "<\\/");

        format!(
            r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <style> body {{ margin: 0; }} </style>
  </head>
  <body>
    <div id="api-reference"></div>
    <script src="{script}"></script>
    <script>
      window.ScalarAPIReference && window.ScalarAPIReference({config}).render('#api-reference');
    </script>
  </body>
</html>
"#,
            title = escape_html(&self.title),
            script = SCALAR_SCRIPT_URL,
            config = config,
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
