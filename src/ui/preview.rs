//! Sandbox preview view-model.
//!
//! Maps the accumulated code buffer to the file map and options of an embedded
//! sandbox widget (a Sandpack-style in-browser bundler). The mapping is pure:
//! the same buffer always produces the same document, and an empty buffer
//! produces no document at all.

use std::collections::BTreeMap;

use serde::Serialize;

/// Sandbox file that receives the generated component.
pub const APP_FILE: &str = "/App.tsx";

/// Static HTML scaffold mounted alongside the component.
pub const SCAFFOLD_FILE: &str = "/public/index.html";

/// Sandbox template identifier.
pub const TEMPLATE: &str = "react-ts";

/// Tailwind stylesheet injected into the sandbox at runtime.
pub const TAILWIND_STYLESHEET: &str =
    "https://unpkg.com/@tailwindcss/ui/dist/tailwind-ui.min.css";

const HTML_SCAFFOLD: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Document</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>"#;

/// Widget options for the embedded sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOptions {
    pub editor_height: &'static str,
    pub show_tabs: bool,
    pub show_navigator: bool,
    pub external_resources: Vec<&'static str>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            editor_height: "80vh",
            show_tabs: false,
            show_navigator: true,
            external_resources: vec![TAILWIND_STYLESHEET],
        }
    }
}

/// Everything the sandbox widget needs to render one preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewDocument {
    pub template: &'static str,
    pub files: BTreeMap<&'static str, String>,
    pub options: PreviewOptions,
}

/// Builds the preview document for `code`, or `None` while the buffer is
/// empty. Deterministic: equal buffers yield equal documents.
pub fn document(code: &str) -> Option<PreviewDocument> {
    if code.is_empty() {
        return None;
    }

    let mut files = BTreeMap::new();
    files.insert(APP_FILE, strip_code_fences(code));
    files.insert(SCAFFOLD_FILE, HTML_SCAFFOLD.to_owned());

    Some(PreviewDocument {
        template: TEMPLATE,
        files,
        options: PreviewOptions::default(),
    })
}

/// Removes a leading and trailing markdown code fence if the model ignored
/// its instructions and wrapped the output anyway.
pub fn strip_code_fences(code: &str) -> String {
    let trimmed = code.trim();
    if !trimmed.starts_with("```") {
        return code.to_owned();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines
        .first()
        .is_some_and(|line| line.trim_start().starts_with("```"))
    {
        lines.remove(0);
    }
    if lines
        .last()
        .is_some_and(|line| line.trim() == "```")
    {
        lines.pop();
    }
    lines.join("\n")
}
