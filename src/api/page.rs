//! HTML pages for the upload form and narration results

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::{narrate::UPLOAD_FIELD, CONFIG_HINT};
use crate::narration::Narration;

const TITLE: &str = "Museum AI Narrator";

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 46rem; margin: 0 auto; padding: 1rem; }
.main-header { text-align: center; padding: 2rem 0; }
.upload-container { border: 2px dashed #ccc; border-radius: 10px; padding: 2rem; text-align: center; margin: 1rem 0; }
.result-container { background-color: #f8f9fa; border-radius: 10px; padding: 1.5rem; margin: 1rem 0; }
.error { background-color: #fdecea; border-radius: 10px; padding: 1rem; color: #8a1f11; }
.info { background-color: #e8f1fb; border-radius: 10px; padding: 1rem; }
img.artifact { max-width: 100%; border-radius: 10px; }
"#;

/// Escape text for HTML element and attribute content
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<div class="main-header">
<h1>{title}</h1>
<p>Upload a photo of a museum artifact and let AI bring it to life with a fascinating story!</p>
</div>
{body}
</body>
</html>"#,
        title = TITLE,
        style = STYLE,
        body = body
    )
}

fn upload_form() -> String {
    format!(
        r#"<form class="upload-container" action="/narrate" method="post" enctype="multipart/form-data">
<label for="{field}">Upload Museum Artifact Photo</label><br>
<input id="{field}" name="{field}" type="file" accept=".jpg,.jpeg,.png,.webp,image/jpeg,image/png,image/webp" required>
<button type="submit">Narrate</button>
</form>"#,
        field = UPLOAD_FIELD
    )
}

/// Upload page; a configuration error replaces the form
pub fn index(config_error: Option<&str>) -> String {
    match config_error {
        Some(message) => layout(&format!(
            r#"<div class="error"><strong>Missing or invalid configuration:</strong> {}</div>
<div class="info">{}</div>"#,
            escape(message),
            escape(CONFIG_HINT)
        )),
        None => layout(&upload_form()),
    }
}

/// Result page: photo, story, audio player and download link
pub fn result(narration: &Narration) -> String {
    let audio = &narration.audio;
    let audio_uri = format!(
        "data:{};base64,{}",
        audio.mime_type(),
        BASE64.encode(&audio.bytes)
    );

    layout(&format!(
        r#"<img class="artifact" src="{image}" alt="Uploaded Artifact">
<div class="result-container">
<h2>Artifact Story</h2>
<p class="narrative">{narrative}</p>
</div>
<h2>Audio Narration</h2>
<audio controls src="{audio}" type="{mime}"></audio>
<p><a download="{filename}" href="{audio}" type="{mime}">Download Audio</a></p>
{form}"#,
        image = narration.image.data_uri(),
        narrative = escape(&narration.narrative),
        audio = audio_uri,
        mime = audio.mime_type(),
        filename = escape(&audio.filename()),
        form = upload_form()
    ))
}

/// Generic failure page, with the form to try again
pub fn failure(message: &str, hint: &str) -> String {
    layout(&format!(
        r#"<div class="error">{}</div>
<div class="info">{}</div>
{}"#,
        escape(message),
        escape(hint),
        upload_form()
    ))
}
