//! Server-rendered HTML for the upload flow.

use smilecheck_core::shared::constants::VIDEO_EXTENSIONS;

const STYLE: &str = "body{font-family:sans-serif;max-width:720px;margin:40px auto;padding:0 16px}\
progress{width:100%}video{max-width:100%}.error{color:#b00}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

pub fn index_page() -> String {
    let accept = VIDEO_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    layout(
        "SmileCheck",
        &format!(
            "<h1>SmileCheck</h1>\n\
             <p>Upload a video to detect faces and score smiles frame by frame.</p>\n\
             <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
             <input type=\"file\" name=\"video\" accept=\"{accept}\" required>\n\
             <button type=\"submit\">Upload</button>\n\
             </form>"
        ),
    )
}

/// Polls `/status/<id>` once a second and moves on to the result page.
pub fn processing_page(id: &str, filename: &str) -> String {
    let id = escape_html(id);
    layout(
        "Processing",
        &format!(
            "<h1>Processing {filename}</h1>\n\
             <p id=\"status\">queued</p>\n\
             <progress id=\"progress\" max=\"100\" value=\"0\"></progress>\n\
             <p id=\"error\" class=\"error\"></p>\n\
             <script>\n\
             function poll() {{\n\
               fetch('/status/{id}').then(r => r.json()).then(job => {{\n\
                 document.getElementById('status').textContent = job.status;\n\
                 document.getElementById('progress').value = job.progress || 0;\n\
                 if (job.status === 'completed') {{ window.location = '/result/{id}'; }}\n\
                 else if (job.status === 'error') {{ document.getElementById('error').textContent = job.error; }}\n\
                 else if (job.status !== 'not_found') {{ setTimeout(poll, 1000); }}\n\
               }});\n\
             }}\n\
             poll();\n\
             </script>",
            filename = escape_html(filename),
        ),
    )
}

pub fn result_page(id: &str, filename: &str) -> String {
    let id = escape_html(id);
    layout(
        "Result",
        &format!(
            "<h1>Result for {filename}</h1>\n\
             <video controls src=\"/video/{id}\"></video>\n\
             <p><a href=\"/video/{id}\" download>Download</a> | <a href=\"/\">Upload another</a></p>",
            filename = escape_html(filename),
        ),
    )
}

pub fn escape_html(text: &str) -> String {
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
