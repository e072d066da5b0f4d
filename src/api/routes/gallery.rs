//! HTML gallery of completed downloads.

use crate::api::AppState;
use crate::types::JobSnapshot;
use axum::{extract::State, response::Html};
use std::fmt::Write;

/// GET / - Gallery of completed downloads
#[utoipa::path(
    get,
    path = "/",
    tag = "gallery",
    responses(
        (status = 200, description = "HTML page listing completed downloads", content_type = "text/html")
    )
)]
pub async fn gallery(State(state): State<AppState>) -> Html<String> {
    let completed = state.downloader.completed_jobs().await;
    Html(render_gallery(&completed, state.config.server.api.serve_downloads))
}

/// Render the gallery page
///
/// Every value that came from an extractor is escaped.
pub(crate) fn render_gallery(jobs: &[JobSnapshot], link_files: bool) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Downloads</title>\n</head>\n<body>\n<h1>Downloads</h1>\n",
    );

    if jobs.is_empty() {
        html.push_str("<p>No completed downloads yet.</p>\n");
    } else {
        html.push_str("<ul class=\"videos\">\n");
        for job in jobs {
            render_item(&mut html, job, link_files);
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_item(html: &mut String, job: &JobSnapshot, link_files: bool) {
    html.push_str("<li class=\"video\">\n");

    if let Some(thumbnail) = &job.thumbnail {
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(thumbnail),
            escape_html(&job.title)
        );
    }

    let file_name = job
        .file_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    match file_name.filter(|_| link_files) {
        Some(name) => {
            let _ = writeln!(
                html,
                "<h2><a href=\"/downloads/{}\">{}</a></h2>",
                escape_html(&name),
                escape_html(&job.title)
            );
        }
        None => {
            let _ = writeln!(html, "<h2>{}</h2>", escape_html(&job.title));
        }
    }

    if let Some(author) = &job.author {
        let _ = writeln!(html, "<p class=\"author\">{}</p>", escape_html(author));
    }
    if let Some(duration) = job.duration {
        let _ = writeln!(
            html,
            "<p class=\"duration\">{}</p>",
            format_duration(duration)
        );
    }
    if let Some(size) = job.file_size {
        let _ = writeln!(html, "<p class=\"size\">{} bytes</p>", size);
    }

    html.push_str("</li>\n");
}

/// `m:ss`, or `h:mm:ss` past an hour
fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
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
