//! Built-in renderer producing a printable, self-contained HTML document.
//!
//! Section structure follows the on-screen CV view: header, summary,
//! skills, experience, education. Anything absent in the résumé is simply
//! omitted.

use async_trait::async_trait;
use bytes::Bytes;

use super::{DocumentRenderer, RenderError, RenderedDocument};
use crate::models::resume::TailoredResume;

#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

#[async_trait]
impl DocumentRenderer for HtmlRenderer {
    async fn render(&self, resume: &TailoredResume) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            bytes: Bytes::from(render_html(resume)),
            mime_type: "text/html".to_string(),
        })
    }
}

fn render_html(resume: &TailoredResume) -> String {
    let mut body = String::new();

    // Header: name, title · location, email · phone.
    body.push_str(&format!(
        "<header><h1>{}</h1>",
        escape(&resume.personal.name)
    ));
    let title_line = join_present(&[
        resume.personal.title.as_str(),
        resume.personal.location.as_str(),
    ]);
    if !title_line.is_empty() {
        body.push_str(&format!("<p class=\"subtitle\">{title_line}</p>"));
    }
    let contact_line = join_present(&[
        resume.personal.email.as_str(),
        resume.personal.phone.as_str(),
    ]);
    if !contact_line.is_empty() {
        body.push_str(&format!("<p class=\"contact\">{contact_line}</p>"));
    }
    body.push_str("</header>");

    if !resume.summary.is_empty() {
        body.push_str("<section><h2>Summary</h2>");
        for paragraph in &resume.summary {
            body.push_str(&format!("<p>{}</p>", escape(paragraph)));
        }
        body.push_str("</section>");
    }

    if !resume.skills.is_empty() {
        body.push_str("<section><h2>Skills</h2><ul class=\"skills\">");
        for skill in &resume.skills {
            body.push_str(&format!("<li>{}</li>", escape(skill)));
        }
        body.push_str("</ul></section>");
    }

    if !resume.experience.is_empty() {
        body.push_str("<section><h2>Experience</h2>");
        for item in &resume.experience {
            let dates = join_range(&item.start, &item.end);
            let heading = join_present(&[
                item.role.as_str(),
                item.company.as_str(),
                item.location.as_str(),
                dates.as_str(),
            ]);
            body.push_str(&format!("<div class=\"item\"><h3>{heading}</h3>"));
            if !item.bullets.is_empty() {
                body.push_str("<ul>");
                for bullet in &item.bullets {
                    body.push_str(&format!("<li>{}</li>", escape(bullet)));
                }
                body.push_str("</ul>");
            }
            body.push_str("</div>");
        }
        body.push_str("</section>");
    }

    if !resume.education.is_empty() {
        body.push_str("<section><h2>Education</h2>");
        for item in &resume.education {
            let dates = join_range(&item.start, &item.end);
            let heading =
                join_present(&[item.degree.as_str(), item.institution.as_str(), dates.as_str()]);
            body.push_str(&format!("<div class=\"item\"><h3>{heading}</h3></div>"));
        }
        body.push_str("</section>");
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{}</style></head><body>{}</body></html>",
        escape(&resume.personal.name),
        STYLE,
        body
    )
}

const STYLE: &str = "\
    body { font-family: Georgia, serif; max-width: 48rem; margin: 2rem auto; color: #222; } \
    h1 { margin-bottom: 0.1rem; } \
    h2 { border-bottom: 1px solid #999; padding-bottom: 0.2rem; } \
    .subtitle, .contact { margin: 0.1rem 0; color: #555; } \
    .skills { list-style: none; padding: 0; } \
    .skills li { display: inline-block; background: #eee; border-radius: 4px; \
                 padding: 0.1rem 0.5rem; margin: 0.1rem; } \
    .item h3 { margin-bottom: 0.2rem; } \
    @media print { body { margin: 0; } }";

/// Joins the non-empty values with the separator used throughout the CV
/// view.
fn join_present(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| escape(v))
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

fn join_range(start: &str, end: &str) -> String {
    [start, end]
        .iter()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" – ")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
