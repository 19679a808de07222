//! Server-rendered HTML for the two pages and their shared chrome.

pub mod stats;
pub mod submit;

use std::fmt::Write as _;

use crate::models::Sighting;

pub const APP_TITLE: &str = "Crescent Moon Sightings";

/// Sidebar navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Submit,
    Stats,
}

impl Nav {
    pub const ALL: [Nav; 2] = [Nav::Submit, Nav::Stats];

    pub fn label(self) -> &'static str {
        match self {
            Nav::Submit => "Submit Sighting",
            Nav::Stats => "Monthly Stats",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Nav::Submit => "/submit",
            Nav::Stats => "/stats",
        }
    }
}

/// Status banner shown above page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Error(m) => m,
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "notice success",
            Notice::Info(_) => "notice info",
            Notice::Error(_) => "notice error",
        }
    }

    pub fn render(&self) -> String {
        let role = if matches!(self, Notice::Error(_)) { "alert" } else { "status" };
        format!(r#"<div class="{}" role="{role}">{}</div>"#, self.class(), escape(self.message()))
    }
}

/// One displayed column of a sightings table.
pub struct Column {
    pub header: &'static str,
    pub cell: fn(&Sighting) -> String,
}

pub fn table(columns: &[Column], rows: &[Sighting]) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for c in columns {
        let _ = write!(out, "<th>{}</th>", escape(c.header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for c in columns {
            let _ = write!(out, "<td>{}</td>", escape(&(c.cell)(row)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Wraps page content with the document shell and sidebar.
pub fn layout(active: Nav, heading: &str, content: &str) -> String {
    let mut nav = String::new();
    for item in Nav::ALL {
        let current = if item == active { r#" aria-current="page""# } else { "" };
        let _ = write!(nav, r#"<li><a href="{}"{current}>{}</a></li>"#, item.path(), escape(item.label()));
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - {app}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<nav class="sidebar" aria-label="Navigation"><h2>Navigation</h2><ul>{nav}</ul></nav>
<main>
<h1>{title}</h1>
{content}</main>
</body>
</html>
"#,
        title = escape(heading),
        app = APP_TITLE,
    )
}

/// Minimal page for requests that never reached a view.
pub fn error_page(status: u16, message: &str) -> String {
    layout(Nav::Submit, &format!("Error {status}"), &Notice::Error(message.to_string()).render())
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn selected(on: bool) -> &'static str {
    if on { " selected" } else { "" }
}
