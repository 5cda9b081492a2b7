//! Note body to card HTML conversion

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::{Captures, NoExpand, Regex};

use super::links::{has_image_extension, replace_wiki_links};

/// Text shown where an image used to be
pub const IMAGE_PLACEHOLDER: &str = "[image]";

static INLINE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}]+(?:[-_/][\p{L}\p{N}]+)*)").unwrap()
});
static MD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]\n]*\](?:\([^)\n]*\)|\[[^\]\n]*\])").unwrap());
static EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\[([^\[\]\n]+)\]\]").unwrap());
static HTML_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static TITLE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());

/// Options for [`transform_with`]
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub image_placeholder: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            image_placeholder: IMAGE_PLACEHOLDER.to_string(),
        }
    }
}

/// Result of converting a note body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    /// Card markup
    pub html: String,
    /// `#tags` found in the body, first-occurrence order, as written
    pub inline_tags: Vec<String>,
}

/// Convert a note body with the default options
pub fn transform(body: &str) -> Transformed {
    transform_with(body, &TransformOptions::default())
}

/// Convert a note body to card HTML.
///
/// Steps run in a fixed order: inline tags are collected (and stay in the
/// text), images become the placeholder, wiki-links become their display
/// text, then the remaining markdown is rendered.
pub fn transform_with(body: &str, options: &TransformOptions) -> Transformed {
    let inline_tags = extract_inline_tags(body);
    let placeholder = escape_markdown(&options.image_placeholder);

    let prepared = map_outside_markup(body, |segment| {
        let segment = replace_images(segment, &placeholder);
        replace_wiki_links(&segment, |link| escape_markdown(&link.display_text()))
    });

    Transformed {
        html: render_html(&prepared, &options.image_placeholder),
        inline_tags,
    }
}

/// Drop a leading `# Title` line when it repeats the note title
pub fn strip_title_heading(body: &str, title: &str) -> String {
    let trimmed = body.trim_start_matches(|c| c == '\n' || c == '\r');
    let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));

    let matches_title = TITLE_HEADING_RE
        .captures(first_line.trim_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase() == title.trim().to_lowercase())
        .unwrap_or(false);

    if matches_title {
        rest.trim_start_matches(|c| c == '\n' || c == '\r').to_string()
    } else {
        body.to_string()
    }
}

/// Extract inline tags from content (#tag), skipping code, raw HTML and
/// image alt text
pub fn extract_inline_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    map_outside_markup(content, |segment| {
        let segment = replace_images(segment, " ");
        for cap in INLINE_TAG_RE.captures_iter(&segment) {
            let Some(tag) = cap.get(1).map(|m| m.as_str()) else {
                continue;
            };
            // `#123` is an issue reference, not a tag
            if tag.chars().all(|c| c.is_numeric()) {
                continue;
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        String::new()
    });
    tags
}

/// Apply `f` to the parts of `text` that are not code, copying code verbatim
pub(crate) fn map_outside_code(text: &str, f: impl FnMut(&str) -> String) -> String {
    map_outside(text, &protected_ranges(text, false), f)
}

/// Like [`map_outside_code`], also leaving raw HTML untouched
fn map_outside_markup(text: &str, f: impl FnMut(&str) -> String) -> String {
    map_outside(text, &protected_ranges(text, true), f)
}

fn map_outside(text: &str, ranges: &[Range<usize>], mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for range in ranges {
        out.push_str(&f(&text[last..range.start]));
        out.push_str(&text[range.clone()]);
        last = range.end;
    }
    out.push_str(&f(&text[last..]));
    out
}

/// Byte ranges of code blocks (indented, fenced or left unclosed), code
/// spans and, with `include_html`, raw HTML, in document order
fn protected_ranges(text: &str, include_html: bool) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (event, range) in Parser::new_ext(text, parser_options()).into_offset_iter() {
        let protect = match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => true,
            Event::Start(Tag::HtmlBlock) | Event::InlineHtml(_) => include_html,
            _ => false,
        };
        if protect && ranges.last().map_or(true, |last| range.start >= last.end) {
            ranges.push(range);
        }
    }
    ranges
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Raw HTML passes through as is, minus image sources and link brackets
fn rewrite_raw_html(raw: &str, image_placeholder: &str) -> String {
    let placeholder = html_escape::encode_text(image_placeholder).to_string();
    let text = replace_wiki_links(raw, |link| {
        if link.is_image() {
            placeholder.clone()
        } else {
            html_escape::encode_text(&link.display_text()).to_string()
        }
    });
    HTML_IMAGE_RE.replace_all(&text, NoExpand(&placeholder)).to_string()
}

fn replace_images(segment: &str, placeholder: &str) -> String {
    let text = MD_IMAGE_RE.replace_all(segment, NoExpand(placeholder));
    let text = EMBED_RE.replace_all(&text, |caps: &Captures| {
        let target = caps[1].split(['|', '#']).next().unwrap_or_default();
        if has_image_extension(target) {
            placeholder.to_string()
        } else {
            caps[0].to_string()
        }
    });
    HTML_IMAGE_RE.replace_all(&text, NoExpand(placeholder)).to_string()
}

/// Backslash-escape characters markdown would otherwise interpret
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '!' | '|' | '~') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render markdown to HTML
fn render_html(markdown: &str, image_placeholder: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());

    let mut html = String::new();
    let mut in_code_block = false;
    let mut in_table_head = false;
    let mut image_depth = 0usize;

    for event in parser {
        // Alt text of any image that survived substitution is dropped
        if image_depth > 0 {
            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth -= 1,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::Paragraph) => html.push_str("<p>"),
            Event::End(TagEnd::Paragraph) => html.push_str("</p>\n"),
            Event::Start(Tag::Heading { level, .. }) => {
                html.push_str(&format!("<h{}>", heading_level_to_int(level)));
            }
            Event::End(TagEnd::Heading(level)) => {
                html.push_str(&format!("</h{}>\n", heading_level_to_int(level)));
            }
            Event::Start(Tag::BlockQuote) => html.push_str("<blockquote>\n"),
            Event::End(TagEnd::BlockQuote) => html.push_str("</blockquote>\n"),
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                if language.is_empty() {
                    html.push_str("<pre><code>");
                } else {
                    html.push_str(&format!(
                        "<pre><code class=\"language-{}\">",
                        html_escape::encode_double_quoted_attribute(&language)
                    ));
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                html.push_str("</code></pre>\n");
            }
            Event::Start(Tag::List(Some(1))) => html.push_str("<ol>\n"),
            Event::Start(Tag::List(Some(start))) => {
                html.push_str(&format!("<ol start=\"{}\">\n", start));
            }
            Event::Start(Tag::List(None)) => html.push_str("<ul>\n"),
            Event::End(TagEnd::List(true)) => html.push_str("</ol>\n"),
            Event::End(TagEnd::List(false)) => html.push_str("</ul>\n"),
            Event::Start(Tag::Item) => html.push_str("<li>"),
            Event::End(TagEnd::Item) => html.push_str("</li>\n"),
            Event::TaskListMarker(checked) => {
                let check_attr = if checked { " checked disabled" } else { " disabled" };
                html.push_str(&format!("<input type=\"checkbox\"{}/> ", check_attr));
            }
            Event::Start(Tag::Strong) => html.push_str("<b>"),
            Event::End(TagEnd::Strong) => html.push_str("</b>"),
            Event::Start(Tag::Emphasis) => html.push_str("<i>"),
            Event::End(TagEnd::Emphasis) => html.push_str("</i>"),
            Event::Start(Tag::Strikethrough) => html.push_str("<s>"),
            Event::End(TagEnd::Strikethrough) => html.push_str("</s>"),
            Event::Start(Tag::Link { dest_url, .. }) => {
                html.push_str(&format!(
                    "<a href=\"{}\">",
                    html_escape::encode_double_quoted_attribute(&dest_url)
                ));
            }
            Event::End(TagEnd::Link) => html.push_str("</a>"),
            Event::Start(Tag::Image { .. }) => {
                html.push_str(&html_escape::encode_text(image_placeholder));
                image_depth = 1;
            }
            Event::Start(Tag::Table(_)) => html.push_str("<table>\n"),
            Event::End(TagEnd::Table) => html.push_str("</tbody>\n</table>\n"),
            Event::Start(Tag::TableHead) => {
                in_table_head = true;
                html.push_str("<thead>\n<tr>");
            }
            Event::End(TagEnd::TableHead) => {
                in_table_head = false;
                html.push_str("</tr>\n</thead>\n<tbody>\n");
            }
            Event::Start(Tag::TableRow) => html.push_str("<tr>"),
            Event::End(TagEnd::TableRow) => html.push_str("</tr>\n"),
            Event::Start(Tag::TableCell) => {
                html.push_str(if in_table_head { "<th>" } else { "<td>" });
            }
            Event::End(TagEnd::TableCell) => {
                html.push_str(if in_table_head { "</th>" } else { "</td>" });
            }
            Event::Text(text) => {
                html.push_str(&html_escape::encode_text(&text));
            }
            Event::Code(text) => {
                html.push_str(&format!("<code>{}</code>", html_escape::encode_text(&text)));
            }
            Event::Html(raw) | Event::InlineHtml(raw) => {
                html.push_str(&rewrite_raw_html(&raw, image_placeholder));
            }
            Event::SoftBreak => {
                html.push(if in_code_block { '\n' } else { ' ' });
            }
            Event::HardBreak => html.push_str("<br>\n"),
            Event::Rule => html.push_str("<hr>\n"),
            _ => {}
        }
    }

    let html = html.trim_end().to_string();
    unwrap_single_paragraph(html)
}

/// A note that is one paragraph renders as bare inline markup
fn unwrap_single_paragraph(html: String) -> String {
    if html.starts_with("<p>") && html.ends_with("</p>") && html.matches("<p>").count() == 1 {
        html["<p>".len()..html.len() - "</p>".len()].to_string()
    } else {
        html
    }
}

/// Convert heading level enum to integer
fn heading_level_to_int(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
