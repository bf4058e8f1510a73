//! Output documents.
//!
//! A [`Document`] is an ordered list of blocks built entirely in memory.
//! Writers turn it into a file only once it is complete, so a report that
//! fails to assemble never leaves a partial document behind.

use crate::chart::{BarChart, ChartRenderer, SvgChartRenderer, escape_xml};
use crate::error::{Result, SwarmError};
use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A table; the first row is the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// One element of a document, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Centered image, e.g. the campaign logo.
    Image { path: PathBuf, width_inches: f32 },
    /// Centered large title.
    Title { text: String },
    /// Centered date line under the title.
    Date { text: String },
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Table(Table),
    Chart(BarChart),
    NumberedList { items: Vec<String> },
    PageBreak,
}

/// A complete document with running header and footer text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Number of chart blocks.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Chart(_)))
            .count()
    }
}

/// Writes a finished document to disk.
pub trait DocumentWriter {
    /// # Errors
    ///
    /// Returns an error if any output file cannot be written.
    fn write(&self, document: &Document, path: &Path) -> Result<()>;
}

/// Output document formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Html,
    Markdown,
    Json,
}

impl DocumentFormat {
    pub const EXTENSIONS: &'static [&'static str] = &["html", "htm", "md", "json"];

    /// Pick the format for an output path.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidArgument`] for unsupported extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "html" | "htm" => Ok(Self::Html),
            "md" | "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(SwarmError::invalid_argument(format!(
                "cannot write a report to '{}': supported extensions are {}",
                path.display(),
                Self::EXTENSIONS.join(", ")
            ))),
        }
    }

    #[must_use]
    pub fn writer(self) -> Box<dyn DocumentWriter> {
        match self {
            Self::Html => Box::new(HtmlWriter::default()),
            Self::Markdown => Box::new(MarkdownWriter::default()),
            Self::Json => Box::new(JsonWriter),
        }
    }
}

/// Write a document in the format implied by the path's extension.
///
/// # Errors
///
/// Returns an error for unsupported extensions or failed writes.
pub fn write_document(document: &Document, path: &Path) -> Result<()> {
    let format = DocumentFormat::from_path(path)?;
    debug!(?format, path = %path.display(), "Writing document");
    format.writer().write(document, path)
}

fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| SwarmError::path_error("create directory", parent, e))?;
    }
    fs::write(path, content).map_err(|e| SwarmError::path_error("write", path, e))
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| SwarmError::path_error("read image", path, e))
}

/// MIME type for an image, by extension.
fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// HTML
// =============================================================================

const HTML_STYLE: &str = r#"body { font-family: "Helvetica Neue", Helvetica, Arial, sans-serif; font-size: 12pt; max-width: 50em; margin: 0 auto; }
h1, h2, h3 { font-size: 12pt; }
.running { text-align: center; color: #555555; }
.center { text-align: center; }
.title { font-size: 24pt; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #000000; padding: 4px 8px; text-align: left; }
figure { margin: 1em 0; text-align: center; }
.page-break { break-after: page; page-break-after: always; }"#;

/// Self-contained HTML: inline SVG charts, images embedded as `data:` URIs.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    pub charts: SvgChartRenderer,
}

impl HtmlWriter {
    /// Render the full page.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::PathError`] if an image cannot be read.
    pub fn render(&self, document: &Document) -> Result<String> {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{HTML_STYLE}\n</style>\n</head>\n<body>\n",
            escape_xml(&document.title)
        );
        if let Some(header) = &document.header {
            let _ = writeln!(html, "<header class=\"running\">{}</header>", escape_xml(header));
        }

        for block in &document.blocks {
            self.render_block(&mut html, block)?;
        }

        if let Some(footer) = &document.footer {
            let _ = writeln!(html, "<footer class=\"running\">{}</footer>", escape_xml(footer));
        }
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    fn render_block(&self, html: &mut String, block: &Block) -> Result<()> {
        match block {
            Block::Image { path, width_inches } => {
                let encoded = general_purpose::STANDARD.encode(read_image(path)?);
                let _ = writeln!(
                    html,
                    "<p class=\"center\"><img src=\"data:{};base64,{encoded}\" alt=\"logo\" style=\"width: {width_inches}in\"></p>",
                    image_mime(path)
                );
            }
            Block::Title { text } => {
                let _ = writeln!(html, "<p class=\"center title\">{}</p>", escape_xml(text));
            }
            Block::Date { text } => {
                let _ = writeln!(html, "<p class=\"center\">{}</p>", escape_xml(text));
            }
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                let _ = writeln!(html, "<h{level}>{}</h{level}>", escape_xml(text));
            }
            Block::Paragraph { text } => {
                let _ = writeln!(html, "<p>{}</p>", escape_xml(text));
            }
            Block::Table(table) => {
                html.push_str("<table>\n");
                for (idx, row) in table.rows.iter().enumerate() {
                    let cell = if idx == 0 { "th" } else { "td" };
                    html.push_str("<tr>");
                    for value in row {
                        let _ = write!(html, "<{cell}>{}</{cell}>", escape_xml(value));
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("</table>\n");
            }
            Block::Chart(chart) => {
                let _ = writeln!(html, "<figure>{}</figure>", self.charts.render(chart));
            }
            Block::NumberedList { items } => {
                html.push_str("<ol>\n");
                for item in items {
                    let _ = writeln!(html, "<li>{}</li>", escape_xml(item));
                }
                html.push_str("</ol>\n");
            }
            Block::PageBreak => html.push_str("<div class=\"page-break\"></div>\n"),
        }
        Ok(())
    }
}

impl DocumentWriter for HtmlWriter {
    fn write(&self, document: &Document, path: &Path) -> Result<()> {
        let html = self.render(document)?;
        write_file(path, html)
    }
}

// =============================================================================
// Markdown
// =============================================================================

/// Markdown with each chart written as an SVG file beside the document.
/// Images are copied next to the document as well.
#[derive(Debug, Default)]
pub struct MarkdownWriter {
    pub charts: SvgChartRenderer,
}

/// Markdown text plus the side files it links to.
#[derive(Debug, Default)]
pub struct MarkdownOutput {
    pub text: String,
    /// `(file name, svg)` per chart.
    pub charts: Vec<(String, String)>,
    /// `(file name, source path)` per image.
    pub images: Vec<(String, PathBuf)>,
}

impl MarkdownWriter {
    /// File name of the n-th chart (1-based) for a document path.
    #[must_use]
    pub fn chart_file_name(path: &Path, index: usize) -> String {
        let stem = path
            .file_stem()
            .map_or_else(|| "report".into(), |s| s.to_string_lossy());
        format!("{stem}_chart_{index:02}.svg")
    }

    /// File name of the n-th image (1-based), keeping the image's extension.
    #[must_use]
    pub fn image_file_name(path: &Path, image: &Path, index: usize) -> String {
        let stem = path
            .file_stem()
            .map_or_else(|| "report".into(), |s| s.to_string_lossy());
        let ext = image
            .extension()
            .map_or_else(|| "png".into(), |e| e.to_string_lossy());
        format!("{stem}_image_{index:02}.{ext}")
    }

    /// Render the document text and the side files it references.
    #[must_use]
    pub fn render(&self, document: &Document, path: &Path) -> MarkdownOutput {
        let mut md = String::new();
        let mut charts = Vec::new();
        let mut images = Vec::new();

        if let Some(header) = &document.header {
            let _ = writeln!(md, "<p align=\"center\"><em>{}</em></p>\n", escape_xml(header));
        }

        for block in &document.blocks {
            match block {
                Block::Image { path: image, .. } => {
                    let name = Self::image_file_name(path, image, images.len() + 1);
                    let _ = writeln!(
                        md,
                        "<p align=\"center\"><img src=\"{}\" alt=\"logo\"></p>\n",
                        escape_xml(&name)
                    );
                    images.push((name, image.clone()));
                }
                Block::Title { text } => {
                    let _ = writeln!(md, "<h1 align=\"center\">{}</h1>\n", escape_xml(text));
                }
                Block::Date { text } => {
                    let _ = writeln!(md, "<p align=\"center\">{}</p>\n", escape_xml(text));
                }
                Block::Heading { level, text } => {
                    let hashes = "#".repeat(usize::from((*level).clamp(1, 6)));
                    let _ = writeln!(md, "{hashes} {}\n", escape_xml(text));
                }
                Block::Paragraph { text } => {
                    let _ = writeln!(md, "{}\n", escape_xml(text));
                }
                Block::Table(table) => {
                    for (idx, row) in table.rows.iter().enumerate() {
                        let cells: Vec<String> =
                            row.iter().map(|c| escape_xml(c).replace('|', "\\|")).collect();
                        let _ = writeln!(md, "| {} |", cells.join(" | "));
                        if idx == 0 {
                            let _ = writeln!(md, "|{}", "---|".repeat(row.len()));
                        }
                    }
                    md.push('\n');
                }
                Block::Chart(chart) => {
                    let name = Self::chart_file_name(path, charts.len() + 1);
                    let _ = writeln!(md, "![{}]({name})\n", escape_xml(&chart.title));
                    charts.push((name, self.charts.render(chart)));
                }
                Block::NumberedList { items } => {
                    for (idx, item) in items.iter().enumerate() {
                        let _ = writeln!(md, "{}. {}", idx + 1, escape_xml(item));
                    }
                    md.push('\n');
                }
                Block::PageBreak => {
                    md.push_str("<div style=\"page-break-after: always\"></div>\n\n");
                }
            }
        }

        if let Some(footer) = &document.footer {
            let _ = writeln!(md, "<p align=\"center\"><em>{}</em></p>", escape_xml(footer));
        }
        MarkdownOutput {
            text: md,
            charts,
            images,
        }
    }
}

impl DocumentWriter for MarkdownWriter {
    fn write(&self, document: &Document, path: &Path) -> Result<()> {
        let output = self.render(document, path);
        // Read every image first so a missing one writes nothing.
        let images = output
            .images
            .iter()
            .map(|(name, source)| read_image(source).map(|bytes| (name, bytes)))
            .collect::<Result<Vec<_>>>()?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        for (name, svg) in &output.charts {
            write_file(&dir.join(name), svg)?;
        }
        for (name, bytes) in &images {
            write_file(&dir.join(name), bytes)?;
        }
        write_file(path, &output.text)
    }
}

// =============================================================================
// JSON
// =============================================================================

/// The document model as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonWriter;

impl DocumentWriter for JsonWriter {
    fn write(&self, document: &Document, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| SwarmError::with_context("Failed to serialize document", e))?;
        write_file(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Document {
        Document {
            title: "Week Five".into(),
            header: Some("LBC Swarm Campaign Report".into()),
            footer: Some("Private and Confidential".into()),
            blocks: vec![
                Block::Title {
                    text: "Week Five".into(),
                },
                Block::Heading {
                    level: 1,
                    text: "Summary".into(),
                },
                Block::Table(Table {
                    rows: vec![
                        vec!["".into(), "Views".into()],
                        vec!["Initial".into(), "3k".into()],
                    ],
                }),
                Block::Chart(BarChart::new(
                    "Total Swarms per Week",
                    "Week",
                    "Number of Swarms",
                    "darkorange",
                    vec![("1".into(), 2.0)],
                )),
                Block::NumberedList {
                    items: vec!["nice <3".into(), "again".into()],
                },
                Block::PageBreak,
            ],
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/report.HTML")).unwrap(),
            DocumentFormat::Html
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("report.md")).unwrap(),
            DocumentFormat::Markdown
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("report.json")).unwrap(),
            DocumentFormat::Json
        );
        let err = DocumentFormat::from_path(Path::new("report.docx")).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidArgument { .. }));
    }

    #[test]
    fn html_renders_blocks_in_order() {
        let html = HtmlWriter::default().render(&sample()).unwrap();
        let header = html.find("LBC Swarm Campaign Report").unwrap();
        let summary = html.find("<h1>Summary</h1>").unwrap();
        let table = html.find("<th>Views</th>").unwrap();
        let chart = html.find("<figure><svg").unwrap();
        let list = html.find("<li>nice &lt;3</li>").unwrap();
        let footer = html.find("Private and Confidential").unwrap();
        assert!(header < summary && summary < table && table < chart);
        assert!(chart < list && list < footer);
        assert!(html.contains("<td>Initial</td><td>3k</td>"));
        assert!(html.contains("class=\"page-break\""));
    }

    #[test]
    fn markdown_writes_chart_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("week_five.md");
        MarkdownWriter::default().write(&sample(), &path).unwrap();

        let md = fs::read_to_string(&path).unwrap();
        assert!(md.contains("# Summary"));
        assert!(md.contains("| Initial | 3k |"));
        assert!(md.contains("|---|---|"));
        assert!(md.contains("![Total Swarms per Week](week_five_chart_01.svg)"));
        assert!(md.contains("1. nice &lt;3\n2. again"));

        let svg = fs::read_to_string(dir.path().join("week_five_chart_01.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    fn with_logo(logo: &Path) -> Document {
        let mut doc = sample();
        doc.blocks.insert(
            0,
            Block::Image {
                path: logo.to_path_buf(),
                width_inches: 2.0,
            },
        );
        doc
    }

    #[test]
    fn html_embeds_logo() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("lbc_logo.png");
        fs::write(&logo, b"png").unwrap();
        let output = dir.path().join("out").join("nested").join("report.html");

        write_document(&with_logo(&logo), &output).unwrap();
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("<img src=\"data:image/png;base64,cG5n\" alt=\"logo\""));
        assert!(!html.contains("lbc_logo.png"));
    }

    #[test]
    fn html_missing_logo_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.html");
        let err = write_document(&with_logo(&dir.path().join("gone.png")), &output).unwrap_err();
        assert!(matches!(err, SwarmError::PathError { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn markdown_copies_logo_beside_document() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("lbc_logo.jpg");
        fs::write(&logo, b"jpeg bytes").unwrap();
        let output = dir.path().join("reports").join("week_five.md");

        write_document(&with_logo(&logo), &output).unwrap();
        let md = fs::read_to_string(&output).unwrap();
        assert!(md.contains("<img src=\"week_five_image_01.jpg\" alt=\"logo\">"));
        let copied = fs::read(dir.path().join("reports").join("week_five_image_01.jpg")).unwrap();
        assert_eq!(copied, b"jpeg bytes");
    }

    #[test]
    fn markdown_escapes_user_text() {
        let mut doc = sample();
        doc.blocks.push(Block::Paragraph {
            text: "Swarm URL: <script>x</script>".into(),
        });
        doc.blocks.push(Block::Heading {
            level: 2,
            text: "<b>bold</b>".into(),
        });
        let out = MarkdownWriter::default().render(&doc, Path::new("doc.md"));
        assert!(out.text.contains("Swarm URL: &lt;script&gt;x&lt;/script&gt;"));
        assert!(out.text.contains("## &lt;b&gt;bold&lt;/b&gt;"));
        assert!(!out.text.contains("<script>"));
        assert_eq!(out.charts.len(), 1);
        assert!(out.images.is_empty());
    }

    #[test]
    fn json_round_trips_block_tags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_document(&sample(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["blocks"][0]["type"], "title");
        assert_eq!(value["blocks"][2]["type"], "table");
        assert_eq!(value["blocks"][5]["type"], "page_break");
    }

    #[test]
    fn counts_charts() {
        assert_eq!(sample().chart_count(), 1);
    }
}
