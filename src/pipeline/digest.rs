//! Digest assembly.
//!
//! Accumulates per-bucket fragments during ingestion and renders the final
//! plain-text and HTML documents through a small section-based document
//! builder, keeping layout testable apart from string templating.

use std::collections::HashMap;

use crate::models::Category;
use crate::pipeline::classify::Rendered;

/// A finished digest ready for delivery.
#[derive(Debug, Clone)]
pub struct Digest {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// One section of an outgoing document.
#[derive(Debug, Clone)]
enum Section {
    /// Free-form block present in both renderings.
    Block { plain: String, html: String },
    /// Category bucket: the HTML side gets a colored heading.
    Bucket { heading: String, plain: String, html: String },
    /// Divider between the matched and unmatched halves.
    Divider { title: Option<String> },
}

/// Ordered list of sections rendered to plain text and HTML.
#[derive(Debug, Clone, Default)]
struct Document {
    sections: Vec<Section>,
}

impl Document {
    fn push_block(&mut self, plain: impl Into<String>, html: impl Into<String>) {
        self.sections.push(Section::Block {
            plain: plain.into(),
            html: html.into(),
        });
    }

    fn push_bucket(
        &mut self,
        heading: impl Into<String>,
        plain: impl Into<String>,
        html: impl Into<String>,
    ) {
        self.sections.push(Section::Bucket {
            heading: heading.into(),
            plain: plain.into(),
            html: html.into(),
        });
    }

    fn push_divider(&mut self, title: Option<&str>) {
        self.sections.push(Section::Divider {
            title: title.map(str::to_string),
        });
    }

    fn render_plain(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            match section {
                Section::Block { plain, .. } => {
                    out.push_str(plain);
                    out.push('\n');
                }
                Section::Bucket { plain, .. } => {
                    out.push_str(plain);
                    out.push('\n');
                }
                Section::Divider { .. } => {
                    out.push_str(&"-".repeat(66));
                    out.push('\n');
                }
            }
        }
        out
    }

    fn render_html(&self) -> String {
        let mut out = String::from("<html>\n<head></head>\n<body>\n");
        for section in &self.sections {
            match section {
                Section::Block { html, .. } => {
                    out.push_str(html);
                    out.push('\n');
                }
                Section::Bucket { heading, html, .. } => {
                    out.push_str("<hr>\n<h2>");
                    out.push_str(heading);
                    out.push_str("</h2>\n");
                    out.push_str(html);
                    out.push('\n');
                }
                Section::Divider { title } => {
                    out.push_str("<br>\n<br>\n<hr>\n<hr>\n");
                    if let Some(title) = title {
                        out.push_str("<h1>");
                        out.push_str(title);
                        out.push_str("</h1>\n");
                    }
                }
            }
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

/// Accumulated fragments for one category bucket.
#[derive(Debug, Clone, Default)]
struct Bucket {
    matched_text: String,
    matched_html: String,
    unmatched_text: String,
    unmatched_html: String,
}

/// Accumulates classified renderings and assembles the digest documents.
#[derive(Debug, Clone, Default)]
pub struct DigestBuilder {
    buckets: HashMap<Category, Bucket>,
    matched_counts: HashMap<Category, usize>,
    num_total: usize,
    num_matched: usize,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one classified rendering to its bucket, in encounter order.
    pub fn push(&mut self, category: Category, rendered: &Rendered) {
        self.num_total += 1;
        let bucket = self.buckets.entry(category).or_default();
        if rendered.matched {
            self.num_matched += 1;
            *self.matched_counts.entry(category).or_insert(0) += 1;
            bucket.matched_text.push_str(&rendered.text);
            bucket.matched_html.push_str(&rendered.html);
        } else {
            bucket.unmatched_text.push_str(&rendered.text);
            bucket.unmatched_html.push_str(&rendered.html);
        }
    }

    /// Total records accumulated.
    pub fn total(&self) -> usize {
        self.num_total
    }

    /// Records that matched at least one filter term.
    pub fn matched(&self) -> usize {
        self.num_matched
    }

    /// Matched count for one bucket.
    pub fn matched_in(&self, category: Category) -> usize {
        self.matched_counts.get(&category).copied().unwrap_or(0)
    }

    /// Subject line for the outgoing mail.
    pub fn subject(&self) -> String {
        format!(
            "arXiv digest: {} new, {} matched",
            self.num_total, self.num_matched
        )
    }

    fn summary(&self) -> String {
        let mut out = format!(
            "Found {} new entries; {} matched your filter terms:\n",
            self.num_total, self.num_matched
        );
        for category in Category::ALL {
            out.push_str(&format!(
                "   - {:6} = {}\n",
                category.as_str(),
                self.matched_in(category)
            ));
        }
        out
    }

    /// Assemble the final documents and subject line.
    pub fn finish(&self, greeting: &str) -> Digest {
        let summary = self.summary();

        let mut doc = Document::default();
        doc.push_block(greeting, format!("<p>{greeting}</p>"));
        doc.push_block(
            summary.clone(),
            format!("<p>{}</p>", summary.replace('\n', "<br>\n")),
        );

        let empty = Bucket::default();
        for category in Category::ALL {
            let bucket = self.buckets.get(&category).unwrap_or(&empty);
            doc.push_bucket(
                html_heading(category),
                bucket.matched_text.clone(),
                bucket.matched_html.clone(),
            );
        }

        doc.push_divider(Some("Unmatched"));

        for category in Category::ALL {
            let bucket = self.buckets.get(&category).unwrap_or(&empty);
            doc.push_bucket(
                html_heading(category),
                bucket.unmatched_text.clone(),
                bucket.unmatched_html.clone(),
            );
        }

        Digest {
            subject: self.subject(),
            text: doc.render_plain(),
            html: doc.render_html(),
        }
    }
}

/// Colored HTML heading for a category section.
fn html_heading(category: Category) -> String {
    format!(
        "<span style=\"color:{};\">{}</span>",
        category.color(),
        category.as_str()
    )
}
