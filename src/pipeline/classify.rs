//! Per-paper rendering and filter matching.
//!
//! Produces the plain-text and HTML blocks for one paper and evaluates the
//! configured filter terms against the HTML rendering. Matching is plain
//! case-sensitive substring containment.

use crate::models::{FilterConfig, Paper};

/// Plain and HTML renderings of one paper plus its match flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub html: String,
    pub matched: bool,
}

/// Render one paper and evaluate it against the filter terms.
pub fn render_paper(paper: &Paper, filters: &FilterConfig) -> Rendered {
    let category = paper.category();
    let date = paper.updated.format("%-m/%-d/%Y").to_string();
    let authors = join_authors(&paper.authors, &filters.collapse_authors);

    let text = format!(
        "\n----------------------------------------------------------\n{}\n{} [{}]\n{}\n{}\n{}\n",
        paper.title,
        paper.id,
        category.as_str(),
        date,
        authors,
        paper.summary
    );

    let cat_tag = format!(
        "<span style=\"color:{};\">[{}]</span>",
        category.color(),
        category.as_str()
    );
    let link = format!("<a href=\"{}\">{}</a>", paper.abs_url(), paper.id);

    let mut html = format!(
        "\n<hr>\n<h3>{}</h3>\n{}  {}  {}<br>\n<p><b>{}</b></p>\n<p style=\"font-size:0.9em;\">{}</p>\n<br>\n",
        paper.title, link, cat_tag, date, authors, paper.summary
    );

    // Terms are substituted sequentially over the accumulating string, so a
    // term can also match markup inserted by an earlier term. Known
    // limitation of plain substring matching.
    let mut title = paper.title.clone();
    let mut matched = false;
    for term in &filters.terms {
        if html.contains(term.as_str()) {
            let highlight = format!("<span style=\"color:red;\">{term}</span>");
            html = html.replace(term.as_str(), &highlight);
            title = title.replace(term.as_str(), &highlight);
            matched = true;
        }
    }

    // When highlighting touched the title, re-wrap the whole heading
    if matched && title != paper.title {
        html = html.replace(
            &title,
            &format!("<h3 style=\"color:red;\">{}</h3>", paper.title),
        );
    }

    Rendered {
        text,
        html,
        matched,
    }
}

/// Join author names, collapsing to a single collaboration name when one
/// appears in the list (large-collaboration papers list every member).
fn join_authors(authors: &[String], collapse: &[String]) -> String {
    let joined = authors.join(", ");
    for name in collapse {
        if joined.contains(name.as_str()) {
            return name.clone();
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn make_paper(title: &str, summary: &str, cat: &str) -> Paper {
        Paper {
            id: "1001.0001".to_string(),
            version: 1,
            primary_category: cat.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            authors: vec!["A. Author".to_string(), "B. Author".to_string()],
            published: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
            updated: Utc.with_ymd_and_hms(2026, 1, 6, 9, 30, 0).unwrap(),
            raw: json!({}),
        }
    }

    fn filters(terms: &[&str]) -> FilterConfig {
        FilterConfig {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            collapse_authors: vec!["LHCb collaboration".to_string()],
        }
    }

    #[test]
    fn test_unmatched_rendering() {
        let paper = make_paper("A quiet paper", "Nothing special here.", "hep-ex");
        let rendered = render_paper(&paper, &filters(&["Higgs"]));

        assert!(!rendered.matched);
        assert!(rendered.text.contains("A quiet paper"));
        assert!(rendered.text.contains("1001.0001 [hep-ex]"));
        assert!(rendered.text.contains("1/6/2026"));
        assert!(rendered.html.contains("<a href=\"https://arxiv.org/abs/1001.0001\">"));
        assert!(rendered.html.contains("color:darkred;"));
        assert!(!rendered.html.contains("color:red;"));
    }

    #[test]
    fn test_match_in_summary_highlights_term_only() {
        let paper = make_paper("A quiet paper", "We measure the Higgs width.", "hep-ph");
        let rendered = render_paper(&paper, &filters(&["Higgs"]));

        assert!(rendered.matched);
        assert!(
            rendered
                .html
                .contains("<span style=\"color:red;\">Higgs</span>")
        );
        // Title untouched, so the heading is not re-wrapped
        assert!(!rendered.html.contains("<h3 style=\"color:red;\">"));
    }

    #[test]
    fn test_match_in_title_rewraps_heading() {
        let paper = make_paper("Higgs couplings revisited", "An abstract.", "hep-ph");
        let rendered = render_paper(&paper, &filters(&["Higgs"]));

        assert!(rendered.matched);
        assert!(
            rendered
                .html
                .contains("<h3 style=\"color:red;\">Higgs couplings revisited</h3>")
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let paper = make_paper("A quiet paper", "the higgs boson", "hep-ph");
        let rendered = render_paper(&paper, &filters(&["Higgs"]));
        assert!(!rendered.matched);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let paper = make_paper("Higgs and tops", "Higgs production.", "hep-ph");
        let filters = filters(&["Higgs", "top"]);
        assert_eq!(render_paper(&paper, &filters), render_paper(&paper, &filters));
    }

    #[test]
    fn test_collaboration_name_collapses_author_list() {
        let mut paper = make_paper("A measurement", "An abstract.", "hep-ex");
        paper.authors = vec![
            "A. Author".to_string(),
            "LHCb collaboration".to_string(),
            "B. Author".to_string(),
        ];
        let rendered = render_paper(&paper, &filters(&["Higgs"]));

        assert!(rendered.text.contains("\nLHCb collaboration\n"));
        assert!(!rendered.text.contains("A. Author"));
    }

    #[test]
    fn test_term_can_match_inserted_markup() {
        // "red" occurs inside the span markup inserted for "Higgs"; the
        // sequential substitution re-matches it. This documents the known
        // limitation rather than desired behavior.
        let paper = make_paper("A quiet paper", "Higgs physics.", "hep-ph");
        let rendered = render_paper(&paper, &filters(&["Higgs", "red"]));

        assert!(rendered.matched);
        assert!(rendered.html.contains("<span style=\"color:red;\">red</span>"));
    }
}
