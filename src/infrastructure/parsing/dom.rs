//! Small helpers over `scraper` element references

use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use super::context::ParsingContext;
use super::ParsingError;

/// Concatenated text of the element and all of its descendants
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text of direct text-node children only
pub fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

pub fn inner_markup(element: ElementRef<'_>) -> String {
    element.inner_html()
}

/// Compile a selector, recording a warning instead of failing
pub fn compile_selector(selector: &str, context: &ParsingContext) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(compiled) => Some(compiled),
        Err(e) => {
            let error = ParsingError::invalid_selector(selector, e);
            warn!("Failed to compile selector: {}", error);
            context.add_warning("INVALID_SELECTOR", error.to_string());
            None
        }
    }
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Rows of a table, looking through `thead`/`tbody`/`tfoot` but never into
/// nested tables
pub fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child_elements(child).filter(|el| el.value().name() == "tr")),
            _ => {}
        }
    }
    rows
}

/// `td`/`th` cells of a row
pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    child_elements(row)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// Largest `colspan` honoured, as in the HTML table model
pub const MAX_COLSPAN: usize = 1000;
/// Largest `rowspan` honoured, as in the HTML table model
pub const MAX_ROWSPAN: usize = 65534;

/// Span attribute value; absent, unparsable or zero spans count as 1.
///
/// `colspan` is clamped to [`MAX_COLSPAN`], every other span to [`MAX_ROWSPAN`].
pub fn span_attr(element: ElementRef<'_>, name: &str) -> usize {
    let span = element
        .value()
        .attr(name)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|span| *span >= 1)
        .unwrap_or(1);

    let max = if name == "colspan" { MAX_COLSPAN } else { MAX_ROWSPAN };
    if span > max {
        debug!("Clamping {}={} to {}", name, span, max);
        return max;
    }
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(html: &'a Html, selector: &str) -> ElementRef<'a> {
        html.select(&Selector::parse(selector).unwrap()).next().unwrap()
    }

    #[test]
    fn test_own_text_skips_descendant_elements() {
        let html = Html::parse_fragment(r#"<p>Alien <span>(OV)</span> 3D</p>"#);
        let p = first(&html, "p");
        assert_eq!(own_text(p), "Alien  3D");
        assert_eq!(text_content(p), "Alien (OV) 3D");
        assert_eq!(inner_markup(p), "Alien <span>(OV)</span> 3D");
    }

    #[test]
    fn test_table_rows_skip_nested_tables() {
        let html = Html::parse_fragment(
            r#"<table><thead><tr><th>a</th></tr></thead><tbody>
               <tr><td><table><tr><td>nested</td></tr></table></td></tr>
               <tr><td>b</td></tr></tbody></table>"#,
        );
        let rows = table_rows(first(&html, "table"));
        assert_eq!(rows.len(), 3);
        assert_eq!(row_cells(rows[1]).len(), 1);
    }

    #[test]
    fn test_span_attr_defaults() {
        let html = Html::parse_fragment(
            r#"<table><tr>
                <td id="a" colspan="3"></td><td id="b" colspan="100%"></td><td id="c" rowspan="0"></td>
            </tr></table>"#,
        );
        assert_eq!(span_attr(first(&html, "#a"), "colspan"), 3);
        assert_eq!(span_attr(first(&html, "#b"), "colspan"), 1);
        assert_eq!(span_attr(first(&html, "#c"), "rowspan"), 1);
        assert_eq!(span_attr(first(&html, "#c"), "colspan"), 1);
    }

    #[test]
    fn test_span_attr_clamps_huge_spans() {
        let html = Html::parse_fragment(
            r#"<table><tr>
                <td id="a" rowspan="2000000" colspan="300000"></td><td id="b" colspan="1000"></td>
            </tr></table>"#,
        );
        assert_eq!(span_attr(first(&html, "#a"), "rowspan"), MAX_ROWSPAN);
        assert_eq!(span_attr(first(&html, "#a"), "colspan"), MAX_COLSPAN);
        assert_eq!(span_attr(first(&html, "#b"), "colspan"), 1000);
    }

    #[test]
    fn test_invalid_selector_becomes_warning() {
        let context = ParsingContext::root();
        assert!(compile_selector("a[", &context).is_none());
        assert_eq!(context.warnings()[0].code, "INVALID_SELECTOR");
    }
}
