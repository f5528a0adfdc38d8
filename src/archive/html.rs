//! HTML to visible text lines.

use scraper::{Html, Node};

/// Elements whose text never reaches the rendered page
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Flatten an HTML document into its visible text runs.
///
/// Every text node becomes one or more lines (embedded newlines split it),
/// internal whitespace is collapsed, and blank lines are dropped.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        for raw in text.lines() {
            let line = collapse_whitespace(raw);
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }

    lines
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_nodes_become_lines() {
        let html = "<html><body><table><tr><td>US Total Stock Market</td>\
                    <td><span>45.2%</span></td></tr></table></body></html>";
        assert_eq!(html_to_lines(html), vec!["US Total Stock Market", "45.2%"]);
    }

    #[test]
    fn test_hidden_content_is_dropped() {
        let html = "<html><head><title>Empower</title><style>td { color: red }</style></head>\
                    <body><script>var x = 1;</script><p>Equity</p><noscript>Enable JS</noscript></body></html>";
        assert_eq!(html_to_lines(html), vec!["Equity"]);
    }

    #[test]
    fn test_whitespace_and_entities() {
        let html = "<p>  Bond\n   Index&nbsp;Fund  </p><p>$1,000.00</p><div>   </div>";
        assert_eq!(html_to_lines(html), vec!["Bond", "Index Fund", "$1,000.00"]);
    }
}
