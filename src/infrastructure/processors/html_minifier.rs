use once_cell::sync::Lazy;
use regex::Regex;

// Blocks whose whitespace is significant and must survive untouched
static PRESERVED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .unwrap()
});

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Whitespace next to these tags never renders
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(</?(?:address|article|aside|blockquote|body|caption|col|colgroup|dd|div|dl|dt|fieldset|figcaption|figure|footer|form|h[1-6]|head|header|hr|html|legend|li|link|main|meta|nav|ol|optgroup|option|p|section|table|tbody|td|tfoot|th|thead|title|tr|ul)(?:\s[^>]*)?/?>)\s*",
    )
    .unwrap()
});

/// Minify an HTML template for inlining as a string literal.
///
/// Comments are dropped and whitespace runs collapse to one space. Whitespace
/// is removed only next to block-level tags and at the ends; around inline
/// elements and text a single space stays. `pre`, `textarea`, `script` and
/// `style` blocks are copied verbatim.
pub fn minify_html(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for block in PRESERVED_BLOCK.find_iter(html) {
        output.push_str(&collapse(&html[last..block.start()]));
        output.push_str(block.as_str());
        last = block.end();
    }
    output.push_str(&collapse(&html[last..]));

    output.trim().to_string()
}

fn collapse(segment: &str) -> String {
    let without_comments = COMMENT.replace_all(segment, "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_comments, " ");
    BLOCK_TAG.replace_all(&collapsed, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_next_to_tags_is_removed() {
        assert_eq!(minify_html("<div>  Hi  </div>"), "<div>Hi</div>");
    }

    #[test]
    fn test_multiline_template() {
        let html = r#"
            <div class="pipeline">
                <!-- header -->
                <h3>{{ vm.title }}</h3>
                <span>two   words</span>
            </div>
        "#;

        assert_eq!(
            minify_html(html),
            r#"<div class="pipeline"><h3>{{ vm.title }}</h3><span>two words</span></div>"#
        );
    }

    #[test]
    fn test_spaces_around_inline_elements_are_kept() {
        assert_eq!(
            minify_html("<p><b>Note:</b> read <i>this</i>\n   now</p>"),
            "<p><b>Note:</b> read <i>this</i> now</p>"
        );
        assert_eq!(
            minify_html("<li>\n  <a href=\"#\">one</a>\n  <span>two</span>\n</li>"),
            "<li><a href=\"#\">one</a> <span>two</span></li>"
        );
    }

    #[test]
    fn test_custom_elements_are_treated_as_inline() {
        assert_eq!(
            minify_html("<div>\n  <p-label> x </p-label>\n</div>"),
            "<div><p-label> x </p-label></div>"
        );
    }

    #[test]
    fn test_pre_blocks_are_preserved() {
        let html = "<div>\n  <pre>  keep\n   this </pre>\n</div>";
        assert_eq!(minify_html(html), "<div><pre>  keep\n   this </pre></div>");
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        assert_eq!(minify_html("  just text \n"), "just text");
    }
}
