//! Pure text escaping utilities.
//!
//! These functions neutralize content that would otherwise break the MDX page
//! it is embedded in: HTML special characters, triple backticks that would
//! close an enclosing fence, and notebook-relative links.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

/// Escaped replacement for a literal triple backtick.
pub const ESCAPED_FENCE: &str = r"\`\`\`";

static NOTEBOOK_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(([^)]*)\.ipynb\)").expect("notebook link pattern")
});

static DOUBLED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(#.*) (.*)").expect("heading pattern"));

/// Escape HTML special characters.
///
/// `&` is replaced first so the entities introduced for `<` and `>` are not
/// escaped a second time. Quotes are left alone.
///
/// # Examples
///
/// ```
/// use nbdocs::markdown::escape_html;
///
/// assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Replace every literal ```` ``` ```` with an escaped form.
pub fn escape_backticks(text: &str) -> Cow<'_, str> {
    if text.contains("```") {
        Cow::Owned(text.replace("```", ESCAPED_FENCE))
    } else {
        Cow::Borrowed(text)
    }
}

/// Backtick escape followed by HTML escape, in that order.
pub fn escape_output_text(text: &str) -> String {
    escape_html(&escape_backticks(text))
}

/// Rewrite links to sibling notebooks so they point at the generated page.
///
/// Absolute URLs (anything containing `//`) are left untouched.
///
/// # Examples
///
/// ```
/// use nbdocs::markdown::rewrite_notebook_links;
///
/// assert_eq!(rewrite_notebook_links("[See ch1](./ch1.ipynb)", "md"), "[See ch1](./ch1.md)");
/// ```
pub fn rewrite_notebook_links<'a>(source: &'a str, extension: &str) -> Cow<'a, str> {
    NOTEBOOK_LINK.replace_all(source, |caps: &Captures| {
        let target = &caps[2];
        if target.contains("//") {
            caps[0].to_string()
        } else {
            format!("[{}]({}.{})", &caps[1], target, extension)
        }
    })
}

/// Drop the stray leading `#` of a cell that starts with `##...`.
///
/// Only the first line of the cell is considered and only when it has a
/// space after the run of `#`s.
pub fn fix_heading_level(source: &str) -> Cow<'_, str> {
    DOUBLED_HEADING.replace(source, "$1 $2")
}
