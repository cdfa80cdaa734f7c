use tracing::error;

use crate::escape::Escape;
use crate::node::Node;
use crate::value::Value;

/// Build a node from literal segments and the values between them.
///
/// `literals.len()` should be `values.len() + 1`. Literals are trusted
/// markup; values are escaped according to where they land:
///
/// - in element content they are body-escaped;
/// - inside a tag they are attribute-escaped, and right after `name=` they
///   are also wrapped in double quotes, so `<input value=${v}>` stays valid
///   for empty and boolean values;
/// - `Null` renders nothing, lists are spliced in place (joined with single
///   spaces after `name=`), and nodes are inserted as they are.
pub fn html<S: AsRef<str>>(literals: &[S], values: Vec<Value>) -> Node {
    let expected = literals.len().saturating_sub(1);
    if values.len() != expected {
        error!(
            literals = literals.len(),
            values = values.len(),
            "template expects one value between each pair of literals"
        );
    }

    let mut out = Vec::with_capacity(literals.len() + values.len() * 3);
    let mut values = values.into_iter();
    let mut inside_tag = false;

    for (i, literal) in literals.iter().enumerate() {
        let literal = literal.as_ref();
        if !literal.is_empty() {
            out.push(Node::raw(literal));
        }
        inside_tag = tag_depth_after(inside_tag, literal) == 1;

        if i == expected {
            break;
        }
        let Some(value) = values.next() else {
            continue;
        };
        if inside_tag && ends_with_attribute_name(literal) {
            out.push(Node::raw("\""));
            out.push(match value {
                Value::List(_) => Node::attribute_text(value.to_string()),
                other => other.into_node(Escape::Attribute),
            });
            out.push(Node::raw("\""));
        } else if inside_tag {
            splice(&mut out, value.into_node(Escape::Attribute));
        } else {
            splice(&mut out, value.into_node(Escape::Body));
        }
    }

    for extra in values {
        splice(&mut out, extra.into_node(Escape::Body));
    }

    Node::Sequence(out)
}

/// Format-string shaped front end for [`html`]: `{}` marks a value, `{{` and
/// `}}` are literal braces. Used by the [`html!`](crate::html!) macro.
pub fn html_fmt(template: &str, values: Vec<Value>) -> Node {
    html(&split_placeholders(template), values)
}

fn split_placeholders(template: &str) -> Vec<String> {
    let mut literals = vec![String::new()];
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('{', Some('}')) => {
                chars.next();
                literals.push(String::new());
            }
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                push_char(&mut literals, ch);
            }
            _ => push_char(&mut literals, ch),
        }
    }
    literals
}

fn push_char(literals: &mut [String], ch: char) {
    if let Some(last) = literals.last_mut() {
        last.push(ch);
    }
}

fn tag_depth_after(inside_tag: bool, literal: &str) -> i64 {
    let opens = literal.matches('<').count() as i64;
    let closes = literal.matches('>').count() as i64;
    i64::from(inside_tag) + opens - closes
}

fn ends_with_attribute_name(literal: &str) -> bool {
    let Some(before) = literal.strip_suffix('=') else {
        return false;
    };
    before
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn splice(out: &mut Vec<Node>, node: Node) {
    match node {
        Node::Sequence(children) => out.extend(children),
        other => out.push(other),
    }
}

/// Build a template node. Literals are trusted markup, values go through
/// [`Value`] and are escaped by context.
///
/// ```
/// use mastro_html::{html, render_now, RenderNow};
///
/// let title = "<Fish & Chips>";
/// let node = html!("<h1 class={}>{}</h1>", "big", title);
/// let RenderNow::Ready(Ok(out)) = render_now(node) else { unreachable!() };
/// assert_eq!(out, "<h1 class=\"big\">&lt;Fish &amp; Chips&gt;</h1>");
/// ```
#[macro_export]
macro_rules! html {
    ($template:expr $(,)?) => {
        $crate::template::html_fmt($template, ::std::vec::Vec::new())
    };
    ($template:expr, $($value:expr),+ $(,)?) => {
        $crate::template::html_fmt($template, ::std::vec![$($crate::Value::from($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_split_literals() {
        assert_eq!(split_placeholders("a{}b{}c"), vec!["a", "b", "c"]);
        assert_eq!(split_placeholders("{}"), vec!["", ""]);
        assert_eq!(split_placeholders("f({{ {} }})"), vec!["f({ ", " })"]);
    }

    #[test]
    fn tag_context_spans_literals() {
        assert_eq!(tag_depth_after(false, "<div class="), 1);
        assert_eq!(tag_depth_after(true, " id="), 1);
        assert_eq!(tag_depth_after(true, ">text"), 0);
        assert_eq!(tag_depth_after(false, "<p>text"), 0);
    }

    #[test]
    fn attribute_name_detection() {
        assert!(ends_with_attribute_name("<a href="));
        assert!(ends_with_attribute_name("<x-item data-id="));
        assert!(!ends_with_attribute_name("<p>x =="));
        assert!(!ends_with_attribute_name("<p "));
    }
}
