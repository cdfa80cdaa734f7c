use std::borrow::Cow;

/// Which escaping rules apply to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escape {
    /// Element content: `&`, `<`, `>`.
    #[default]
    Body,
    /// Attribute values: additionally `'` and `"`.
    Attribute,
}

impl Escape {
    pub fn apply(self, text: &str) -> Cow<'_, str> {
        match self {
            Escape::Body => escape_body(text),
            Escape::Attribute => escape_attribute(text),
        }
    }
}

/// Escape text placed in element content.
pub fn escape_body(text: &str) -> Cow<'_, str> {
    escape_with(text, false)
}

/// Escape text placed inside an attribute value.
pub fn escape_attribute(text: &str) -> Cow<'_, str> {
    escape_with(text, true)
}

fn escape_with(text: &str, quotes: bool) -> Cow<'_, str> {
    let needs = |c: char| matches!(c, '&' | '<' | '>') || (quotes && matches!(c, '\'' | '"'));
    let Some(first) = text.find(needs) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(&text[..first]);
    for ch in text[first..].chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' if quotes => out.push_str("&#39;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_text_is_borrowed() {
        assert!(matches!(escape_attribute("plain words"), Cow::Borrowed(_)));
        assert!(matches!(escape_body("it's \"quoted\""), Cow::Borrowed(_)));
    }
}
