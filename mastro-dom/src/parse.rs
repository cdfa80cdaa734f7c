//! Lenient HTML fragment parser.
//!
//! Handles what server-rendered component markup needs:
//! - nested elements, void elements and self-closing tags (`<input/>`)
//! - quoted, unquoted and boolean attributes
//! - comments, a leading doctype, raw-text `script`/`style` content
//! - the character references the escaper produces plus numeric ones
//!
//! Malformed input never fails: unmatched end tags are dropped and open
//! elements are closed at the end of input.

/// A parsed fragment node, before it is inserted into a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Parsed>,
    },
    Text(String),
    Comment(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

struct Open {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Parsed>,
}

pub fn parse_fragment(input: &str) -> Vec<Parsed> {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut stack: Vec<Open> = Vec::new();
    let mut roots: Vec<Parsed> = Vec::new();

    fn push_child(stack: &mut [Open], roots: &mut Vec<Parsed>, node: Parsed) {
        match stack.last_mut() {
            Some(open) => open.children.push(node),
            None => roots.push(node),
        }
    }

    fn close(stack: &mut Vec<Open>, roots: &mut Vec<Parsed>) {
        if let Some(open) = stack.pop() {
            let node = Parsed::Element {
                tag: open.tag,
                attrs: open.attrs,
                children: open.children,
            };
            push_child(stack, roots, node);
        }
    }

    while i < bytes.len() {
        if input[i..].starts_with("<!--") {
            let body_start = i + 4;
            let end = input[body_start..]
                .find("-->")
                .map_or(bytes.len(), |p| body_start + p);
            push_child(
                &mut stack,
                &mut roots,
                Parsed::Comment(input[body_start..end].to_string()),
            );
            i = (end + 3).min(bytes.len());
            continue;
        }

        if input[i..].starts_with("<!") || input[i..].starts_with("<?") {
            // doctype / processing instruction
            i = input[i..].find('>').map_or(bytes.len(), |p| i + p + 1);
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            i += 2;
            let tag = read_name(bytes, &mut i).to_ascii_lowercase();
            i = input[i..].find('>').map_or(bytes.len(), |p| i + p + 1);
            // Close up to the matching element; ignore stray end tags.
            if let Some(depth) = stack.iter().rposition(|open| open.tag == tag) {
                while stack.len() > depth {
                    close(&mut stack, &mut roots);
                }
            }
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_alphabetic() {
            i += 1;
            let tag = read_name(bytes, &mut i).to_ascii_lowercase();
            let mut attrs: Vec<(String, String)> = Vec::new();
            let mut self_closing = false;

            loop {
                skip_ws(bytes, &mut i);
                if i >= bytes.len() {
                    break;
                }
                match bytes[i] {
                    b'/' => {
                        self_closing = true;
                        i += 1;
                    }
                    b'>' => {
                        i += 1;
                        break;
                    }
                    _ => match read_attribute(input, &mut i) {
                        Some((name, value)) => {
                            self_closing = false;
                            if !attrs.iter().any(|(n, _)| *n == name) {
                                attrs.push((name, value));
                            }
                        }
                        None => i += 1,
                    },
                }
            }

            if is_raw_text_element(&tag) && !self_closing {
                let end_tag = format!("</{tag}");
                let end = find_ignore_case(&input[i..], &end_tag).map_or(bytes.len(), |p| i + p);
                let raw = &input[i..end];
                let text = if tag == "script" || tag == "style" {
                    raw.to_string()
                } else {
                    decode_entities(raw)
                };
                let children = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Parsed::Text(text)]
                };
                push_child(&mut stack, &mut roots, Parsed::Element { tag, attrs, children });
                i = input[end..].find('>').map_or(bytes.len(), |p| end + p + 1);
                continue;
            }

            if self_closing || is_void_element(&tag) {
                push_child(
                    &mut stack,
                    &mut roots,
                    Parsed::Element {
                        tag,
                        attrs,
                        children: Vec::new(),
                    },
                );
            } else {
                stack.push(Open {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            }
            continue;
        }

        // text until the next tag-like `<`
        let start = i;
        i += 1;
        while i < bytes.len() && !starts_markup(bytes, i) {
            i += 1;
        }
        push_child(
            &mut stack,
            &mut roots,
            Parsed::Text(decode_entities(&input[start..i])),
        );
    }

    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

fn starts_markup(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'<'
        && bytes
            .get(i + 1)
            .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'/' || b == b'!' || b == b'?')
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_name<'a>(bytes: &'a [u8], i: &mut usize) -> &'a str {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b':' || c == b'.' {
            *i += 1;
        } else {
            break;
        }
    }
    std::str::from_utf8(&bytes[start..*i]).unwrap_or_default()
}

fn read_attribute(input: &str, i: &mut usize) -> Option<(String, String)> {
    let bytes = input.as_bytes();
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/' | b'"' | b'\'') {
            break;
        }
        *i += 1;
    }
    if *i == start {
        return None;
    }
    let name = input[start..*i].to_ascii_lowercase();

    let save = *i;
    skip_ws(bytes, i);
    if *i >= bytes.len() || bytes[*i] != b'=' {
        *i = save;
        return Some((name, String::new()));
    }
    *i += 1;
    skip_ws(bytes, i);

    let value = match bytes.get(*i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            *i += 1;
            let value_start = *i;
            while *i < bytes.len() && bytes[*i] != quote {
                *i += 1;
            }
            let raw = &input[value_start..*i];
            if *i < bytes.len() {
                *i += 1;
            }
            raw
        }
        _ => {
            let value_start = *i;
            while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
                *i += 1;
            }
            &input[value_start..*i]
        }
    };
    Some((name, decode_entities(value)))
}

/// Decode named references for the escaped characters, `&nbsp;`, and
/// numeric references. Anything else is left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi + 1)));
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#39;&#x41;&quot;"), "'A\"");
        assert_eq!(decode_entities("AT&T &unknown; &"), "AT&T &unknown; &");
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(
            parse_fragment("1 < 2"),
            vec![Parsed::Text("1 < 2".to_string())]
        );
    }
}
