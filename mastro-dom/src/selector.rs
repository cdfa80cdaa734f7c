use crate::error::DomError;

#[derive(Debug, Clone, PartialEq)]
pub enum AttrOp {
    /// `[a=v]`
    Equals,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Contains,
    /// `[a~=v]`, one of the whitespace separated words
    Word,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute {
        name: String,
        op: Option<(AttrOp, String)>,
    },
}

impl SimpleSelector {
    fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        let attr = |name: &str| attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(t) => t == tag,
            SimpleSelector::Id(id) => attr("id") == Some(id.as_str()),
            SimpleSelector::Class(c) => attr("class")
                .is_some_and(|classes| classes.split_whitespace().any(|x| x == c)),
            SimpleSelector::Attribute { name, op } => match (attr(name), op) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(v), Some((op, want))) => match op {
                    AttrOp::Equals => v == want,
                    AttrOp::Prefix => !want.is_empty() && v.starts_with(want.as_str()),
                    AttrOp::Suffix => !want.is_empty() && v.ends_with(want.as_str()),
                    AttrOp::Contains => !want.is_empty() && v.contains(want.as_str()),
                    AttrOp::Word => v.split_whitespace().any(|w| w == want),
                },
            },
        }
    }
}

/// A comma separated list of compound selectors (`a.x[b], #y`).
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Vec<SimpleSelector>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector, DomError> {
        let error = |message: &str| DomError::Selector {
            selector: input.to_string(),
            message: message.to_string(),
        };

        let mut alternatives = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(error("empty selector"));
            }
            let mut compound = Vec::new();
            let mut rest = part;
            while !rest.is_empty() {
                let (simple, tail) = parse_simple(rest).map_err(error)?;
                compound.push(simple);
                rest = tail;
            }
            alternatives.push(compound);
        }
        Ok(Selector { alternatives })
    }

    pub fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.iter().all(|s| s.matches(tag, attrs)))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_')
}

fn split_name(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_name_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn parse_simple(s: &str) -> Result<(SimpleSelector, &str), &'static str> {
    let name = |rest: &str| -> Result<(String, usize), &'static str> {
        let (name, _) = split_name(rest);
        if name.is_empty() {
            return Err("expected a name");
        }
        Ok((name.to_string(), name.len()))
    };

    if let Some(rest) = s.strip_prefix('*') {
        return Ok((SimpleSelector::Universal, rest));
    }
    if let Some(rest) = s.strip_prefix('#') {
        let (id, len) = name(rest)?;
        return Ok((SimpleSelector::Id(id), &rest[len..]));
    }
    if let Some(rest) = s.strip_prefix('.') {
        let (class, len) = name(rest)?;
        return Ok((SimpleSelector::Class(class), &rest[len..]));
    }
    if let Some(rest) = s.strip_prefix('[') {
        let close = rest.find(']').ok_or("unclosed attribute selector")?;
        let (body, tail) = (&rest[..close], &rest[close + 1..]);
        return Ok((parse_attribute(body)?, tail));
    }
    if s.starts_with(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~')) {
        return Err("combinators are not supported");
    }
    let (tag, len) = name(s)?;
    Ok((SimpleSelector::Tag(tag.to_ascii_lowercase()), &s[len..]))
}

fn parse_attribute(body: &str) -> Result<SimpleSelector, &'static str> {
    let body = body.trim();
    let (name, rest) = split_name(body);
    if name.is_empty() {
        return Err("expected an attribute name");
    }
    let name = name.to_ascii_lowercase();
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(SimpleSelector::Attribute { name, op: None });
    }

    let (op, value) = [
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("*=", AttrOp::Contains),
        ("~=", AttrOp::Word),
        ("=", AttrOp::Equals),
    ]
    .into_iter()
    .find_map(|(token, op)| rest.strip_prefix(token).map(|value| (op, value)))
    .ok_or("unknown attribute operator")?;

    let value = value.trim();
    let value = match value.chars().next() {
        Some(q @ ('"' | '\'')) => value
            .strip_prefix(q)
            .and_then(|v| v.strip_suffix(q))
            .ok_or("unterminated quoted value")?,
        _ => value,
    };
    Ok(SimpleSelector::Attribute {
        name,
        op: Some((op, value.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn compound_and_lists() {
        let sel = Selector::parse("button.primary[data-onclick], #main").unwrap();
        assert!(sel.matches(
            "button",
            &attrs(&[("class", "big primary"), ("data-onclick", "go")])
        ));
        assert!(!sel.matches("button", &attrs(&[("class", "primary")])));
        assert!(sel.matches("div", &attrs(&[("id", "main")])));
    }

    #[test]
    fn attribute_operators() {
        let el = attrs(&[("data-bind", "class.on = isOn"), ("rel", "a b")]);
        for (sel, expected) in [
            ("[data-bind$=isOn]", true),
            ("[data-bind$='isOff']", false),
            ("[data-bind^=class]", true),
            ("[data-bind*=\"on =\"]", true),
            ("[rel~=b]", true),
            ("[rel~=a\\ b]", false),
            ("[rel=a b]", true),
        ] {
            assert_eq!(Selector::parse(sel).unwrap().matches("p", &el), expected, "{sel}");
        }
    }

    #[test]
    fn rejects_what_it_cannot_match() {
        assert!(Selector::parse("div p").is_err());
        assert!(Selector::parse("[x").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("[a|=b]").is_err());
    }
}
