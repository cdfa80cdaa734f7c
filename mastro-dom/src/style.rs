//! Inline `style` attribute and `dataset` name helpers.

/// Parse `a: b; c: d` into ordered declarations. Malformed parts are dropped.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for decl in style.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        if let Some((k, v)) = decl.split_once(':') {
            let (k, v) = (k.trim().to_ascii_lowercase(), v.trim().to_string());
            if k.is_empty() {
                continue;
            }
            match out.iter_mut().find(|(name, _)| *name == k) {
                Some(existing) => existing.1 = v,
                None => out.push((k, v)),
            }
        }
    }
    out
}

pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (k, v)) in decls.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(k);
        out.push_str(": ");
        out.push_str(v);
        out.push(';');
    }
    out
}

/// Look up one property in a style attribute.
pub fn style_lookup(style: Option<&str>, key: &str) -> Option<String> {
    let key = css_property_name(key);
    parse_declarations(style?)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Set (or with an empty value, remove) one property, keeping the others in order.
pub fn style_with(style: Option<&str>, key: &str, value: &str) -> String {
    let key = css_property_name(key);
    let value = value.trim();
    let mut decls = style.map(parse_declarations).unwrap_or_default();
    match decls.iter().position(|(k, _)| *k == key) {
        Some(pos) if value.is_empty() => {
            decls.remove(pos);
        }
        Some(pos) => decls[pos].1 = value.to_string(),
        None if value.is_empty() => {}
        None => decls.push((key, value.to_string())),
    }
    serialize_declarations(&decls)
}

/// `backgroundColor` and `background-color` both name `background-color`.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    camel_to_kebab(name)
}

/// `userId` -> `data-user-id`.
pub fn dataset_attribute(key: &str) -> String {
    format!("data-{}", camel_to_kebab(key))
}

/// `data-user-id` -> `userId`; `None` for attributes outside the dataset.
pub fn dataset_key(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix("data-")?;
    let mut out = String::with_capacity(rest.len());
    let mut upper = false;
    for ch in rest.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
