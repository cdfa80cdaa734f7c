use anyhow::{bail, Context, Result};
use futures::StreamExt;
use mastro_bind::{parse, parse_args, parse_event, split_directives, BindDescriptor};
use mastro_dom::{parse_fragment, Parsed};
use mastro_html::{html_document, render_to_stream, render_to_string, DocumentOptions, Node};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One directive found in markup, with the custom element that will wire it.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveReport {
    /// Nearest enclosing custom element; `None` outside any component.
    pub owner: Option<String>,
    pub element: String,
    pub attribute: String,
    pub directive: String,
    /// The parsed form, or the parse error.
    pub outcome: Result<String, String>,
}

impl DirectiveReport {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Every `data-bind`, `data-on*`, `data-args` and `data-props` directive in
/// `html`, in document order.
pub fn check_markup(html: &str) -> Vec<DirectiveReport> {
    let mut out = Vec::new();
    walk(&parse_fragment(html), None, &mut out);
    out
}

fn walk(nodes: &[Parsed], owner: Option<&str>, out: &mut Vec<DirectiveReport>) {
    for node in nodes {
        let Parsed::Element {
            tag,
            attrs,
            children,
        } = node
        else {
            continue;
        };
        for (name, value) in attrs {
            let report = |directive: &str, outcome: Result<String, String>| DirectiveReport {
                owner: owner.map(str::to_string),
                element: tag.clone(),
                attribute: name.clone(),
                directive: directive.to_string(),
                outcome,
            };
            if name == "data-bind" {
                for part in split_directives(value) {
                    let outcome = parse(part).map(|d| describe(&d)).map_err(|e| e.to_string());
                    out.push(report(part, outcome));
                }
            } else if name == "data-args" {
                let outcome = parse_args(value)
                    .map(|args| format!("{} argument(s)", args.len()))
                    .map_err(|e| e.to_string());
                out.push(report(value, outcome));
            } else if name == "data-props" {
                out.push(report(value, check_props(value)));
            } else if name.starts_with("data-on") {
                let outcome = parse_event(value)
                    .map(|d| format!("call {d}"))
                    .map_err(|e| e.to_string());
                out.push(report(value, outcome));
            }
        }
        let inner = if tag.contains('-') {
            Some(tag.as_str())
        } else {
            owner
        };
        walk(children, inner, out);
    }
}

fn describe(descriptor: &BindDescriptor) -> String {
    format!("{descriptor} [{:?}]", descriptor.target_kind())
}

fn check_props(value: &str) -> Result<String, String> {
    let mut pairs = Vec::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((prop, source)) if !prop.trim().is_empty() && !source.trim().is_empty() => {
                pairs.push(format!("props.{} = {}", prop.trim(), source.trim()));
            }
            _ => return Err(format!("expected `prop=source`, got `{pair}`")),
        }
    }
    Ok(pairs.join("; "))
}

/// Report the directives of each file. Returns how many are invalid.
pub fn check_cmd(files: &[&Path], out: &mut impl Write) -> Result<usize> {
    let mut invalid = 0;
    for file in files {
        let src = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let reports = check_markup(&src);
        writeln!(out, "{}: {} directive(s)", file.display(), reports.len())?;
        for r in &reports {
            let owner = r.owner.as_deref().unwrap_or("(none)");
            match &r.outcome {
                Ok(parsed) => writeln!(out, "  <{owner}> {}[{}] {parsed}", r.element, r.attribute)?,
                Err(err) => {
                    invalid += 1;
                    writeln!(out, "  <{owner}> {}[{}] error: {err}", r.element, r.attribute)?
                }
            }
        }
        tracing::debug!(file = %file.display(), directives = reports.len(), "checked");
    }
    Ok(invalid)
}

/// Print the parsed form of one `data-bind` value (or event directive).
pub fn parse_cmd(input: &str, event: bool, out: &mut impl Write) -> Result<()> {
    if event {
        let directive = parse_event(input)?;
        writeln!(out, "method: {}", directive.method)?;
        writeln!(out, "args:   {:?}", directive.args)?;
        return Ok(());
    }

    let mut failed = 0;
    for part in split_directives(input) {
        match parse(part) {
            Ok(d) => {
                writeln!(out, "{}", describe(&d))?;
                writeln!(out, "  target:    {}", d.target)?;
                if let Some(sub) = &d.subtarget {
                    writeln!(out, "  subtarget: {sub}")?;
                }
                writeln!(out, "  source:    {}", d.source)?;
                writeln!(out, "  args:      {:?}", d.args)?;
            }
            Err(err) => {
                failed += 1;
                writeln!(out, "error: {err}")?;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} directive(s) failed to parse");
    }
    Ok(())
}

/// Wrap an HTML fragment file in a document shell and render it, either
/// buffered or chunk by chunk.
pub fn render_cmd(
    input: &Path,
    title: Option<&str>,
    stream: bool,
    out: &mut impl Write,
) -> Result<()> {
    let body =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let title = title
        .map(str::to_string)
        .or_else(|| input.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_default();
    let page = html_document(DocumentOptions {
        lang: Some("en".to_string()),
        title,
        head: Node::empty(),
        body: Node::raw(body),
    });

    if stream {
        pollster::block_on(async {
            let mut chunks = render_to_stream(page);
            while let Some(chunk) = chunks.next().await {
                out.write_all(chunk?.as_bytes())?;
                out.flush()?;
            }
            Ok::<_, anyhow::Error>(())
        })
    } else {
        let html = pollster::block_on(render_to_string(page))?;
        out.write_all(html.as_bytes())?;
        Ok(())
    }
}
