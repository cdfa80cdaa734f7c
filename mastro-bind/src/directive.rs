use std::fmt;

use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;

use crate::error::BindError;

#[derive(pest_derive::Parser)]
#[grammar = "bind.pest"]
struct DirectiveParser;

/// A literal argument passed to a source or method.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Quoted text stays text; anything else is coerced like the web platform
    /// coerces attribute text: booleans, then numbers, then a trimmed string.
    fn from_bareword(word: &str) -> Literal {
        let word = word.trim();
        match word {
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            _ => match looks_numeric(word).then(|| word.parse::<f64>()) {
                Some(Ok(n)) => Literal::Number(n),
                _ => Literal::Str(word.to_string()),
            },
        }
    }
}

// Rust also parses `inf` and `NaN`; those stay strings here.
fn looks_numeric(word: &str) -> bool {
    word.trim_start_matches(['-', '+'])
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => f.write_str(s),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(n.into())
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

/// Which aspect of an element a binding writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Render the value and replace the element's content.
    InnerHtml,
    /// Toggle the class named by the subtarget on truthiness.
    Class,
    /// Hand the source itself to the element property named by the subtarget.
    Props,
    /// `target[subtarget] = value`, e.g. `style.display` or `dataset.id`.
    Nested,
    /// Plain property assignment.
    Property,
}

/// One parsed `data-bind` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct BindDescriptor {
    pub target: String,
    pub subtarget: Option<String>,
    pub source: String,
    pub args: Vec<Literal>,
}

impl BindDescriptor {
    pub fn target_kind(&self) -> TargetKind {
        match (self.target.as_str(), &self.subtarget) {
            ("class", _) => TargetKind::Class,
            ("props", _) => TargetKind::Props,
            (_, Some(_)) => TargetKind::Nested,
            ("innerHTML", None) => TargetKind::InnerHtml,
            (_, None) => TargetKind::Property,
        }
    }
}

impl fmt::Display for BindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target)?;
        if let Some(sub) = &self.subtarget {
            write!(f, ".{sub}")?;
        }
        write!(f, " = {}", self.source)?;
        write_args(f, &self.args)
    }
}

/// One parsed `data-on<event>` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDirective {
    pub method: String,
    pub args: Vec<Literal>,
}

impl fmt::Display for EventDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method)?;
        write_args(f, &self.args)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Literal]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match arg {
            Literal::Str(s) => write!(f, "'{s}'")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str(")")
}

/// Parse a single binding directive.
///
/// Without `=` the whole directive is the source and the target is
/// `innerHTML`. `class` and `props` need a subtarget.
pub fn parse(input: &str) -> Result<BindDescriptor, BindError> {
    let binding = parse_rule(Rule::binding, input)?;

    let mut target = "innerHTML".to_string();
    let mut subtarget = None;
    let mut source = String::new();
    let mut args = Vec::new();

    for pair in binding.into_inner() {
        match pair.as_rule() {
            Rule::lhs => {
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::target => target = part.as_str().to_string(),
                        Rule::subtarget => subtarget = Some(part.as_str().to_string()),
                        _ => {}
                    }
                }
            }
            Rule::call | Rule::ident => (source, args) = read_source(pair),
            _ => {}
        }
    }

    let descriptor = BindDescriptor {
        target,
        subtarget,
        source,
        args,
    };
    match descriptor.target_kind() {
        TargetKind::Class | TargetKind::Props if descriptor.subtarget.is_none() => {
            Err(BindError::MissingSubtarget {
                input: input.to_string(),
                target: descriptor.target,
            })
        }
        _ => Ok(descriptor),
    }
}

/// Parse every `;`-separated directive of a `data-bind` value on its own, so
/// one bad directive doesn't hide its siblings. Empty segments are skipped.
pub fn parse_all(input: &str) -> Vec<Result<BindDescriptor, BindError>> {
    split_directives(input).into_iter().map(parse).collect()
}

/// Split on `;` outside of quoted literals, dropping blank segments.
pub fn split_directives(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"') => quote = Some(ch),
            (None, ';') => {
                out.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&input[start..]);
    out.retain(|s| !s.trim().is_empty());
    out.into_iter().map(str::trim).collect()
}

/// Parse an event directive: `method`, `method(args)` or `owner#method(args)`.
/// The owner prefix is accepted and ignored.
pub fn parse_event(input: &str) -> Result<EventDirective, BindError> {
    let event = parse_rule(Rule::event, input)?;
    let (method, args) = event
        .into_inner()
        .find(|p| matches!(p.as_rule(), Rule::call | Rule::ident))
        .map(read_source)
        .unwrap_or_default();
    Ok(EventDirective { method, args })
}

/// Parse a bare, comma separated argument list (`'home', 3`).
pub fn parse_args(input: &str) -> Result<Vec<Literal>, BindError> {
    let list = parse_rule(Rule::arg_list, input)?;
    Ok(list
        .into_inner()
        .find(|p| p.as_rule() == Rule::args)
        .map(read_args)
        .unwrap_or_default())
}

fn parse_rule(rule: Rule, input: &str) -> Result<Pair<'_, Rule>, BindError> {
    let mut pairs = DirectiveParser::parse(rule, input).map_err(|err| {
        let column = match err.line_col {
            LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
        };
        BindError::Syntax {
            input: input.to_string(),
            column,
            message: err.variant.message().into_owned(),
        }
    })?;
    pairs.next().ok_or_else(|| BindError::Syntax {
        input: input.to_string(),
        column: 1,
        message: "empty directive".to_string(),
    })
}

fn read_source(pair: Pair<'_, Rule>) -> (String, Vec<Literal>) {
    match pair.as_rule() {
        Rule::call => {
            let mut name = String::new();
            let mut args = Vec::new();
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::ident => name = part.as_str().to_string(),
                    Rule::args => args = read_args(part),
                    _ => {}
                }
            }
            (name, args)
        }
        _ => (pair.as_str().to_string(), Vec::new()),
    }
}

fn read_args(args: Pair<'_, Rule>) -> Vec<Literal> {
    args.into_inner()
        .filter_map(|lit| match lit.as_rule() {
            Rule::quoted => {
                let text = lit.into_inner().next().map(|inner| inner.as_str()).unwrap_or("");
                Some(Literal::Str(text.to_string()))
            }
            Rule::bareword => Some(Literal::from_bareword(lit.as_str())),
            _ => None,
        })
        .collect()
}
