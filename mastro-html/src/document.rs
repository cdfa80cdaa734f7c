use crate::node::Node;

/// Pieces of a full HTML page.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    pub lang: Option<String>,
    pub title: String,
    /// Extra `<head>` content (styles, scripts).
    pub head: Node,
    pub body: Node,
}

/// A complete `<!DOCTYPE html>` document around `opts.body`.
pub fn html_document(opts: DocumentOptions) -> Node {
    crate::html!(
        "<!DOCTYPE html>\n<html lang={}>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n{}\n</head>\n<body>\n{}\n</body>\n</html>\n",
        opts.lang,
        opts.title,
        opts.head,
        opts.body,
    )
}
