use mastro_html::{Escape, Node, escape_attribute, escape_body, render_to_string};

#[test]
fn body_escapes_three_characters() {
    assert_eq!(escape_body("a & b < c > d"), "a &amp; b &lt; c &gt; d");
    assert_eq!(escape_body("it's \"fine\""), "it's \"fine\"");
}

#[test]
fn attribute_escapes_quotes_too() {
    assert_eq!(
        escape_attribute(r#"<a href="x">it's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;it&#39;s&lt;/a&gt;"
    );
}

#[test]
fn ampersand_is_escaped_once() {
    assert_eq!(escape_body("&amp;"), "&amp;amp;");
    assert_eq!(Escape::Attribute.apply("&&"), "&amp;&amp;");
}

#[test]
fn raw_nodes_bypass_escaping() {
    let node = Node::Sequence(vec![
        Node::raw("<b>"),
        Node::text("<i>"),
        Node::attribute_text("\"q\""),
        Node::raw("</b>"),
    ]);
    let out = pollster::block_on(render_to_string(node)).unwrap();
    assert_eq!(out, "<b>&lt;i&gt;&quot;q&quot;</b>");
}
