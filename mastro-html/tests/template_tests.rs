use mastro_html::{Node, RenderNow, Value, html, render_now};

fn render(node: Node) -> String {
    match render_now(node) {
        RenderNow::Ready(result) => result.unwrap(),
        RenderNow::Pending(_) => panic!("template should render synchronously"),
    }
}

#[test]
fn body_values_are_escaped() {
    let out = render(html!("<p>{}</p>", "<script>alert('x')</script>"));
    assert_eq!(out, "<p>&lt;script&gt;alert('x')&lt;/script&gt;</p>");
}

#[test]
fn quoted_attribute_values_use_attribute_escaping() {
    let out = render(html!("<div class=\"{}\"></div>", "my\"class"));
    assert_eq!(out, "<div class=\"my&quot;class\"></div>");
}

#[test]
fn unquoted_attribute_values_get_quotes() {
    assert_eq!(
        render(html!("<div class={}></div>", "my class")),
        "<div class=\"my class\"></div>"
    );
    assert_eq!(render(html!("<input value={}>", ())), "<input value=\"\">");
    assert_eq!(
        render(html!("<input disabled={} max={}>", true, 10)),
        "<input disabled=\"true\" max=\"10\">"
    );
}

#[test]
fn equals_sign_in_text_is_not_an_attribute() {
    assert_eq!(render(html!("<code>x={}</code>", 7)), "<code>x=7</code>");
}

#[test]
fn bare_value_inside_tag_is_not_quoted() {
    assert_eq!(render(html!("<input {}>", "required")), "<input required>");
}

#[test]
fn tag_context_carries_across_values() {
    let out = render(html!("<a href={} title={}>{}</a>", "/x?a=1&b=2", "it's", "<go>"));
    assert_eq!(
        out,
        "<a href=\"/x?a=1&amp;b=2\" title=\"it&#39;s\">&lt;go&gt;</a>"
    );
}

#[test]
fn null_renders_nothing() {
    let missing: Option<&str> = None;
    assert_eq!(render(html!("<p>{}</p>", missing)), "<p></p>");
}

#[test]
fn lists_are_spliced_in_body() {
    let items: Vec<Node> = ["a", "<b>"]
        .iter()
        .map(|item| html!("<li>{}</li>", *item))
        .collect();
    let node = html!("<ul>{}</ul>", items);
    assert_eq!(render(node), "<ul><li>a</li><li>&lt;b&gt;</li></ul>");
}

#[test]
fn lists_after_attribute_name_are_space_joined() {
    let classes = vec!["card", "active"];
    assert_eq!(
        render(html!("<div class={}></div>", classes)),
        "<div class=\"card active\"></div>"
    );
}

#[test]
fn nested_templates_are_not_escaped_again() {
    let inner = html!("<em>{}</em>", "&");
    assert_eq!(render(html!("<p>{}</p>", inner)), "<p><em>&amp;</em></p>");
}

#[test]
fn escaped_braces_stay_literal() {
    assert_eq!(render(html!("<style>p {{ color: red }}</style>")), "<style>p { color: red }</style>");
}

#[test]
fn numbers_print_like_the_web() {
    assert_eq!(render(html!("{} {} {} {}", 7.0, 1.5, f64::NAN, -0.0)), "7 1.5 NaN 0");
}

#[test]
fn pre_split_literals() {
    let node = mastro_html::html(
        &["<b title=", ">", "</b>"],
        vec![Value::from("t"), Value::from(3)],
    );
    assert_eq!(render(node), "<b title=\"t\">3</b>");
}

#[test]
fn value_count_mismatch_is_tolerated() {
    let fewer = mastro_html::html(&["<p>", "</p>", "!"], vec![Value::from("x")]);
    assert_eq!(render(fewer), "<p>x</p>!");

    let more = mastro_html::html(&["<p>", "</p>"], vec![Value::from("x"), Value::from("y")]);
    assert_eq!(render(more), "<p>x</p>y");
}
