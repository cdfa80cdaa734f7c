use mastro_bind::{
    BindDescriptor, BindError, EventDirective, Literal, TargetKind, parse, parse_all, parse_args,
    parse_event,
};

fn descriptor(
    target: &str,
    subtarget: Option<&str>,
    source: &str,
    args: Vec<Literal>,
) -> BindDescriptor {
    BindDescriptor {
        target: target.to_string(),
        subtarget: subtarget.map(str::to_string),
        source: source.to_string(),
        args,
    }
}

#[test]
fn bare_source_targets_inner_html() {
    assert_eq!(
        parse("value").unwrap(),
        descriptor("innerHTML", None, "value", vec![])
    );
}

#[test]
fn call_with_literal_args() {
    assert_eq!(
        parse("fn('str', 7, true,false)").unwrap(),
        descriptor(
            "innerHTML",
            None,
            "fn",
            vec!["str".into(), 7.into(), true.into(), false.into()]
        )
    );
}

#[test]
fn property_assignment() {
    let d = parse("required=value").unwrap();
    assert_eq!(d, descriptor("required", None, "value", vec![]));
    assert_eq!(d.target_kind(), TargetKind::Property);
}

#[test]
fn nested_assignment() {
    let d = parse("style.display = value").unwrap();
    assert_eq!(d, descriptor("style", Some("display"), "value", vec![]));
    assert_eq!(d.target_kind(), TargetKind::Nested);
}

#[test]
fn nested_assignment_with_call() {
    assert_eq!(
        parse("prop.subprop = fn('str')").unwrap(),
        descriptor("prop", Some("subprop"), "fn", vec!["str".into()])
    );
}

#[test]
fn target_kinds() {
    assert_eq!(parse("x").unwrap().target_kind(), TargetKind::InnerHtml);
    assert_eq!(parse("class.active = on").unwrap().target_kind(), TargetKind::Class);
    assert_eq!(parse("props.count = count").unwrap().target_kind(), TargetKind::Props);
    assert_eq!(parse("dataset.id = id").unwrap().target_kind(), TargetKind::Nested);
}

#[test]
fn empty_call_and_whitespace() {
    assert_eq!(
        parse("  title =  label( )  ").unwrap(),
        descriptor("title", None, "label", vec![])
    );
}

#[test]
fn quoted_literals_keep_their_content() {
    let d = parse(r#"f("a, b", ' padded ', '')"#).unwrap();
    assert_eq!(
        d.args,
        vec![Literal::from("a, b"), Literal::from(" padded "), Literal::from("")]
    );
}

#[test]
fn barewords_are_trimmed_strings_unless_numeric() {
    let d = parse("f( home page , -2.5, 1e3 )").unwrap();
    assert_eq!(
        d.args,
        vec![
            Literal::Str("home page".into()),
            Literal::Number(-2.5),
            Literal::Number(1000.0)
        ]
    );
}

#[test]
fn class_and_props_need_a_subtarget() {
    assert!(matches!(
        parse("class = active"),
        Err(BindError::MissingSubtarget { target, .. }) if target == "class"
    ));
    assert!(matches!(
        parse("props = count"),
        Err(BindError::MissingSubtarget { target, .. }) if target == "props"
    ));
}

#[test]
fn malformed_directives_are_errors() {
    for input in ["", "=value", "a.b.c = x", "f(g(1))", "a = ", "x = f('open"] {
        assert!(
            matches!(parse(input), Err(BindError::Syntax { .. })),
            "expected a syntax error for {input:?}"
        );
    }
}

#[test]
fn one_bad_directive_does_not_hide_siblings() {
    let results = parse_all("class.big = isBig; = broken ; title=label;");
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].as_ref().unwrap(),
        &descriptor("class", Some("big"), "isBig", vec![])
    );
    assert!(results[1].is_err());
    assert_eq!(
        results[2].as_ref().unwrap(),
        &descriptor("title", None, "label", vec![])
    );
}

#[test]
fn event_directives() {
    assert_eq!(
        parse_event("increment").unwrap(),
        EventDirective {
            method: "increment".into(),
            args: vec![]
        }
    );
    assert_eq!(
        parse_event("todo-list#remove(3, 'x')").unwrap(),
        EventDirective {
            method: "remove".into(),
            args: vec![3.into(), "x".into()]
        }
    );
    assert!(parse_event("a b").is_err());
}

#[test]
fn legacy_argument_lists() {
    assert_eq!(
        parse_args("home, 3").unwrap(),
        vec![Literal::from("home"), Literal::from(3)]
    );
    assert_eq!(parse_args("  ").unwrap(), Vec::<Literal>::new());
}

#[test]
fn descriptors_display_as_directives() {
    let d = parse("style.color=pick('red', 2)").unwrap();
    assert_eq!(d.to_string(), "style.color = pick('red', 2)");
}
