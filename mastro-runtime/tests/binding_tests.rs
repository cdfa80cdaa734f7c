use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use mastro_bind::Literal;
use mastro_core::Signal;
use mastro_dom::NodeId;
use mastro_html::{Node, Value, html};
use mastro_runtime::{Definition, DiagnosticKind, Host, Members, RuntimeConfig, Source};
use tracing_test::traced_test;

fn find(host: &Host, root: NodeId, selector: &str) -> NodeId {
    host.document()
        .query_selector(root, selector)
        .unwrap()
        .unwrap_or_else(|| panic!("no element matches {selector}"))
}

fn labelled(label: &'static str) -> Definition {
    Definition::new(move |_| Members::new().source("label", Source::constant(label)))
}

#[test]
fn nested_components_own_their_directives() {
    let host = Host::new();
    host.define("x-outer", labelled("outer")).unwrap();
    host.define("x-inner", labelled("inner")).unwrap();
    host.mount(
        r#"<x-outer>
  <p data-bind="label"></p>
  <x-inner><span data-bind="label"></span></x-inner>
</x-outer>"#,
    )
    .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let outer = find(&host, host.body(), "x-outer");
    let inner = find(&host, outer, "x-inner");
    assert_eq!(doc.text_content(find(&host, outer, "p")), "outer");
    assert_eq!(doc.text_content(find(&host, inner, "span")), "inner");
    assert_eq!(host.effect_count(outer), 1);
    assert_eq!(host.effect_count(inner), 1);
}

#[test]
fn sites_inside_undefined_custom_elements_are_left_alone() {
    let host = Host::new();
    host.define("x-outer", labelled("outer")).unwrap();
    host.mount(
        r#"<x-outer><x-later><span data-bind="label">as sent</span></x-later></x-outer>"#,
    )
    .unwrap();
    host.run_until_idle();

    let span = find(&host, host.body(), "span");
    assert_eq!(host.document().text_content(span), "as sent");
    assert!(host.take_diagnostics().is_empty());
}

#[test]
fn props_hand_the_accessor_to_the_child() {
    let count = Signal::new(1);
    let host = Host::new();
    host.define("x-parent", {
        let count = count.clone();
        Definition::new(move |_| Members::new().source("count", count.clone()))
    })
    .unwrap();
    host.define(
        "x-child",
        Definition::new(|setup| {
            let value = setup.prop("value");
            Members::new()
                .source("doubled", move |args: &[Literal]| {
                    value.get(args).as_f64().map_or(Value::Null, |n| Value::Number(n * 2.0))
                })
                .initial_html(|| {
                    html!(r#"<b data-bind="value"></b> <i data-bind="doubled"></i>"#)
                })
        }),
    )
    .unwrap();
    host.mount(r#"<x-parent><x-child data-bind="props.value = count"></x-child></x-parent>"#)
        .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let child = find(&host, host.body(), "x-child");
    let b = find(&host, child, "b");
    let i = find(&host, child, "i");
    assert_eq!(doc.text_content(b), "1");
    assert_eq!(doc.text_content(i), "2");

    count.set(5);
    assert_eq!(doc.text_content(b), "5");
    assert_eq!(doc.text_content(i), "10");
    // The parent holds no effect for a props binding.
    assert_eq!(host.effect_count(find(&host, host.body(), "x-parent")), 0);
}

#[test]
fn data_props_attribute_passes_sources() {
    let host = Host::new();
    host.define("x-parent", labelled("from parent")).unwrap();
    host.define(
        "x-child",
        Definition::new(|_| Members::new().initial_html(|| html!(r#"<em data-bind="heading"></em>"#))),
    )
    .unwrap();
    host.mount(r#"<x-parent><x-child data-props="heading=label, broken"></x-child></x-parent>"#)
        .unwrap();
    host.run_until_idle();

    let em = find(&host, host.body(), "em");
    assert_eq!(host.document().text_content(em), "from parent");
    let diagnostics = host.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Parse);
    assert_eq!(diagnostics[0].component, "x-parent");
}

#[test]
fn plain_attributes_become_sources() {
    let host = Host::new();
    host.define(
        "x-greeting",
        Definition::new(|_| Members::new().source("name", Source::constant("member"))),
    )
    .unwrap();
    host.mount(
        r#"<x-greeting name="Ann" data-skip="x"><b data-bind="name"></b><i data-bind="data-skip"></i></x-greeting>"#,
    )
    .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let el = find(&host, host.body(), "x-greeting");
    assert_eq!(doc.text_content(find(&host, el, "b")), "Ann");
    assert_eq!(doc.text_content(find(&host, el, "i")), "");
    let kinds: Vec<DiagnosticKind> = host.take_diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [DiagnosticKind::UnknownSource]);
}

#[test]
fn every_target_kind_is_applied() {
    let hidden = Signal::new(false);
    let tags = Signal::new(vec!["a".to_string(), "b".to_string()]);
    let host = Host::new();
    host.define("x-form", {
        let (hidden, tags) = (hidden.clone(), tags.clone());
        Definition::new(move |_| {
            let hide = hidden.clone();
            Members::new()
                .source("hidden", hidden.clone())
                .source("tags", tags.clone())
                .source("display", move |_: &[Literal]| if hide.get() { "none" } else { "" })
                .source("userId", Source::constant(7))
        })
    })
    .unwrap();
    host.mount(
        r#"<x-form><input data-bind="required = hidden; title = tags; style.display = display; dataset.userId = userId; state.flag = hidden"></x-form>"#,
    )
    .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let input = find(&host, host.body(), "input");
    assert!(!doc.has_attribute(input, "required"));
    assert_eq!(doc.get_attribute(input, "title").as_deref(), Some("a b"));
    assert_eq!(doc.style(input, "display"), None);
    assert_eq!(doc.get_attribute(input, "data-user-id").as_deref(), Some("7"));
    assert_eq!(doc.nested_property(input, "state", "flag"), Some(Value::Bool(false)));

    hidden.set(true);
    tags.set(vec!["c".to_string()]);
    assert!(doc.has_attribute(input, "required"));
    assert_eq!(doc.get_attribute(input, "title").as_deref(), Some("c"));
    assert_eq!(doc.style(input, "display").as_deref(), Some("none"));
    assert_eq!(doc.nested_property(input, "state", "flag"), Some(Value::Bool(true)));
    assert!(host.take_diagnostics().is_empty());
}

#[test]
fn source_arguments_come_from_the_directive() {
    let host = Host::new();
    host.define(
        "x-args",
        Definition::new(|_| {
            Members::new().source("greet", |args: &[Literal]| {
                args.iter().map(ToString::to_string).collect::<Vec<_>>().join(":")
            })
        }),
    )
    .unwrap();
    host.mount(r#"<x-args><p data-bind="greet('ann', 2, true)"></p></x-args>"#)
        .unwrap();
    host.run_until_idle();

    let p = find(&host, host.body(), "p");
    assert_eq!(host.document().text_content(p), "ann:2:true");
}

#[test]
fn bad_directives_do_not_hide_their_siblings() {
    let host = Host::new();
    host.define(
        "x-mixed",
        Definition::new(|_| {
            Members::new()
                .source("on", Source::constant(true))
                .source("text", Source::constant("<ok>"))
                .method("save", |_, _| {})
        }),
    )
    .unwrap();
    host.mount(
        r#"<x-mixed><p data-bind="text; = broken; class.on = on; nothing; save"></p></x-mixed>"#,
    )
    .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let p = find(&host, host.body(), "p");
    assert!(doc.has_class(p, "on"));
    assert_eq!(doc.inner_html(p).unwrap(), "&lt;ok&gt;");

    let kinds: Vec<DiagnosticKind> = host.take_diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DiagnosticKind::Parse,
            DiagnosticKind::UnknownSource,
            DiagnosticKind::NotASource
        ]
    );
}

#[test]
fn unmatched_sources_can_be_silenced() {
    let host = Host::with_config(RuntimeConfig {
        warn_on_unmatched: false,
        ..RuntimeConfig::default()
    });
    host.define("x-quiet", Definition::new(|_| Members::new())).unwrap();
    host.mount(r#"<x-quiet><p data-bind="missing"></p></x-quiet>"#).unwrap();
    host.run_until_idle();
    assert!(host.take_diagnostics().is_empty());
}

#[test]
#[traced_test]
fn unknown_sources_are_logged() {
    let host = Host::new();
    host.define("x-logged", Definition::new(|_| Members::new())).unwrap();
    host.mount(r#"<x-logged><p data-bind="style.color = missing"></p></x-logged>"#)
        .unwrap();
    host.run_until_idle();

    assert!(logs_contain("no source named `missing`"));
    assert!(logs_contain("x-logged"));
}

fn list_component(items: Signal<usize>, label: Signal<String>) -> Definition {
    Definition::new(move |_| {
        let items = items.clone();
        Members::new()
            .source("label", label.clone())
            .source("rows", move |_: &[Literal]| {
                let rows: Vec<Node> = (0..items.get())
                    .map(|i| html!(r#"<li data-index={}><b data-bind="label"></b></li>"#, i))
                    .collect();
                Node::from(rows)
            })
            .initial_html(|| html!(r#"<ul data-bind="rows"></ul>"#))
    })
}

#[test]
fn inner_html_rerender_wires_new_sites() {
    let items = Signal::new(1usize);
    let label = Signal::new("a".to_string());
    let host = Host::new();
    host.define("x-list", list_component(items.clone(), label.clone()))
        .unwrap();
    host.mount("<x-list></x-list>").unwrap();
    host.run_until_idle();

    let doc = host.document();
    let ul = find(&host, host.body(), "ul");
    assert_eq!(doc.inner_html(ul).unwrap(), r#"<li data-index="0"><b data-bind="label">a</b></li>"#);

    items.set(3);
    assert_eq!(doc.element_children(ul).len(), 3);
    assert_eq!(doc.text_content(ul), "aaa");

    label.set("b".to_string());
    assert_eq!(doc.text_content(ul), "bbb");
}

#[test]
fn repeated_rerenders_do_not_leak_bindings() {
    let items = Signal::new(2usize);
    let label = Signal::new("x".to_string());
    let host = Host::new();
    host.define("x-list", list_component(items.clone(), label.clone()))
        .unwrap();
    host.mount("<x-list></x-list>").unwrap();
    host.run_until_idle();

    let el = find(&host, host.body(), "x-list");
    // The `rows` slot plus one binding per row.
    assert_eq!(host.effect_count(el), 3);

    for n in [4, 1, 4, 0, 2, 2, 3] {
        items.set(n);
        assert_eq!(host.effect_count(el), 1 + n);
        assert_eq!(label.subscriber_count(), n);
    }

    let nodes = host.document().node_count();
    for _ in 0..5 {
        items.set(3);
    }
    assert_eq!(host.document().node_count(), nodes);

    host.remove(el).unwrap();
    assert_eq!(host.effect_count(el), 0);
    assert_eq!(items.subscriber_count(), 0);
    assert_eq!(label.subscriber_count(), 0);
}

#[test]
fn server_content_inside_a_slot_is_left_to_the_slot() {
    let items = Signal::new(1usize);
    let label = Signal::new("a".to_string());
    let host = Host::new();
    host.define("x-list", list_component(items.clone(), label.clone()))
        .unwrap();
    host.mount(
        r#"<x-list><ul data-bind="rows"><li><b data-bind="label">server</b><i data-bind="= bad"></i></li></ul></x-list>"#,
    )
    .unwrap();
    host.run_until_idle();

    let el = find(&host, host.body(), "x-list");
    let ul = find(&host, el, "ul");
    assert_eq!(host.document().text_content(ul), "a");
    // The slot and the one row it rendered; nothing for the replaced markup.
    assert_eq!(host.effect_count(el), 2);
    assert_eq!(label.subscriber_count(), 1);

    label.set("b".to_string());
    assert_eq!(host.document().text_content(ul), "b");
    assert!(host.take_diagnostics().is_empty());
}

#[test]
fn pending_renders_fill_the_slot_when_resolved() {
    let pending: Rc<RefCell<VecDeque<oneshot::Receiver<Node>>>> = Rc::default();
    let version = Signal::new(0);
    let host = Host::new();
    host.define("x-async", {
        let (pending, version) = (pending.clone(), version.clone());
        Definition::new(move |_| {
            let (pending, version) = (pending.clone(), version.clone());
            Members::new()
                .source("label", Source::constant("L"))
                .source("content", move |_: &[Literal]| {
                    version.get();
                    match pending.borrow_mut().pop_front() {
                        Some(rx) => Node::deferred(rx),
                        None => Node::text("idle"),
                    }
                })
        })
    })
    .unwrap();

    let (tx1, rx1) = oneshot::channel();
    pending.borrow_mut().push_back(rx1);
    host.mount(r#"<x-async><div data-bind="content">loading</div></x-async>"#)
        .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let div = find(&host, host.body(), "div");
    assert_eq!(doc.text_content(div), "loading");

    tx1.send(html!(r#"<b data-bind="label"></b>"#)).unwrap();
    host.run_until_idle();
    assert_eq!(doc.inner_html(div).unwrap(), r#"<b data-bind="label">L</b>"#);

    // A render superseded before it resolves is dropped.
    let (tx2, rx2) = oneshot::channel();
    let (tx3, rx3) = oneshot::channel();
    pending.borrow_mut().extend([rx2, rx3]);
    version.set(1);
    version.set(2);
    tx2.send(Node::raw("old")).unwrap();
    host.run_until_idle();
    assert_eq!(doc.inner_html(div).unwrap(), r#"<b data-bind="label">L</b>"#);

    tx3.send(Node::raw("new")).unwrap();
    host.run_until_idle();
    assert_eq!(doc.inner_html(div).unwrap(), "new");
}

#[test]
fn failed_renders_are_reported() {
    let host = Host::new();
    host.define(
        "x-broken",
        Definition::new(|_| {
            Members::new().source("content", |_: &[Literal]| {
                Node::deferred(async { Err::<Node, _>(std::io::Error::other("backend down")) })
            })
        }),
    )
    .unwrap();
    host.mount(r#"<x-broken><div data-bind="content">kept</div></x-broken>"#)
        .unwrap();
    host.run_until_idle();

    assert_eq!(host.document().text_content(find(&host, host.body(), "div")), "kept");
    let diagnostics = host.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Render);
    assert!(diagnostics[0].message.contains("backend down"));
}

#[test]
fn nodes_in_property_positions_are_rendered_or_reported() {
    let senders: Rc<RefCell<Vec<oneshot::Sender<Node>>>> = Rc::default();
    let host = Host::new();
    host.define(
        "x-props",
        Definition::new(move |_| {
            let senders = senders.clone();
            Members::new()
                .source("markup", Source::constant(html!("<b>{}</b>", "&")))
                .source("pending", move |_: &[Literal]| {
                    let (tx, rx) = oneshot::channel::<Node>();
                    senders.borrow_mut().push(tx);
                    Node::deferred(rx)
                })
                .source("failing", |_: &[Literal]| {
                    Node::deferred(async { Err::<Node, _>(std::io::Error::other("no data")) })
                })
        }),
    )
    .unwrap();
    host.mount(
        r#"<x-props><p title="kept" data-bind="dataset.html = markup; title = pending; style.color = failing"></p></x-props>"#,
    )
    .unwrap();
    host.run_until_idle();

    let doc = host.document();
    let p = find(&host, host.body(), "p");
    assert_eq!(doc.dataset(p, "html").as_deref(), Some("<b>&amp;</b>"));
    assert_eq!(doc.get_attribute(p, "title").as_deref(), Some("kept"));
    assert_eq!(doc.style(p, "color"), None);

    let diagnostics = host.take_diagnostics();
    let kinds: Vec<DiagnosticKind> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [DiagnosticKind::Render, DiagnosticKind::Render]);
    assert!(diagnostics[0].message.contains("innerHTML"));
    assert!(diagnostics[1].message.contains("no data"));
}
