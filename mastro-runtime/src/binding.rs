//! `data-bind` wiring.
//!
//! Each component walks its sources in order and, for each, every
//! directive site in its own subtree (document order) that names it. Sites
//! inside a nested custom element belong to that element and are skipped.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use mastro_bind::{BindDescriptor, BindError, TargetKind, parse_all};
use mastro_core::{Scope, effect, untrack};
use mastro_dom::{Document, NodeId, Property};
use mastro_html::{Escape, RenderNow, Value, render_now};
use tracing::trace;

use crate::diagnostics::{DiagnosticKind, describe};
use crate::host::{Host, WeakHost};
use crate::instance::Instance;
use crate::source::Source;

/// Wire every site under `root` owned by `instance`. Effects go into `scope`.
pub(crate) fn register(host: &Host, instance: &Rc<Instance>, root: NodeId, scope: &Scope) {
    let document = host.document();
    let sources = instance.sources(&document);

    let sites = match document.query_selector_all(root, "[data-bind]") {
        Ok(sites) => sites,
        Err(err) => {
            host.report(DiagnosticKind::Dom, &instance.tag, err.to_string());
            return;
        }
    };
    let parsed: Vec<(NodeId, Vec<Result<BindDescriptor, BindError>>)> = sites
        .into_iter()
        .filter(|site| owned_by(&document, *site, instance.element))
        .map(|site| {
            let raw = document.get_attribute(site, "data-bind").unwrap_or_default();
            (site, parse_all(&raw))
        })
        .collect();

    // Content under a live `innerHTML` binding is replaced on its first run
    // and wired by the slot itself.
    let slots: Vec<NodeId> = parsed
        .iter()
        .filter(|(_, descriptors)| {
            descriptors.iter().flatten().any(|d| {
                d.target_kind() == TargetKind::InnerHtml
                    && sources.iter().any(|(name, _)| *name == d.source)
            })
        })
        .map(|(site, _)| *site)
        .collect();

    let sites: Vec<(NodeId, Vec<BindDescriptor>)> = parsed
        .into_iter()
        .filter(|(site, _)| !inside_slot(&document, *site, root, &slots))
        .map(|(site, descriptors)| {
            let descriptors = descriptors
                .into_iter()
                .filter_map(|parsed| match parsed {
                    Ok(descriptor) => Some(descriptor),
                    Err(err) => {
                        host.report(DiagnosticKind::Parse, &instance.tag, err.to_string());
                        None
                    }
                })
                .collect();
            (site, descriptors)
        })
        .collect();

    for (name, source) in &sources {
        for (site, descriptors) in &sites {
            for descriptor in descriptors.iter().filter(|d| d.source == *name) {
                bind(host, instance, scope, *site, descriptor, source);
            }
        }
    }

    if host.config().warn_on_unmatched {
        for descriptor in sites.iter().flat_map(|(_, descriptors)| descriptors) {
            if !sources.iter().any(|(name, _)| *name == descriptor.source) {
                unmatched(host, instance, descriptor);
            }
        }
    }

    pass_props(host, instance, root, &sources, &slots);
}

/// Whether `site` sits in the component's own markup rather than inside a
/// nested custom element.
pub(crate) fn owned_by(document: &Document, site: NodeId, component: NodeId) -> bool {
    document
        .ancestors(site)
        .into_iter()
        .take_while(|ancestor| *ancestor != component)
        .all(|ancestor| {
            document
                .tag_name(ancestor)
                .is_none_or(|tag| !tag.contains('-'))
        })
}

/// Whether one of `slots` sits between `site` and `root`.
fn inside_slot(document: &Document, site: NodeId, root: NodeId, slots: &[NodeId]) -> bool {
    document
        .ancestors(site)
        .into_iter()
        .take_while(|ancestor| *ancestor != root)
        .any(|ancestor| slots.contains(&ancestor))
}

fn unmatched(host: &Host, instance: &Instance, descriptor: &BindDescriptor) {
    if instance.members.get_method(&descriptor.source).is_some() {
        host.report(
            DiagnosticKind::NotASource,
            &instance.tag,
            format!("`{descriptor}`: `{}` is a method", descriptor.source),
        );
    } else {
        host.report(
            DiagnosticKind::UnknownSource,
            &instance.tag,
            format!("`{descriptor}`: no source named `{}`", descriptor.source),
        );
    }
}

fn bind(
    host: &Host,
    instance: &Rc<Instance>,
    scope: &Scope,
    site: NodeId,
    descriptor: &BindDescriptor,
    source: &Source,
) {
    trace!(tag = %instance.tag, ?site, %descriptor, "bind");
    match descriptor.target_kind() {
        TargetKind::Props => {
            // The accessor itself, so the child subscribes to it on its own.
            let name = descriptor.subtarget.as_deref().unwrap_or_default();
            if let Err(err) = host
                .document()
                .set_property(site, name, Property::shared(source.clone()))
            {
                host.report(DiagnosticKind::Dom, &instance.tag, err.to_string());
            }
        }
        TargetKind::InnerHtml => bind_slot(host, instance, scope, site, descriptor, source),
        _ => {
            let host = host.downgrade();
            let tag = instance.tag.clone();
            let descriptor = descriptor.clone();
            let source = source.clone();
            scope.run(|| {
                effect(move || {
                    let value = source.get(&descriptor.args);
                    if let Some(host) = host.upgrade() {
                        untrack(|| apply(&host, &tag, site, &descriptor, value));
                    }
                })
            });
        }
    }
}

fn apply(host: &Host, tag: &str, site: NodeId, descriptor: &BindDescriptor, value: Value) {
    let document = host.document();
    let subtarget = descriptor.subtarget.as_deref().unwrap_or_default();
    let value = match descriptor.target_kind() {
        TargetKind::Nested | TargetKind::Property => match settle(value) {
            Ok(value) => value,
            Err(message) => {
                host.report(DiagnosticKind::Render, tag, format!("`{descriptor}`: {message}"));
                return;
            }
        },
        _ => value,
    };
    let result = match descriptor.target_kind() {
        TargetKind::Class => document
            .toggle_class(site, subtarget, Some(value.is_truthy()))
            .map(drop),
        TargetKind::Nested => document.set_nested_property(site, &descriptor.target, subtarget, value),
        TargetKind::Property => {
            let value = match value {
                Value::List(_) => Value::Str(value.to_string()),
                other => other,
            };
            document
                .set_property(site, &descriptor.target, Property::Value(value))
                .map(|mutation| host.handle_mutation(mutation))
        }
        TargetKind::InnerHtml | TargetKind::Props => Ok(()),
    };
    if let Err(err) = result {
        host.report(DiagnosticKind::Dom, tag, format!("`{descriptor}`: {err}"));
    }
}

/// Render nodes to their markup so they can be written as plain strings.
/// Only content that is ready now can be assigned to a property.
fn settle(value: Value) -> Result<Value, String> {
    match value {
        Value::Node(node) => match render_now(node) {
            RenderNow::Ready(Ok(html)) => Ok(Value::Str(html)),
            RenderNow::Ready(Err(err)) => Err(describe(&err)),
            RenderNow::Pending(_) => {
                Err("asynchronous content can only be bound to innerHTML".to_string())
            }
        },
        Value::List(items) => items.into_iter().map(settle).collect::<Result<_, _>>().map(Value::List),
        other => Ok(other),
    }
}

/// An `innerHTML` binding. Bindings inside the rendered content live in a
/// child scope that is dropped before each re-render.
#[derive(Default)]
struct Slot {
    scope: RefCell<Option<Scope>>,
    generation: Cell<u64>,
}

fn bind_slot(
    host: &Host,
    instance: &Rc<Instance>,
    scope: &Scope,
    site: NodeId,
    descriptor: &BindDescriptor,
    source: &Source,
) {
    let slot = Rc::new(Slot::default());
    let host = host.downgrade();
    let instance = Rc::downgrade(instance);
    let parent = scope.clone();
    let args = descriptor.args.clone();
    let source = source.clone();
    scope.run(|| {
        effect(move || {
            let value = source.get(&args);
            let (Some(host), Some(instance)) = (host.upgrade(), instance.upgrade()) else {
                return;
            };
            untrack(|| render_slot(&host, &instance, &parent, site, &slot, value));
        })
    });
}

fn render_slot(
    host: &Host,
    instance: &Rc<Instance>,
    parent: &Scope,
    site: NodeId,
    slot: &Rc<Slot>,
    value: Value,
) {
    let previous = slot.scope.borrow_mut().take();
    if let Some(previous) = previous {
        previous.dispose();
    }
    let generation = slot.generation.get() + 1;
    slot.generation.set(generation);
    let child = parent.child();
    *slot.scope.borrow_mut() = Some(child.clone());

    match render_now(value.into_node(Escape::Body)) {
        RenderNow::Ready(Ok(html)) => fill_slot(host, instance, site, &child, &html),
        RenderNow::Ready(Err(err)) => {
            host.report(DiagnosticKind::Render, &instance.tag, describe(&err));
        }
        RenderNow::Pending(render) => {
            let weak_host: WeakHost = host.downgrade();
            let weak_instance = Rc::downgrade(instance);
            let weak_slot: Weak<Slot> = Rc::downgrade(slot);
            host.spawn(&instance.tag, async move {
                let result = render.await;
                let (Some(host), Some(instance), Some(slot)) =
                    (weak_host.upgrade(), weak_instance.upgrade(), weak_slot.upgrade())
                else {
                    return;
                };
                if slot.generation.get() != generation || child.is_disposed() {
                    trace!(tag = %instance.tag, generation, "superseded render dropped");
                    return;
                }
                match result {
                    Ok(html) => fill_slot(&host, &instance, site, &child, &html),
                    Err(err) => host.report(DiagnosticKind::Render, &instance.tag, describe(&err)),
                }
            });
        }
    }
}

fn fill_slot(host: &Host, instance: &Rc<Instance>, site: NodeId, child: &Scope, html: &str) {
    if host.fill(instance, site, html) {
        child.run(|| register(host, instance, site, child));
    }
}

/// `data-props="prop=source, other=source2"`: the attribute form of
/// `props.<prop>` bindings.
fn pass_props(
    host: &Host,
    instance: &Instance,
    root: NodeId,
    sources: &[(String, Source)],
    slots: &[NodeId],
) {
    let document = host.document();
    let Ok(sites) = document.query_selector_all(root, "[data-props]") else {
        return;
    };
    for site in sites
        .into_iter()
        .filter(|site| {
            owned_by(&document, *site, instance.element)
                && !inside_slot(&document, *site, root, slots)
        })
    {
        let raw = document.get_attribute(site, "data-props").unwrap_or_default();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((prop, name)) = pair
                .split_once('=')
                .map(|(p, n)| (p.trim(), n.trim()))
                .filter(|(p, n)| !p.is_empty() && !n.is_empty())
            else {
                host.report(
                    DiagnosticKind::Parse,
                    &instance.tag,
                    format!("data-props: expected `prop=source`, got `{pair}`"),
                );
                continue;
            };
            match sources.iter().find(|(n, _)| n == name) {
                Some((_, source)) => {
                    if let Err(err) =
                        document.set_property(site, prop, Property::shared(source.clone()))
                    {
                        host.report(DiagnosticKind::Dom, &instance.tag, err.to_string());
                    }
                }
                None if host.config().warn_on_unmatched => host.report(
                    DiagnosticKind::UnknownSource,
                    &instance.tag,
                    format!("data-props: no source named `{name}`"),
                ),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_stops_at_nested_components() {
        let doc = Document::parse(
            r#"<x-outer><p data-bind="a"></p><x-inner><span data-bind="b"></span></x-inner></x-outer>"#,
        );
        let outer = doc.query_selector(doc.body(), "x-outer").unwrap().unwrap();
        let inner = doc.query_selector(doc.body(), "x-inner").unwrap().unwrap();
        let p = doc.query_selector(outer, "p").unwrap().unwrap();
        let span = doc.query_selector(outer, "span").unwrap().unwrap();

        assert!(owned_by(&doc, p, outer));
        assert!(owned_by(&doc, inner, outer));
        assert!(!owned_by(&doc, span, outer));
        assert!(owned_by(&doc, span, inner));
    }
}
