//! Event delegation: one listener per event type on each component root,
//! resolving `data-on<type>` directives to the component's methods.

use std::rc::Rc;

use mastro_bind::{Literal, parse_args, parse_event};
use mastro_dom::{Document, Event, NodeId};
use tracing::trace;

use crate::component::{Definition, Member};
use crate::diagnostics::DiagnosticKind;
use crate::host::Host;
use crate::instance::Instance;

pub(crate) fn delegate(host: &Host, instance: &Rc<Instance>, definition: &Definition) {
    let names: Vec<String> = match definition.events() {
        Some(events) => events.to_vec(),
        None => host.config().event_names.clone(),
    };
    let document = host.document();
    for name in names {
        let weak_host = host.downgrade();
        let weak_instance = Rc::downgrade(instance);
        let added = document.add_event_listener(instance.element, &name, move |event| {
            if let (Some(host), Some(instance)) = (weak_host.upgrade(), weak_instance.upgrade()) {
                handle(&host, &instance, event);
            }
        });
        if let Err(err) = added {
            host.report(DiagnosticKind::Dom, &instance.tag, err.to_string());
        }
    }
}

fn handle(host: &Host, instance: &Instance, event: &Event) {
    let document = host.document();
    let attribute = format!("data-on{}", event.event_type());
    let Some((site, raw)) = find_directive(&document, event.target(), instance.element, &attribute)
    else {
        return;
    };
    // Ancestor components must not react to the same event.
    event.stop_propagation();

    let directive = match parse_event(&raw) {
        Ok(directive) => directive,
        Err(err) => {
            host.report(DiagnosticKind::Parse, &instance.tag, err.to_string());
            return;
        }
    };
    let args = if directive.args.is_empty() {
        legacy_args(host, instance, &document, site)
    } else {
        directive.args
    };

    match instance.members.get(&directive.method) {
        Some(Member::Method(method)) => {
            trace!(tag = %instance.tag, method = %directive.method, "event handled");
            let method = method.clone();
            method.call(&args, event);
        }
        Some(Member::Source(_)) => host.report(
            DiagnosticKind::NotAMethod,
            &instance.tag,
            format!("{attribute}: `{}` is a source", directive.method),
        ),
        None => host.report(
            DiagnosticKind::UnknownMethod,
            &instance.tag,
            format!("{attribute}: no method named `{}`", directive.method),
        ),
    }
}

/// Nearest element carrying `attribute`, walking up from `target` to the
/// component root. The root's own directive is checked last.
fn find_directive(
    document: &Document,
    target: NodeId,
    root: NodeId,
    attribute: &str,
) -> Option<(NodeId, String)> {
    let mut node = Some(target);
    while let Some(id) = node.filter(|id| *id != root) {
        if let Some(value) = document.get_attribute(id, attribute) {
            return Some((id, value));
        }
        node = document.parent(id);
    }
    document
        .get_attribute(root, attribute)
        .map(|value| (root, value))
}

/// Arguments from a separate `data-args` attribute, for directives written
/// without a call suffix.
fn legacy_args(host: &Host, instance: &Instance, document: &Document, site: NodeId) -> Vec<Literal> {
    let Some(raw) = document.get_attribute(site, "data-args") else {
        return Vec::new();
    };
    parse_args(&raw).unwrap_or_else(|err| {
        host.report(DiagnosticKind::Parse, &instance.tag, err.to_string());
        Vec::new()
    })
}
