use std::cell::RefCell;
use std::rc::Rc;

use mastro_core::{Scope, Signal, watch};

#[test]
fn reports_transitions_but_not_the_baseline() {
    let label = Signal::new("idle".to_string());
    let seen = Rc::new(RefCell::new(Vec::<String>::new()));

    let log = seen.clone();
    let source = label.clone();
    watch(
        move || source.get(),
        move |new, old| log.borrow_mut().push(format!("{old}->{new}")),
    );
    assert!(seen.borrow().is_empty());

    label.set("busy".into());
    label.set("busy".into());
    label.set("done".into());
    assert_eq!(*seen.borrow(), ["idle->busy", "busy->done"]);
}

#[test]
fn on_change_may_write_the_watched_signal() {
    let step = Signal::new(0u32);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let (source, writer, log) = (step.clone(), step.clone(), seen.clone());
    watch(
        move || source.get(),
        move |new, _| {
            log.borrow_mut().push(*new);
            if *new < 4 {
                writer.set(new + 2);
            }
        },
    );

    step.set(1);
    assert_eq!(*seen.borrow(), [1, 3, 5]);
}

#[test]
fn stops_with_its_scope() {
    let count = Signal::new(1);
    let calls = Rc::new(RefCell::new(0));
    let scope = Scope::new();

    let (source, hits) = (count.clone(), calls.clone());
    scope.run(|| watch(move || source.get() % 2 == 0, move |_, _| *hits.borrow_mut() += 1));

    count.set(2);
    count.set(4);
    assert_eq!(*calls.borrow(), 1);

    scope.dispose();
    count.set(5);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(count.subscriber_count(), 0);
}
