use std::fmt;
use std::rc::Rc;

use mastro_bind::Literal;
use mastro_core::{Memo, Signal};
use mastro_dom::Event;
use mastro_html::Value;

/// A reactive accessor a `data-bind` directive can read.
///
/// Reading a [`Signal`] or [`Memo`] inside the accessor subscribes the
/// binding that evaluates it.
#[derive(Clone)]
pub struct Source(Rc<dyn Fn(&[Literal]) -> Value>);

impl Source {
    pub fn new<V: Into<Value>>(f: impl Fn(&[Literal]) -> V + 'static) -> Self {
        Source(Rc::new(move |args| f(args).into()))
    }

    /// A source that always returns `value`.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Source(Rc::new(move |_| value.clone()))
    }

    pub fn get(&self, args: &[Literal]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Source(..)")
    }
}

/// Anything that can be registered as a component's reactive source.
pub trait IntoSource {
    fn into_source(self) -> Source;
}

impl IntoSource for Source {
    fn into_source(self) -> Source {
        self
    }
}

impl<T> IntoSource for Signal<T>
where
    T: Clone + Into<Value> + 'static,
{
    fn into_source(self) -> Source {
        Source::new(move |_| self.get())
    }
}

impl<T> IntoSource for Memo<T>
where
    T: Clone + PartialEq + Into<Value> + 'static,
{
    fn into_source(self) -> Source {
        Source::new(move |_| self.get())
    }
}

impl<F, V> IntoSource for F
where
    F: Fn(&[Literal]) -> V + 'static,
    V: Into<Value>,
{
    fn into_source(self) -> Source {
        Source::new(self)
    }
}

/// An event handler: receives the directive's literal arguments and the event.
#[derive(Clone)]
pub struct Method(Rc<dyn Fn(&[Literal], &Event)>);

impl Method {
    pub fn new(f: impl Fn(&[Literal], &Event) + 'static) -> Self {
        Method(Rc::new(f))
    }

    pub fn call(&self, args: &[Literal], event: &Event) {
        (self.0)(args, event)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method(..)")
    }
}

/// Directive literals as template values.
pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Bool(b) => Value::Bool(*b),
    }
}
