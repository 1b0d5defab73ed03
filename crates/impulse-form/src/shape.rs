//! # Shape
//!
//! A composite over a fixed record of named fields. A field is either a form
//! or an opaque value passed through unchanged into input and output.
//! Opaque fields never take part in touched, dirty, validated, error or
//! validation strategy, and setters never address them.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use impulse_signal::{Derived, Monitor};

use crate::aspect::{resolve, AspectCells, Children, Errors, Settable, Strategy, Touched};
use crate::errors::{FormError, Result};
use crate::form::{focus_composite, Form, FormNode, FormOptions, NodeHeader, WeakForm};
use crate::listeners::{Listeners, Unsubscribe};
use crate::nested::Nested;
use crate::setter::{for_each_named, ErrorSetter, FlagSetter, Setter, StrategySetter, ValueSetter};
use crate::strategy::ValidateStrategy;
use crate::Value;

#[derive(Clone, Debug)]
enum Field {
    Form(Form),
    Opaque(Value),
}

pub(crate) struct ShapeState {
    header: NodeHeader,
    fields: Rc<IndexMap<String, Field>>,
    focus: Listeners<Nested<Option<Value>>>,
    input: Derived<Rc<Value>>,
    initial: Derived<Rc<Value>>,
    output: Derived<Option<Rc<Value>>>,
    cells: AspectCells,
}

/// Object of every field, form fields projected through `read`.
fn record(
    fields: &IndexMap<String, Field>,
    monitor: &Monitor,
    read: impl Fn(&Form, &Monitor) -> Rc<Value>,
) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, field)| {
                let value = match field {
                    Field::Form(form) => Value::clone(&read(form, monitor)),
                    Field::Opaque(value) => value.clone(),
                };
                (name.clone(), value)
            })
            .collect(),
    )
}

/// A composite over named fields.
#[derive(Clone)]
pub struct Shape {
    pub(crate) state: Rc<ShapeState>,
}

impl Shape {
    /// A shape whose fields are all forms.
    pub fn new<K, F>(fields: impl IntoIterator<Item = (K, F)>) -> Self
    where
        K: Into<String>,
        F: Into<Form>,
    {
        Self::with_options(fields, FormOptions::default())
    }

    /// A shape whose fields are all forms, with construction options.
    pub fn with_options<K, F>(fields: impl IntoIterator<Item = (K, F)>, options: FormOptions) -> Self
    where
        K: Into<String>,
        F: Into<Form>,
    {
        fields
            .into_iter()
            .fold(Self::builder(), |builder, (name, form)| builder.field(name, form))
            .options(options)
            .build()
    }

    /// Start a shape mixing form and opaque fields.
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::default()
    }

    fn assemble(fields: &[(String, Field)]) -> Self {
        let state = Rc::new_cyclic(|weak| {
            let parent = WeakForm::Shape(weak.clone());
            let fields: Rc<IndexMap<String, Field>> = Rc::new(
                fields
                    .iter()
                    .map(|(name, field)| {
                        let field = match field {
                            Field::Form(form) => Field::Form(form.fork(parent.clone())),
                            Field::Opaque(value) => Field::Opaque(value.clone()),
                        };
                        (name.clone(), field)
                    })
                    .collect(),
            );

            let forms: Vec<(String, Form)> = fields
                .iter()
                .filter_map(|(name, field)| match field {
                    Field::Form(form) => Some((name.clone(), form.clone())),
                    Field::Opaque(_) => None,
                })
                .collect();

            let input = Derived::new({
                let fields = fields.clone();
                move |monitor| Rc::new(record(&fields, monitor, |form, monitor| form.input(monitor)))
            });
            let initial = Derived::new({
                let fields = fields.clone();
                move |monitor| Rc::new(record(&fields, monitor, |form, monitor| form.initial(monitor)))
            });
            let output = Derived::new({
                let fields = fields.clone();
                move |monitor| {
                    let mut object = serde_json::Map::new();
                    for (name, field) in fields.iter() {
                        let value = match field {
                            Field::Form(form) => Value::clone(&*form.output(monitor)?),
                            Field::Opaque(value) => value.clone(),
                        };
                        object.insert(name.clone(), value);
                    }
                    Some(Rc::new(Value::Object(object)))
                }
            });
            let cells = AspectCells::over_children(Rc::new(move |_: &Monitor| {
                Children::Named(forms.clone())
            }));

            ShapeState {
                header: NodeHeader::new(),
                fields,
                focus: Listeners::new(),
                input,
                initial,
                output,
                cells,
            }
        });
        Self { state }
    }

    /// The form field called `name`.
    pub fn field(&self, name: &str) -> Option<&Form> {
        match self.state.fields.get(name)? {
            Field::Form(form) => Some(form),
            Field::Opaque(_) => None,
        }
    }

    /// The form field called `name`, or an error naming it.
    pub fn try_field(&self, name: &str) -> Result<&Form> {
        self.field(name).ok_or_else(|| FormError::unknown_field(name))
    }

    /// The opaque field called `name`.
    pub fn opaque(&self, name: &str) -> Option<&Value> {
        match self.state.fields.get(name)? {
            Field::Opaque(value) => Some(value),
            Field::Form(_) => None,
        }
    }

    /// Form fields in declaration order.
    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.state.fields.values().filter_map(|field| match field {
            Field::Form(form) => Some(form),
            Field::Opaque(_) => None,
        })
    }

    /// Names of the form fields in declaration order.
    pub fn form_names(&self) -> impl Iterator<Item = &str> {
        self.state
            .fields
            .iter()
            .filter(|(_, field)| matches!(field, Field::Form(_)))
            .map(|(name, _)| name.as_str())
    }

    /// Register a listener called with the concise error when focus is
    /// requested while the shape is invalid.
    pub fn on_focus_when_invalid(
        &self,
        listener: impl Fn(&Nested<Option<Value>>) + 'static,
    ) -> Unsubscribe {
        self.state.focus.subscribe(listener)
    }

    /// Whether both handles alias the same shape.
    pub fn ptr_eq(&self, other: &Shape) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        &self.state.header
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm::Shape(Rc::downgrade(&self.state))
    }

    pub(crate) fn fork(&self) -> Self {
        let fields: Vec<(String, Field)> = self
            .state
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.clone()))
            .collect();
        Self::assemble(&fields)
    }

    pub(crate) fn mark_submitted(&self) {
        self.forms().for_each(Form::mark_submitted);
    }

    fn set_values(&self, setter: ValueSetter, apply: impl Fn(&Form, ValueSetter)) {
        for_each_named(setter, self.form_names(), |name, setter| match self.field(name) {
            Some(form) => apply(form, setter),
            None => tracing::trace!(name, "ignoring setter for unknown field"),
        });
    }

    fn set_aspect<A: Settable>(&self, setter: Setter<A::Leaf, Nested<A::Leaf>>) {
        let setter = resolve::<A>(&self.to_form(), setter);
        for_each_named(setter, self.form_names(), |name, setter| match self.field(name) {
            Some(form) => A::apply(form, setter),
            None => tracing::trace!(name, "ignoring setter for unknown field"),
        });
    }
}

impl FormNode for Shape {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.input.read(monitor)
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.input(&monitor), self.initial(&monitor)));
        self.set_values(setter, |form, setter| form.set_input(setter));
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.initial.read(monitor)
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.initial(&monitor), self.input(&monitor)));
        self.set_values(setter, |form, setter| form.set_initial(setter));
    }

    fn output(&self, monitor: &Monitor) -> Option<Rc<Value>> {
        self.state.output.read(monitor)
    }

    fn error(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.cells.errors.concise(monitor)
    }

    fn error_verbose(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.cells.errors.verbose(monitor)
    }

    fn set_error(&self, setter: impl Into<ErrorSetter>) {
        self.set_aspect::<Errors>(setter.into());
    }

    fn touched(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.touched.concise(monitor)
    }

    fn touched_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.touched.verbose(monitor)
    }

    fn set_touched(&self, setter: impl Into<FlagSetter>) {
        self.set_aspect::<Touched>(setter.into());
    }

    fn dirty(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.dirty.concise(monitor)
    }

    fn dirty_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.dirty.verbose(monitor)
    }

    fn validated(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.validated.concise(monitor)
    }

    fn validated_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.validated.verbose(monitor)
    }

    fn validate_on(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.cells.strategy.concise(monitor)
    }

    fn validate_on_verbose(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.cells.strategy.verbose(monitor)
    }

    fn set_validate_on(&self, setter: impl Into<StrategySetter>) {
        self.set_aspect::<Strategy>(setter.into());
    }

    fn is_invalid(&self, monitor: &Monitor) -> bool {
        self.forms().any(|form| form.is_invalid(monitor))
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        if let Some(resetter) = resetter {
            self.set_initial(resetter);
        }
        self.forms().for_each(|form| form.reset());
    }

    fn focus_first_invalid_value(&self) -> bool {
        focus_composite(self, &self.state.focus)
    }

    fn to_form(&self) -> Form {
        Form::Shape(self.clone())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("fields", &self.state.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Configures a [`Shape`] with form and opaque fields.
#[derive(Debug, Default)]
#[must_use = "call `build` to create the shape"]
pub struct ShapeBuilder {
    fields: Vec<(String, Field)>,
    options: FormOptions,
}

impl ShapeBuilder {
    /// Add a form field. The form is forked into the shape.
    pub fn field(mut self, name: impl Into<String>, form: impl Into<Form>) -> Self {
        self.fields.push((name.into(), Field::Form(form.into())));
        self
    }

    /// Add an opaque field passed through unchanged.
    pub fn opaque(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), Field::Opaque(value.into())));
        self
    }

    /// Setters applied after construction.
    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the shape.
    pub fn build(self) -> Shape {
        let shape = Shape::assemble(&self.fields);
        self.options.apply_to(&shape);
        shape
    }
}
