//! # Form Nodes
//!
//! Every form variant implements [`FormNode`], the capability set shared by
//! units and composites. [`Form`] is the closed handle enum composites hold
//! their children as; it implements [`FormNode`] by delegating to the
//! variant.
//!
//! ## Ownership
//!
//! Handles are cheap `Rc` aliases of one node state. Embedding a form into a
//! composite forks it: the composite owns a fresh copy of the state that
//! shares the immutable unit configuration. Use the composite's accessors
//! ([`Shape::field`], [`List::elements`], ...) to reach the embedded copy.
//!
//! Embedded nodes keep a weak link to their parent. [`Form::root`] follows it
//! and [`FormNode::submit`] always submits from the root.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::future::{self, FutureExt, LocalBoxFuture};
use impulse_signal::{Monitor, Signal};

use crate::errors::FormError;
use crate::listeners::{Listeners, Unsubscribe};
use crate::list::{List, ListState};
use crate::nested::Nested;
use crate::optional::{Optional, OptionalState};
use crate::setter::{ErrorSetter, FlagSetter, StrategySetter, ValueSetter};
use crate::shape::{Shape, ShapeState};
use crate::strategy::ValidateStrategy;
use crate::switch::{Switch, SwitchState};
use crate::unit::{Unit, UnitState};
use crate::Value;

// ============================================================================
// Capability trait
// ============================================================================

/// The capability set every form node exposes.
///
/// Getters take an explicit [`Monitor`]; reading inside a derived cell
/// records the dependency. Every getter returns an `Rc` that stays the same
/// allocation for as long as the value it describes is unchanged.
///
/// Touched, dirty, validated, error and validate-strategy come in a concise
/// and a verbose form, see [`Nested`].
pub trait FormNode {
    /// Current raw input.
    fn input(&self, monitor: &Monitor) -> Rc<Value>;

    /// Write the input.
    ///
    /// Function setters receive `(input, initial)`.
    fn set_input(&self, setter: impl Into<ValueSetter>);

    /// Baseline value used for dirtiness and reset.
    fn initial(&self, monitor: &Monitor) -> Rc<Value>;

    /// Write the initial value.
    ///
    /// Function setters receive `(initial, input)`.
    fn set_initial(&self, setter: impl Into<ValueSetter>);

    /// Validated output, `None` while invalid or not yet validated.
    fn output(&self, monitor: &Monitor) -> Option<Rc<Value>>;

    /// Concise error tree.
    fn error(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>>;

    /// Verbose error tree.
    fn error_verbose(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>>;

    /// Set custom errors. `None` leaves clear the override.
    fn set_error(&self, setter: impl Into<ErrorSetter>);

    /// Concise touched tree.
    fn touched(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Verbose touched tree.
    fn touched_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Write touched flags.
    fn set_touched(&self, setter: impl Into<FlagSetter>);

    /// Concise dirty tree.
    fn dirty(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Verbose dirty tree.
    fn dirty_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Concise validated tree.
    fn validated(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Verbose validated tree.
    fn validated_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>>;

    /// Concise validation strategy tree.
    fn validate_on(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>>;

    /// Verbose validation strategy tree.
    fn validate_on_verbose(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>>;

    /// Write validation strategies.
    fn set_validate_on(&self, setter: impl Into<StrategySetter>);

    /// Whether the node currently has an output.
    fn is_valid(&self, monitor: &Monitor) -> bool {
        self.output(monitor).is_some()
    }

    /// Whether the node reports an error that counts towards its output.
    fn is_invalid(&self, monitor: &Monitor) -> bool;

    /// Reset with an optional resetter for the initial value.
    ///
    /// The resetter is applied like [`FormNode::set_initial`], then the input
    /// is restored from the initial value, touched flags return to their
    /// configured default, custom errors are cleared and validation starts
    /// over.
    fn apply_reset(&self, resetter: Option<ValueSetter>);

    /// Reset keeping the current initial value.
    fn reset(&self) {
        self.apply_reset(None);
    }

    /// Reset after applying `resetter` to the initial value.
    fn reset_with(&self, resetter: impl Into<ValueSetter>) {
        self.apply_reset(Some(resetter.into()));
    }

    /// Call the focus listeners of the first invalid node, in pre-order.
    ///
    /// Returns whether a listener was called.
    fn focus_first_invalid_value(&self) -> bool;

    /// A [`Form`] handle aliasing this node.
    fn to_form(&self) -> Form;

    /// Submit the whole form this node belongs to.
    ///
    /// Every node is marked submitted, which validates `onSubmit` units. When
    /// the root has an output, every submit listener of a node with an
    /// output is called and the returned future resolves once all of their
    /// futures did. Otherwise the first invalid value is focused and the
    /// future is ready immediately.
    fn submit(&self) -> LocalBoxFuture<'static, ()> {
        self.to_form().root().submit_from_root()
    }

    /// How many times the form this node belongs to was submitted.
    fn submit_count(&self, monitor: &Monitor) -> u32 {
        self.to_form().root().header().submit_count.read(monitor)
    }

    /// Whether a submission of the form is still running.
    fn is_submitting(&self, monitor: &Monitor) -> bool {
        self.to_form().root().header().pending_submits.read(monitor) > 0
    }

    /// Register a submit listener receiving this node's output.
    fn on_submit<Fut>(&self, listener: impl Fn(&Value) -> Fut + 'static) -> Unsubscribe
    where
        Fut: Future<Output = ()> + 'static,
        Self: Sized,
    {
        self.to_form()
            .header()
            .submit_listeners
            .subscribe(move |output| listener(output).boxed_local())
    }
}

/// Selector overloads for the concise/verbose getters.
///
/// The selector receives `(concise, verbose)` and picks or projects the
/// representation the caller needs in a single read.
pub trait FormExt: FormNode {
    /// Select over the touched trees.
    fn touched_with<R>(&self, monitor: &Monitor, select: impl FnOnce(&Nested<bool>, &Nested<bool>) -> R) -> R {
        select(&self.touched(monitor), &self.touched_verbose(monitor))
    }

    /// Select over the dirty trees.
    fn dirty_with<R>(&self, monitor: &Monitor, select: impl FnOnce(&Nested<bool>, &Nested<bool>) -> R) -> R {
        select(&self.dirty(monitor), &self.dirty_verbose(monitor))
    }

    /// Select over the validated trees.
    fn validated_with<R>(
        &self,
        monitor: &Monitor,
        select: impl FnOnce(&Nested<bool>, &Nested<bool>) -> R,
    ) -> R {
        select(&self.validated(monitor), &self.validated_verbose(monitor))
    }

    /// Select over the error trees.
    fn error_with<R>(
        &self,
        monitor: &Monitor,
        select: impl FnOnce(&Nested<Option<Value>>, &Nested<Option<Value>>) -> R,
    ) -> R {
        select(&self.error(monitor), &self.error_verbose(monitor))
    }

    /// Select over the validation strategy trees.
    fn validate_on_with<R>(
        &self,
        monitor: &Monitor,
        select: impl FnOnce(&Nested<ValidateStrategy>, &Nested<ValidateStrategy>) -> R,
    ) -> R {
        select(&self.validate_on(monitor), &self.validate_on_verbose(monitor))
    }
}

impl<F: FormNode> FormExt for F {}

// ============================================================================
// Per-node bookkeeping
// ============================================================================

/// State every node carries next to its variant-specific signals.
pub(crate) struct NodeHeader {
    parent: RefCell<Option<WeakForm>>,
    submit_count: Signal<u32>,
    pending_submits: Signal<u32>,
    submit_listeners: Listeners<Value, LocalBoxFuture<'static, ()>>,
}

impl NodeHeader {
    pub(crate) fn new() -> Self {
        Self {
            parent: RefCell::new(None),
            submit_count: Signal::new(0),
            pending_submits: Signal::new(0),
            submit_listeners: Listeners::new(),
        }
    }

    pub(crate) fn parent(&self) -> Option<Form> {
        self.parent.borrow().as_ref().and_then(WeakForm::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<WeakForm>) {
        *self.parent.borrow_mut() = parent;
    }
}

impl fmt::Debug for NodeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHeader")
            .field("has_parent", &self.parent.borrow().is_some())
            .field("submit_count", &self.submit_count.peek())
            .finish()
    }
}

// ============================================================================
// Handle enum
// ============================================================================

/// The variant of a form node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    /// A leaf holding one raw value
    Unit,
    /// Named fields
    Shape,
    /// A resizable sequence
    List,
    /// An element gated by an enabled flag
    Optional,
    /// Branches selected by an active discriminant
    Switch,
}

impl FormKind {
    /// Lowercase name of the variant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Shape => "shape",
            Self::List => "list",
            Self::Optional => "optional",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handle to any form node.
#[derive(Clone, Debug)]
pub enum Form {
    /// A unit
    Unit(Unit),
    /// A shape
    Shape(Shape),
    /// A list
    List(List),
    /// An optional
    Optional(Optional),
    /// A switch
    Switch(Switch),
}

/// A weak link to a node, used for parent pointers.
#[derive(Clone)]
pub(crate) enum WeakForm {
    Unit(Weak<UnitState>),
    Shape(Weak<ShapeState>),
    List(Weak<ListState>),
    Optional(Weak<OptionalState>),
    Switch(Weak<SwitchState>),
}

impl WeakForm {
    pub(crate) fn upgrade(&self) -> Option<Form> {
        match self {
            Self::Unit(state) => state.upgrade().map(|state| Form::Unit(Unit { state })),
            Self::Shape(state) => state.upgrade().map(|state| Form::Shape(Shape { state })),
            Self::List(state) => state.upgrade().map(|state| Form::List(List { state })),
            Self::Optional(state) => state
                .upgrade()
                .map(|state| Form::Optional(Optional { state })),
            Self::Switch(state) => state.upgrade().map(|state| Form::Switch(Switch { state })),
        }
    }
}

macro_rules! dispatch {
    ($form:expr, $node:ident => $body:expr) => {
        match $form {
            Form::Unit($node) => $body,
            Form::Shape($node) => $body,
            Form::List($node) => $body,
            Form::Optional($node) => $body,
            Form::Switch($node) => $body,
        }
    };
}

macro_rules! variants {
    ($($variant:ident => $as_fn:ident),* $(,)?) => {
        impl Form {
            $(
                #[doc = concat!("The ", stringify!($variant), " handle, if this is one.")]
                pub fn $as_fn(&self) -> Option<&$variant> {
                    match self {
                        Self::$variant(node) => Some(node),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$variant> for Form {
                fn from(node: $variant) -> Self {
                    Self::$variant(node)
                }
            }

            impl From<&$variant> for Form {
                fn from(node: &$variant) -> Self {
                    Self::$variant(node.clone())
                }
            }

            impl TryFrom<Form> for $variant {
                type Error = FormError;

                fn try_from(form: Form) -> Result<Self, Self::Error> {
                    match form {
                        Form::$variant(node) => Ok(node),
                        other => Err(FormError::variant_mismatch(FormKind::$variant, other.kind())),
                    }
                }
            }
        )*
    };
}

variants! {
    Unit => as_unit,
    Shape => as_shape,
    List => as_list,
    Optional => as_optional,
    Switch => as_switch,
}

impl From<&Form> for Form {
    fn from(form: &Form) -> Self {
        form.clone()
    }
}

impl Form {
    /// The variant of this node.
    #[must_use]
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Unit(_) => FormKind::Unit,
            Self::Shape(_) => FormKind::Shape,
            Self::List(_) => FormKind::List,
            Self::Optional(_) => FormKind::Optional,
            Self::Switch(_) => FormKind::Switch,
        }
    }

    /// Whether both handles alias the same node state.
    pub fn ptr_eq(&self, other: &Form) -> bool {
        match (self, other) {
            (Self::Unit(left), Self::Unit(right)) => left.ptr_eq(right),
            (Self::Shape(left), Self::Shape(right)) => left.ptr_eq(right),
            (Self::List(left), Self::List(right)) => left.ptr_eq(right),
            (Self::Optional(left), Self::Optional(right)) => left.ptr_eq(right),
            (Self::Switch(left), Self::Switch(right)) => left.ptr_eq(right),
            _ => false,
        }
    }

    /// The composite this node is embedded in, if it is still alive.
    pub fn parent(&self) -> Option<Form> {
        self.header().parent()
    }

    /// The outermost composite this node is embedded in, or the node itself.
    pub fn root(&self) -> Form {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        dispatch!(self, node => node.header())
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        dispatch!(self, node => node.downgrade())
    }

    /// A fresh copy of this node owned by `parent`.
    pub(crate) fn fork(&self, parent: WeakForm) -> Form {
        let forked = dispatch!(self, node => Form::from(node.fork()));
        forked.header().set_parent(Some(parent));
        forked
    }

    pub(crate) fn mark_submitted(&self) {
        dispatch!(self, node => node.mark_submitted())
    }

    /// Children that take part in submission and focus, in pre-order.
    pub(crate) fn reachable_children(&self, monitor: &Monitor) -> Vec<Form> {
        match self {
            Self::Unit(_) => Vec::new(),
            Self::Shape(shape) => shape.forms().cloned().collect(),
            Self::List(list) => list.elements(monitor).to_vec(),
            Self::Optional(optional) => optional.reachable_children(monitor),
            Self::Switch(switch) => switch.reachable_children(monitor),
        }
    }

    fn collect_submissions(&self, monitor: &Monitor, pending: &mut Vec<LocalBoxFuture<'static, ()>>) {
        let listeners = &self.header().submit_listeners;
        if !listeners.is_empty() {
            if let Some(output) = self.output(monitor) {
                pending.extend(listeners.emit(&output));
            }
        }
        for child in self.reachable_children(monitor) {
            child.collect_submissions(monitor, pending);
        }
    }

    fn submit_from_root(&self) -> LocalBoxFuture<'static, ()> {
        let header = self.header();
        header.submit_count.update(|count| count + 1);
        self.mark_submitted();

        let monitor = Monitor::new();
        if self.output(&monitor).is_none() {
            let focused = self.focus_first_invalid_value();
            tracing::debug!(kind = %self.kind(), focused, "submitted invalid form");
            return future::ready(()).boxed_local();
        }

        let mut pending = Vec::new();
        self.collect_submissions(&monitor, &mut pending);
        tracing::debug!(kind = %self.kind(), listeners = pending.len(), "submitting form");

        let guard = SubmitGuard::enter(&header.pending_submits);
        async move {
            let _guard = guard;
            future::join_all(pending).await;
        }
        .boxed_local()
    }
}

/// Counts one in-flight submission until dropped.
///
/// Owned by the submission future, so completing it and dropping it unpolled
/// both release the count.
struct SubmitGuard(Signal<u32>);

impl SubmitGuard {
    fn enter(pending: &Signal<u32>) -> Self {
        pending.update(|count| count + 1);
        Self(pending.clone())
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.update(|count| count.saturating_sub(1));
    }
}

impl FormNode for Form {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        dispatch!(self, node => node.input(monitor))
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let setter = setter.into();
        dispatch!(self, node => node.set_input(setter))
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        dispatch!(self, node => node.initial(monitor))
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let setter = setter.into();
        dispatch!(self, node => node.set_initial(setter))
    }

    fn output(&self, monitor: &Monitor) -> Option<Rc<Value>> {
        dispatch!(self, node => node.output(monitor))
    }

    fn error(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        dispatch!(self, node => node.error(monitor))
    }

    fn error_verbose(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        dispatch!(self, node => node.error_verbose(monitor))
    }

    fn set_error(&self, setter: impl Into<ErrorSetter>) {
        let setter = setter.into();
        dispatch!(self, node => node.set_error(setter))
    }

    fn touched(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.touched(monitor))
    }

    fn touched_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.touched_verbose(monitor))
    }

    fn set_touched(&self, setter: impl Into<FlagSetter>) {
        let setter = setter.into();
        dispatch!(self, node => node.set_touched(setter))
    }

    fn dirty(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.dirty(monitor))
    }

    fn dirty_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.dirty_verbose(monitor))
    }

    fn validated(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.validated(monitor))
    }

    fn validated_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        dispatch!(self, node => node.validated_verbose(monitor))
    }

    fn validate_on(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        dispatch!(self, node => node.validate_on(monitor))
    }

    fn validate_on_verbose(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        dispatch!(self, node => node.validate_on_verbose(monitor))
    }

    fn set_validate_on(&self, setter: impl Into<StrategySetter>) {
        let setter = setter.into();
        dispatch!(self, node => node.set_validate_on(setter))
    }

    fn is_invalid(&self, monitor: &Monitor) -> bool {
        dispatch!(self, node => node.is_invalid(monitor))
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        dispatch!(self, node => node.apply_reset(resetter))
    }

    fn focus_first_invalid_value(&self) -> bool {
        dispatch!(self, node => node.focus_first_invalid_value())
    }

    fn to_form(&self) -> Form {
        self.clone()
    }
}

// ============================================================================
// Composite helpers
// ============================================================================

/// Focus dispatch shared by the composites.
///
/// The composite's own listeners get the concise error before any child is
/// visited.
pub(crate) fn focus_composite(
    node: &impl FormNode,
    own: &Listeners<Nested<Option<Value>>>,
) -> bool {
    let monitor = Monitor::new();
    if !own.is_empty() && node.is_invalid(&monitor) {
        tracing::trace!(kind = %node.to_form().kind(), "focusing invalid composite");
        own.emit(&node.error(&monitor));
        return true;
    }
    node.to_form()
        .reachable_children(&monitor)
        .iter()
        .any(|child| child.focus_first_invalid_value())
}

// ============================================================================
// Construction options
// ============================================================================

/// Setters applied to a composite right after it is built.
///
/// Applied in the order validate strategy, touched, initial, input, error,
/// so a strategy configured here already sees the touched and input values
/// configured here.
#[derive(Clone, Debug, Default)]
pub struct FormOptions {
    /// Setter for the input
    pub input: Option<ValueSetter>,
    /// Setter for the initial value
    pub initial: Option<ValueSetter>,
    /// Setter for touched flags
    pub touched: Option<FlagSetter>,
    /// Setter for custom errors
    pub error: Option<ErrorSetter>,
    /// Setter for validation strategies
    pub validate_on: Option<StrategySetter>,
}

impl FormOptions {
    /// Options that change nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input setter.
    #[must_use]
    pub fn input(mut self, setter: impl Into<ValueSetter>) -> Self {
        self.input = Some(setter.into());
        self
    }

    /// Set the initial setter.
    #[must_use]
    pub fn initial(mut self, setter: impl Into<ValueSetter>) -> Self {
        self.initial = Some(setter.into());
        self
    }

    /// Set the touched setter.
    #[must_use]
    pub fn touched(mut self, setter: impl Into<FlagSetter>) -> Self {
        self.touched = Some(setter.into());
        self
    }

    /// Set the error setter.
    #[must_use]
    pub fn error(mut self, setter: impl Into<ErrorSetter>) -> Self {
        self.error = Some(setter.into());
        self
    }

    /// Set the validation strategy setter.
    #[must_use]
    pub fn validate_on(mut self, setter: impl Into<StrategySetter>) -> Self {
        self.validate_on = Some(setter.into());
        self
    }

    pub(crate) fn apply_to(self, node: &impl FormNode) {
        if let Some(setter) = self.validate_on {
            node.set_validate_on(setter);
        }
        if let Some(setter) = self.touched {
            node.set_touched(setter);
        }
        if let Some(setter) = self.initial {
            node.set_initial(setter);
        }
        if let Some(setter) = self.input {
            node.set_input(setter);
        }
        if let Some(setter) = self.error {
            node.set_error(setter);
        }
    }
}
