use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::rc::{Rc, Weak};

use super::field::{ErasedField, FieldState};
use super::observable::{DisposeBag, Observable, Subject};
use super::snapshot::FormSnapshot;
use super::validation::ValidationMessage;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UntouchedFieldPolicy {
    #[default]
    Invalid,
    Valid,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub untouched_fields: UntouchedFieldPolicy,
    pub validate_first_error_only: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            untouched_fields: UntouchedFieldPolicy::Invalid,
            validate_first_error_only: false,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    DuplicateField {
        field: String,
    },
    InvalidValidatorParameter {
        validator: &'static str,
        reason: String,
    },
    MissingSnapshotValue {
        field: String,
    },
    SnapshotTypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::DuplicateField { field } => {
                write!(f, "field {field} is already registered on this form")
            }
            FormError::InvalidValidatorParameter { validator, reason } => {
                write!(f, "invalid {validator} configuration: {reason}")
            }
            FormError::MissingSnapshotValue { field } => {
                write!(f, "snapshot has no value for field {field}")
            }
            FormError::SnapshotTypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "snapshot value for field {field} is {found}, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldValidity {
    Untouched,
    Valid,
    Invalid,
}

struct FormState {
    validity: Vec<FieldValidity>,
    is_valid: bool,
    published: bool,
    submit_count: u64,
    valid_submit_count: u64,
}

impl FormState {
    fn aggregate(&self, policy: UntouchedFieldPolicy) -> bool {
        self.validity.iter().all(|validity| match validity {
            FieldValidity::Valid => true,
            FieldValidity::Invalid => false,
            FieldValidity::Untouched => policy == UntouchedFieldPolicy::Valid,
        })
    }
}

struct FormInner<K> {
    options: FormOptions,
    fields: Vec<Box<dyn ErasedField<K>>>,
    state: RefCell<FormState>,
    form_validity: Subject<bool>,
    valid_submits: Subject<FormSnapshot<K>>,
    disposables: DisposeBag,
    disposed: Cell<bool>,
}

impl<K> FormInner<K>
where
    K: Clone + Eq + Hash + Debug + 'static,
{
    fn on_field_state(&self, index: usize, field_state: &FieldState<K>) {
        if self.disposed.get() {
            return;
        }
        let transition = {
            let mut state = self.state.borrow_mut();
            state.validity[index] = if field_state.is_valid() {
                FieldValidity::Valid
            } else {
                FieldValidity::Invalid
            };
            if !state.published {
                return;
            }
            let is_valid = state.aggregate(self.options.untouched_fields);
            if is_valid == state.is_valid {
                None
            } else {
                state.is_valid = is_valid;
                Some(is_valid)
            }
        };
        if let Some(is_valid) = transition {
            tracing::debug!(field = ?field_state.field, is_valid, "form validity changed");
            self.form_validity.next(is_valid);
        }
    }

    fn publish_initial_validity(&self) {
        let is_valid = {
            let mut state = self.state.borrow_mut();
            state.is_valid = state.aggregate(self.options.untouched_fields);
            state.published = true;
            state.is_valid
        };
        self.form_validity.next(is_valid);
    }

    fn on_submit_attempt(&self) {
        if self.disposed.get() {
            return;
        }
        let is_valid = {
            let mut state = self.state.borrow_mut();
            state.submit_count = state.submit_count.saturating_add(1);
            state.is_valid
        };
        if !is_valid {
            tracing::debug!("submit attempt dropped, form is invalid");
            return;
        }
        let snapshot = self.snapshot();
        {
            let mut state = self.state.borrow_mut();
            state.valid_submit_count = state.valid_submit_count.saturating_add(1);
        }
        self.valid_submits.next(snapshot);
    }

    fn snapshot(&self) -> FormSnapshot<K> {
        FormSnapshot::new(
            self.fields
                .iter()
                .map(|field| (field.id().clone(), field.snapshot_value()))
                .collect(),
        )
    }
}

/// A frozen set of fields plus a submit trigger, built by
/// [`FormBuilder`](super::FormBuilder).
///
/// Cloning yields another handle to the same form.
pub struct Form<K> {
    inner: Rc<FormInner<K>>,
}

impl<K> Clone for Form<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> Form<K>
where
    K: Clone + Eq + Hash + Debug + 'static,
{
    pub(super) fn new(
        fields: Vec<Box<dyn ErasedField<K>>>,
        submit: Observable<()>,
        options: FormOptions,
    ) -> Self {
        let validity = fields
            .iter()
            .map(|field| {
                if field.has_validators() {
                    FieldValidity::Untouched
                } else {
                    FieldValidity::Valid
                }
            })
            .collect();
        let inner = Rc::new(FormInner {
            options,
            fields,
            state: RefCell::new(FormState {
                validity,
                is_valid: false,
                published: false,
                submit_count: 0,
                valid_submit_count: 0,
            }),
            form_validity: Subject::replaying(),
            valid_submits: Subject::new(),
            disposables: DisposeBag::new(),
            disposed: Cell::new(false),
        });

        for (index, field) in inner.fields.iter().enumerate() {
            let form = Rc::downgrade(&inner);
            inner
                .disposables
                .add(field.states().subscribe(move |state: &FieldState<K>| {
                    with_form(&form, |form| form.on_field_state(index, state));
                }));
        }
        // Submit sources may deliver on subscribe, so validity must be known first.
        inner.publish_initial_validity();
        let form = Rc::downgrade(&inner);
        inner.disposables.add(submit.subscribe(move |_: &()| {
            with_form(&form, FormInner::on_submit_attempt);
        }));
        Self { inner }
    }

    pub fn on_field_validation_change(&self) -> Observable<FieldState<K>> {
        if self.is_disposed() {
            return Observable::empty();
        }
        Observable::merge(self.inner.fields.iter().map(|field| field.states()))
    }

    /// Aggregate validity: the initial computation, then every transition.
    pub fn on_form_validation_change(&self) -> Observable<bool> {
        if self.is_disposed() {
            return Observable::empty();
        }
        self.inner.form_validity.observable()
    }

    pub fn on_valid_submit(&self) -> Observable<FormSnapshot<K>> {
        if self.is_disposed() {
            return Observable::empty();
        }
        self.inner.valid_submits.observable()
    }

    /// Releases every subscription and completes every output. Safe to call
    /// repeatedly and from inside any of the form's own callbacks.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        tracing::debug!(fields = self.inner.fields.len(), "disposing form");
        self.inner.disposables.dispose();
        for field in &self.inner.fields {
            field.dispose();
        }
        self.inner.form_validity.complete();
        self.inner.valid_submits.complete();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.state.borrow().is_valid
    }

    pub fn options(&self) -> FormOptions {
        self.inner.options
    }

    pub fn field_count(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn field_ids(&self) -> Vec<K> {
        self.inner
            .fields
            .iter()
            .map(|field| field.id().clone())
            .collect()
    }

    /// Messages of the field's latest evaluation; `None` for unknown or
    /// untouched fields.
    pub fn field_messages(&self, field: &K) -> Option<Vec<ValidationMessage>> {
        self.inner
            .fields
            .iter()
            .find(|entry| entry.id() == field)
            .and_then(|entry| entry.latest_state())
            .map(|state| state.messages)
    }

    pub fn snapshot(&self) -> FormSnapshot<K> {
        self.inner.snapshot()
    }

    pub fn submit_count(&self) -> u64 {
        self.inner.state.borrow().submit_count
    }

    pub fn valid_submit_count(&self) -> u64 {
        self.inner.state.borrow().valid_submit_count
    }
}

impl<K> Debug for Form<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ids = self
            .inner
            .fields
            .iter()
            .map(|field| field.id())
            .collect::<Vec<_>>();
        f.debug_struct("Form")
            .field("fields", &ids)
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

fn with_form<K>(form: &Weak<FormInner<K>>, f: impl FnOnce(&FormInner<K>)) {
    if let Some(form) = form.upgrade() {
        f(&form);
    }
}
