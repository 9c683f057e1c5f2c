use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::controller::FormOptions;
use super::observable::{Observable, Subject, Subscription, ValueSource};
use super::snapshot::SnapshotValue;
use super::validation::{ValidationMessage, ValidatorChain};

/// Validation result of one field for one observed value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldState<K> {
    pub field: K,
    pub messages: Vec<ValidationMessage>,
}

impl<K> FieldState<K> {
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages joined for a single error label.
    pub fn joined(&self, separator: &str) -> String {
        self.messages
            .iter()
            .map(ValidationMessage::message)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// One field bound to its value source. Every value is run through the
/// validator chain and the outcome is published as a [`FieldState`]; both
/// the states and the raw values replay their latest entry to new
/// subscribers.
pub struct Field<K, V> {
    id: K,
    validators: Rc<ValidatorChain<V>>,
    first_error_only: bool,
    states: Subject<FieldState<K>>,
    values: Subject<V>,
    source: RefCell<Subscription>,
}

impl<K, V> Field<K, V>
where
    K: Clone + Debug + 'static,
    V: Clone + 'static,
{
    pub fn bind(
        id: K,
        source: impl ValueSource<V>,
        validators: ValidatorChain<V>,
        options: &FormOptions,
    ) -> Self {
        let validators = Rc::new(validators);
        let first_error_only = options.validate_first_error_only;
        let states = Subject::replaying();
        let values = Subject::replaying();

        let subscription = {
            let id = id.clone();
            let validators = validators.clone();
            let states = states.clone();
            let values = values.clone();
            source.observe().subscribe(move |value: &V| {
                values.next(value.clone());
                let messages = validators.validate(value, first_error_only);
                tracing::trace!(field = ?id, messages = messages.len(), "field evaluated");
                states.next(FieldState {
                    field: id.clone(),
                    messages,
                });
            })
        };

        Self {
            id,
            validators,
            first_error_only,
            states,
            values,
            source: RefCell::new(subscription),
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn states(&self) -> Observable<FieldState<K>> {
        self.states.observable()
    }

    pub fn values(&self) -> Observable<V> {
        self.values.observable()
    }

    pub fn latest_state(&self) -> Option<FieldState<K>> {
        self.states.latest()
    }

    pub fn latest_value(&self) -> Option<V> {
        self.values.latest()
    }

    pub fn has_validators(&self) -> bool {
        !self.validators.is_empty()
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Runs the chain without publishing anything.
    pub fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        self.validators.validate(value, self.first_error_only)
    }

    pub fn is_disposed(&self) -> bool {
        self.states.is_completed()
    }

    /// Detaches from the source and completes both streams. Idempotent.
    pub fn dispose(&self) {
        let mut subscription = self.source.replace(Subscription::empty());
        subscription.unsubscribe();
        self.states.complete();
        self.values.complete();
    }
}

impl<K, V> Debug for Field<K, V>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// What the form needs from a field once its value type is erased.
pub(super) trait ErasedField<K> {
    fn id(&self) -> &K;
    fn has_validators(&self) -> bool;
    fn states(&self) -> Observable<FieldState<K>>;
    fn latest_state(&self) -> Option<FieldState<K>>;
    fn snapshot_value(&self) -> Option<SnapshotValue>;
    fn dispose(&self);
}

impl<K, V> ErasedField<K> for Field<K, V>
where
    K: Clone + Debug + 'static,
    V: Clone + Debug + 'static,
{
    fn id(&self) -> &K {
        Field::id(self)
    }

    fn has_validators(&self) -> bool {
        Field::has_validators(self)
    }

    fn states(&self) -> Observable<FieldState<K>> {
        Field::states(self)
    }

    fn latest_state(&self) -> Option<FieldState<K>> {
        Field::latest_state(self)
    }

    fn snapshot_value(&self) -> Option<SnapshotValue> {
        self.latest_value().map(SnapshotValue::new)
    }

    fn dispose(&self) {
        Field::dispose(self)
    }
}
