use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;

use super::controller::{Form, FormError, FormOptions, FormResult};
use super::field::{ErasedField, Field};
use super::observable::{Observable, ValueSource};
use super::validation::ValidatorChain;

type BindField<K> = Box<dyn FnOnce(&FormOptions) -> Box<dyn ErasedField<K>>>;

struct Registration<K> {
    id: K,
    bind: BindField<K>,
}

/// Collects field registrations. Fields are bound to their sources in
/// [`FormBuilder::build`], which consumes the builder.
pub struct FormBuilder<K> {
    submit: Observable<()>,
    options: FormOptions,
    ids: HashSet<K>,
    registrations: Vec<Registration<K>>,
}

impl<K> FormBuilder<K>
where
    K: Clone + Eq + Hash + Debug + 'static,
{
    pub fn new(submit: impl ValueSource<()>) -> Self {
        Self {
            submit: submit.observe(),
            options: FormOptions::default(),
            ids: HashSet::new(),
            registrations: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers one field. A field id may only be registered once.
    pub fn add_field_validations<V>(
        mut self,
        id: K,
        value_changes: impl ValueSource<V>,
        validators: ValidatorChain<V>,
    ) -> FormResult<Self>
    where
        V: Clone + Debug + 'static,
    {
        if !self.ids.insert(id.clone()) {
            return Err(FormError::DuplicateField {
                field: format!("{id:?}"),
            });
        }

        let source = value_changes.observe();
        let field_id = id.clone();
        self.registrations.push(Registration {
            id,
            bind: Box::new(move |options: &FormOptions| {
                Box::new(Field::bind(field_id, source, validators, options))
                    as Box<dyn ErasedField<K>>
            }),
        });
        Ok(self)
    }

    pub fn field_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn contains_field(&self, id: &K) -> bool {
        self.ids.contains(id)
    }

    pub fn build(self) -> Form<K> {
        tracing::debug!(
            fields = self.registrations.len(),
            options = ?self.options,
            "building form"
        );
        let options = self.options;
        let fields = self
            .registrations
            .into_iter()
            .map(|registration| (registration.bind)(&options))
            .collect();
        Form::new(fields, self.submit, options)
    }
}

impl<K> Debug for FormBuilder<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBuilder")
            .field(
                "fields",
                &self
                    .registrations
                    .iter()
                    .map(|registration| &registration.id)
                    .collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}
