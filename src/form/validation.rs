use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;

use super::controller::{FormError, FormResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Email,
    MinValue,
    MaxValue,
    Range,
    Custom,
}

/// One failed rule. Messages are localized by the caller before the
/// validator is constructed.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ValidationMessage {
    message: Arc<str>,
    kind: RuleKind,
}

impl ValidationMessage {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self::with_kind(message, RuleKind::Custom)
    }

    pub fn with_kind(message: impl Into<Arc<str>>, kind: RuleKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }
}

impl Display for ValidationMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&str> for ValidationMessage {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ValidationMessage {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A pure check over a field value. An empty result means the value passed.
pub trait Validator<V: ?Sized> {
    fn validate(&self, value: &V) -> Vec<ValidationMessage>;
}

impl<V, F> Validator<V> for F
where
    V: ?Sized,
    F: Fn(&V) -> Vec<ValidationMessage>,
{
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        (self)(value)
    }
}

pub struct ValidatorChain<V> {
    validators: Vec<Box<dyn Validator<V>>>,
}

impl<V> ValidatorChain<V> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn with(mut self, validator: impl Validator<V> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn push(&mut self, validator: impl Validator<V> + 'static) {
        self.validators.push(Box::new(validator));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validate(&self, value: &V, first_error_only: bool) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();
        for validator in &self.validators {
            messages.extend(validator.validate(value));
            if first_error_only && !messages.is_empty() {
                break;
            }
        }
        messages
    }
}

impl<V> Default for ValidatorChain<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<Vec<Box<dyn Validator<V>>>> for ValidatorChain<V> {
    fn from(validators: Vec<Box<dyn Validator<V>>>) -> Self {
        Self { validators }
    }
}

impl<V> FromIterator<Box<dyn Validator<V>>> for ValidatorChain<V> {
    fn from_iter<I: IntoIterator<Item = Box<dyn Validator<V>>>>(iter: I) -> Self {
        Self {
            validators: iter.into_iter().collect(),
        }
    }
}

#[macro_export]
macro_rules! validators {
    () => {
        $crate::form::ValidatorChain::new()
    };
    ($($validator:expr),+ $(,)?) => {
        $crate::form::ValidatorChain::new()$(.with($validator))+
    };
}

pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl Blank for Arc<str> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_blank()
    }
}

impl Blank for Rc<str> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_blank()
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().is_none_or(Blank::is_blank)
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Blank for [T] {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Blank + ?Sized> Blank for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

/// Length as a user perceives it: characters for text, elements for
/// collections.
pub trait Measure {
    fn measure(&self) -> usize;
}

impl Measure for str {
    fn measure(&self) -> usize {
        self.chars().count()
    }
}

impl Measure for String {
    fn measure(&self) -> usize {
        self.as_str().measure()
    }
}

impl Measure for Arc<str> {
    fn measure(&self) -> usize {
        self.as_ref().measure()
    }
}

impl Measure for Rc<str> {
    fn measure(&self) -> usize {
        self.as_ref().measure()
    }
}

impl<T: Measure> Measure for Option<T> {
    fn measure(&self) -> usize {
        self.as_ref().map_or(0, Measure::measure)
    }
}

impl<T> Measure for Vec<T> {
    fn measure(&self) -> usize {
        self.len()
    }
}

impl<T> Measure for [T] {
    fn measure(&self) -> usize {
        self.len()
    }
}

impl<T: Measure + ?Sized> Measure for &T {
    fn measure(&self) -> usize {
        (**self).measure()
    }
}

fn single(message: &ValidationMessage, failed: bool) -> Vec<ValidationMessage> {
    if failed {
        vec![message.clone()]
    } else {
        Vec::new()
    }
}

/// Fails on `None`, empty or whitespace-only text and empty collections.
#[derive(Clone, Debug)]
pub struct RequiredValidator {
    message: ValidationMessage,
}

impl RequiredValidator {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::Required),
        }
    }
}

impl<V: Blank + ?Sized> Validator<V> for RequiredValidator {
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        single(&self.message, value.is_blank())
    }
}

#[derive(Clone, Debug)]
pub struct MinLengthValidator {
    message: ValidationMessage,
    min_length: usize,
}

impl MinLengthValidator {
    pub fn new(message: impl Into<Arc<str>>, min_length: usize) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::MinLength),
            min_length,
        }
    }

    /// For lengths read from signed configuration; negative values are rejected.
    pub fn try_from_signed(message: impl Into<Arc<str>>, min_length: i64) -> FormResult<Self> {
        let min_length =
            usize::try_from(min_length).map_err(|_| FormError::InvalidValidatorParameter {
                validator: "MinLengthValidator",
                reason: format!("minimum length must not be negative, got {min_length}"),
            })?;
        Ok(Self::new(message, min_length))
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl<V: Measure + ?Sized> Validator<V> for MinLengthValidator {
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        single(&self.message, value.measure() < self.min_length)
    }
}

#[derive(Clone, Debug)]
pub struct MaxLengthValidator {
    message: ValidationMessage,
    max_length: usize,
}

impl MaxLengthValidator {
    pub fn new(message: impl Into<Arc<str>>, max_length: usize) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::MaxLength),
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl<V: Measure + ?Sized> Validator<V> for MaxLengthValidator {
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        single(&self.message, value.measure() > self.max_length)
    }
}

#[derive(Clone, Debug)]
pub struct LengthRangeValidator {
    message: ValidationMessage,
    min_length: usize,
    max_length: usize,
}

impl LengthRangeValidator {
    pub fn new(
        message: impl Into<Arc<str>>,
        min_length: usize,
        max_length: usize,
    ) -> FormResult<Self> {
        if min_length > max_length {
            return Err(FormError::InvalidValidatorParameter {
                validator: "LengthRangeValidator",
                reason: format!("minimum length {min_length} exceeds maximum length {max_length}"),
            });
        }
        Ok(Self {
            message: ValidationMessage::with_kind(message, RuleKind::Range),
            min_length,
            max_length,
        })
    }
}

impl<V: Measure + ?Sized> Validator<V> for LengthRangeValidator {
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        let length = value.measure();
        single(
            &self.message,
            length < self.min_length || length > self.max_length,
        )
    }
}

/// Structural address check. Blank values pass; pair with
/// [`RequiredValidator`] to reject them.
#[derive(Clone, Debug)]
pub struct EmailValidator {
    message: ValidationMessage,
}

impl EmailValidator {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::Email),
        }
    }
}

impl<V: AsRef<str> + ?Sized> Validator<V> for EmailValidator {
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        let value = value.as_ref();
        single(
            &self.message,
            !value.is_blank() && !looks_like_email(value.trim()),
        )
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels = domain.split('.').collect::<Vec<_>>();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn at_least<T: PartialOrd>(value: &T, bound: &T) -> bool {
    matches!(
        value.partial_cmp(bound),
        Some(Ordering::Greater | Ordering::Equal)
    )
}

/// Fails when the value is below `min` or not comparable to it.
#[derive(Clone, Debug)]
pub struct MinValueValidator<T> {
    message: ValidationMessage,
    min: T,
}

impl<T> MinValueValidator<T> {
    pub fn new(message: impl Into<Arc<str>>, min: T) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::MinValue),
            min,
        }
    }
}

impl<T: PartialOrd> Validator<T> for MinValueValidator<T> {
    fn validate(&self, value: &T) -> Vec<ValidationMessage> {
        single(&self.message, !at_least(value, &self.min))
    }
}

#[derive(Clone, Debug)]
pub struct MaxValueValidator<T> {
    message: ValidationMessage,
    max: T,
}

impl<T> MaxValueValidator<T> {
    pub fn new(message: impl Into<Arc<str>>, max: T) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::MaxValue),
            max,
        }
    }
}

impl<T: PartialOrd> Validator<T> for MaxValueValidator<T> {
    fn validate(&self, value: &T) -> Vec<ValidationMessage> {
        single(&self.message, !at_least(&self.max, value))
    }
}

#[derive(Clone, Debug)]
pub struct RangeValidator<T> {
    message: ValidationMessage,
    min: T,
    max: T,
}

impl<T: PartialOrd> RangeValidator<T> {
    pub fn new(message: impl Into<Arc<str>>, min: T, max: T) -> FormResult<Self> {
        if !at_least(&max, &min) {
            return Err(FormError::InvalidValidatorParameter {
                validator: "RangeValidator",
                reason: "minimum must be comparable to and not greater than maximum".to_string(),
            });
        }
        Ok(Self {
            message: ValidationMessage::with_kind(message, RuleKind::Range),
            min,
            max,
        })
    }
}

impl<T: PartialOrd> Validator<T> for RangeValidator<T> {
    fn validate(&self, value: &T) -> Vec<ValidationMessage> {
        single(
            &self.message,
            !(at_least(value, &self.min) && at_least(&self.max, value)),
        )
    }
}

pub struct PredicateValidator<F> {
    message: ValidationMessage,
    predicate: F,
}

impl<F> PredicateValidator<F> {
    pub fn new(message: impl Into<Arc<str>>, predicate: F) -> Self {
        Self {
            message: ValidationMessage::with_kind(message, RuleKind::Custom),
            predicate,
        }
    }
}

impl<V, F> Validator<V> for PredicateValidator<F>
where
    V: ?Sized,
    F: Fn(&V) -> bool,
{
    fn validate(&self, value: &V) -> Vec<ValidationMessage> {
        single(&self.message, !(self.predicate)(value))
    }
}
