mod builder;
mod controller;
mod field;
pub mod observable;
mod snapshot;
mod validation;


pub use builder::FormBuilder;
pub use controller::{Form, FormError, FormOptions, FormResult, UntouchedFieldPolicy};
pub use field::{Field, FieldState};
pub use observable::{
    DisposeBag, Observable, ObservableStream, Subject, Subscription, ValueSource,
};
pub use rxform_derive::FormValues;
pub use snapshot::{FormSnapshot, FromSnapshot, SnapshotValue};
pub use validation::{
    Blank, EmailValidator, LengthRangeValidator, MaxLengthValidator, MaxValueValidator, Measure,
    MinLengthValidator, MinValueValidator, PredicateValidator, RangeValidator, RequiredValidator,
    RuleKind, ValidationMessage, Validator, ValidatorChain,
};
