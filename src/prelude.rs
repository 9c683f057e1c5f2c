pub use crate::form::{
    EmailValidator, FieldState, Form, FormBuilder, FormError, FormOptions, FormResult,
    FormSnapshot, FormValues, FromSnapshot, MaxLengthValidator, MinLengthValidator, Observable,
    RequiredValidator, Subject, Subscription, UntouchedFieldPolicy, ValidationMessage, Validator,
    ValidatorChain,
};
pub use crate::i18n::{I18nManager, Locale};
