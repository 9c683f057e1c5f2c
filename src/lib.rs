pub mod form;
pub mod i18n;
pub mod prelude;

#[cfg(test)]
mod test_public_api;

pub use form::{Form, FormBuilder, FormError, FormResult, FormSnapshot};
pub use i18n::{I18nManager, Locale};
