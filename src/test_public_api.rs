use crate::form::FromSnapshot as _;
use rust_decimal::Decimal;

#[test]
fn prelude_smoke_builds_a_form() {
    use crate::prelude::*;

    let title = Subject::<String>::new();
    let submit = Subject::<()>::new();
    let form: Form<&'static str> = FormBuilder::new(&submit)
        .with_options(FormOptions {
            untouched_fields: UntouchedFieldPolicy::Valid,
            ..FormOptions::default()
        })
        .add_field_validations(
            "title",
            &title,
            ValidatorChain::new()
                .with(RequiredValidator::new("required"))
                .with(MinLengthValidator::new("too short", 2))
                .with(MaxLengthValidator::new("too long", 40)),
        )
        .expect("register title")
        .build();

    let _: Observable<FieldState<&'static str>> = form.on_field_validation_change();
    let _: Observable<bool> = form.on_form_validation_change();
    let _: Observable<FormSnapshot<&'static str>> = form.on_valid_submit();
    let _: FormResult<()> = Ok(());
    let _ = ValidationMessage::from("message");
    let _ = EmailValidator::new("invalid");
    let _ = I18nManager::with_locale(Locale::from("en-US"));
    form.dispose();
}

#[test]
fn root_facade_exports_core_types() {
    let _ = crate::FormBuilder::<u32>::new(crate::form::Subject::<()>::new()).build();
    let _ = crate::I18nManager::default();
    let _ = crate::Locale::System;
    let _: crate::FormResult<()> = Err(crate::FormError::DuplicateField {
        field: "id".to_string(),
    });
    let _ = crate::form::observable::DisposeBag::new();
    let _ = crate::form::RuleKind::Custom;
    let _ = crate::form::SnapshotValue::new(Decimal::ONE);
}

#[derive(Debug, crate::form::FormValues)]
struct ApiSmokeValues {
    title: String,
    enabled: bool,
    amount: Decimal,
}

#[test]
fn form_values_public_api_smoke_compiles() {
    let title = crate::form::Subject::<String>::new();
    let enabled = crate::form::Subject::<bool>::new();
    let amount = crate::form::Subject::<Decimal>::new();
    let submit = crate::form::Subject::<()>::new();
    let form = crate::form::FormBuilder::new(&submit)
        .add_field_validations(
            "title",
            &title,
            crate::validators![crate::form::RequiredValidator::new("required")],
        )
        .expect("register title")
        .add_field_validations("enabled", &enabled, crate::validators![])
        .expect("register enabled")
        .add_field_validations(
            "amount",
            &amount,
            crate::validators![
                crate::form::RangeValidator::new(
                    "out of range",
                    Decimal::ZERO,
                    Decimal::from_i128_with_scale(100_000, 2),
                )
                .expect("valid range")
            ],
        )
        .expect("register amount")
        .build();

    title.next("draft".to_string());
    enabled.next(true);
    amount.next(Decimal::from_i128_with_scale(500, 2));

    let values = ApiSmokeValues::from_snapshot(&form.snapshot()).expect("typed values");
    assert_eq!(values.title, "draft");
    assert!(values.enabled);
    assert_eq!(values.amount, Decimal::from_i128_with_scale(500, 2));
    assert_eq!(ApiSmokeValues::FIELD_IDS, &["title", "enabled", "amount"]);
}
