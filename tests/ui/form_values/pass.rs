use rxform::form::{FormBuilder, FormValues, Subject};
use rxform::validators;

#[derive(Debug, FormValues)]
struct SignUp {
    email: String,
    #[form(id = "display-name")]
    name: Option<String>,
}

fn main() {
    let email = Subject::<String>::new();
    let name = Subject::<Option<String>>::new();
    let submit = Subject::<()>::new();
    let form = FormBuilder::new(&submit)
        .add_field_validations("email", &email, validators![])
        .expect("register email")
        .add_field_validations("display-name", &name, validators![])
        .expect("register name")
        .build();

    email.next("a@b.com".to_string());
    name.next(None);

    let values = form.snapshot().extract::<SignUp>().expect("every value is set");
    assert_eq!(values.email, "a@b.com");
    assert_eq!(values.name, None);
    assert_eq!(SignUp::FIELD_IDS, &["email", "display-name"]);
}
