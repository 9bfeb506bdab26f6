use mailing_list_ingest::{ContactRole, FieldValue, IntoFields, normalize_contact};

#[test]
fn test_role_decides_field_names() {
    let fields =
        normalize_contact(ContactRole::Cc, "Ida B. Wells <ida.b.wells@gmail.com>").into_fields();
    assert_eq!(
        fields,
        vec![
            ("raw_cc_string", FieldValue::from("Ida B. Wells <ida.b.wells@gmail.com>")),
            ("cc_name", FieldValue::from("ida b. wells")),
            ("cc_email", FieldValue::from("ida.b.wells@gmail.com")),
        ]
    );
}

#[test]
fn test_unrecoverable_parts_are_omitted() {
    let fields = normalize_contact(ContactRole::To, "To: Cori Bush").into_fields();
    assert_eq!(
        fields,
        vec![
            ("raw_to_string", FieldValue::from("To: Cori Bush")),
            ("to_name", FieldValue::from("cori bush")),
        ]
    );
}

#[test]
fn test_obfuscated_forms() {
    let spelled = normalize_contact(
        ContactRole::From,
        "From: us.congress at gmail.com (US Congress)\n",
    );
    assert_eq!(spelled.name.as_deref(), Some("us congress"));
    assert_eq!(spelled.email.as_deref(), Some("us.congress@gmail.com"));

    let parenthesized =
        normalize_contact(ContactRole::To, "Yvette Herrell (yvette at herrell.com)");
    assert_eq!(parenthesized.name.as_deref(), Some("yvette herrell"));
    assert_eq!(parenthesized.email.as_deref(), Some("yvette@herrell.com"));
}

#[test]
fn test_swapped_order_gives_same_assignment() {
    let straight = normalize_contact(ContactRole::From, "US Congress <us.congress@gmail.com>");
    let swapped = normalize_contact(ContactRole::From, "us.congress@gmail.com <US Congress>");
    assert_eq!(straight.name, swapped.name);
    assert_eq!(straight.email, swapped.email);
}
