//! Predefined templates shipped with the builder

use super::Template;
use crate::state::{FieldDefinition, FieldType, FieldValidation, NewField, Step};

fn field(id: &str, field: NewField) -> FieldDefinition {
    FieldDefinition::from_new(id.to_string(), field)
}

fn step(id: &str, title: &str, fields: Vec<FieldDefinition>) -> Step {
    Step {
        id: id.to_string(),
        title: title.to_string(),
        fields,
    }
}

fn contact() -> Template {
    Template {
        id: "contact".to_string(),
        title: "Contact Form".to_string(),
        steps: vec![step(
            "step-1",
            "Contact Information",
            vec![
                field(
                    "name",
                    NewField::new(FieldType::ShortText, "Full Name")
                        .required()
                        .with_placeholder("Enter your full name"),
                ),
                field(
                    "email",
                    NewField::new(FieldType::Email, "Email Address")
                        .required()
                        .with_placeholder("Enter your email address"),
                ),
                field(
                    "phone",
                    NewField::new(FieldType::Phone, "Phone Number")
                        .with_placeholder("Enter your phone number"),
                ),
                field(
                    "message",
                    NewField::new(FieldType::LongText, "Message")
                        .required()
                        .with_placeholder("Enter your message")
                        .with_validation(FieldValidation::length(Some(10), Some(500))),
                ),
            ],
        )],
        saved_at: None,
    }
}

fn registration() -> Template {
    Template {
        id: "registration".to_string(),
        title: "Registration Form".to_string(),
        steps: vec![
            step(
                "step-1",
                "Personal Information",
                vec![
                    field(
                        "firstName",
                        NewField::new(FieldType::ShortText, "First Name")
                            .required()
                            .with_placeholder("Enter your first name"),
                    ),
                    field(
                        "lastName",
                        NewField::new(FieldType::ShortText, "Last Name")
                            .required()
                            .with_placeholder("Enter your last name"),
                    ),
                    field(
                        "dob",
                        NewField::new(FieldType::Date, "Date of Birth").required(),
                    ),
                    field(
                        "gender",
                        NewField::new(FieldType::SingleSelect, "Gender")
                            .required()
                            .with_options(["Male", "Female", "Other", "Prefer not to say"]),
                    ),
                ],
            ),
            step(
                "step-2",
                "Account Information",
                vec![
                    field(
                        "email",
                        NewField::new(FieldType::Email, "Email Address")
                            .required()
                            .with_placeholder("Enter your email address"),
                    ),
                    field(
                        "password",
                        NewField::new(FieldType::ShortText, "Password")
                            .required()
                            .with_placeholder("Enter your password")
                            .with_validation(FieldValidation::length(Some(8), None)),
                    ),
                    field(
                        "terms",
                        NewField::new(FieldType::Boolean, "I agree to the terms and conditions")
                            .required(),
                    ),
                ],
            ),
        ],
        saved_at: None,
    }
}

/// Templates available to every user
pub fn predefined() -> Vec<Template> {
    vec![contact(), registration()]
}
