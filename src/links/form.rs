//! Self-describing forms
//!
//! A [`Form`] tells clients which fields an input model accepts and where to
//! submit it. Forms are built per response because the submission link often
//! depends on the resource being rendered.

use serde::Serialize;
use serde_json::Value;

use crate::core::descriptor::Searchable;
use crate::core::error::ResolutionError;
use crate::core::registry::FieldRegistry;
use crate::links::link::Link;
use crate::links::resolver::{Hypermedia, LinkWalker};

/// Static declaration of one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub description: Option<&'static str>,
    pub field_type: &'static str,
    pub required: bool,
    pub secret: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FormFieldSpec {
    /// Optional string field
    pub const fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            description: None,
            field_type: "string",
            required: false,
            secret: false,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub const fn field_type(mut self, field_type: &'static str) -> Self {
        self.field_type = field_type;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Never echo the current value back to clients
    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

/// An input model that can describe itself as a form
///
/// Field names must match the model's serialized field names so current
/// values can be filled in.
pub trait FormModel: Serialize {
    fn form_fields() -> Vec<FormFieldSpec>;
}

/// Field metadata as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub secret: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl From<&FormFieldSpec> for FormField {
    fn from(spec: &FormFieldSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            description: spec.description.map(str::to_string),
            field_type: spec.field_type.to_string(),
            required: spec.required,
            secret: spec.secret,
            min_length: spec.min_length,
            max_length: spec.max_length,
            value: None,
        }
    }
}

/// Form metadata plus its submission link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub submit: Link,
}

impl Form {
    /// Blank form for a model type
    pub fn for_model<M: FormModel>(submit: Link) -> Self {
        Self {
            fields: M::form_fields().iter().map(FormField::from).collect(),
            submit,
        }
    }

    /// Form pre-filled with the current values of `model`
    ///
    /// Secret fields and null values are left empty.
    pub fn from_model<M: FormModel>(model: &M, submit: Link) -> Result<Self, serde_json::Error> {
        let current = serde_json::to_value(model)?;
        let fields = M::form_fields()
            .iter()
            .map(|spec| {
                let mut field = FormField::from(spec);
                if !spec.secret {
                    field.value = current.get(spec.name).filter(|v| !v.is_null()).cloned();
                }
                field
            })
            .collect();
        Ok(Self { fields, submit })
    }

    /// Query form over the searchable fields of `T`
    pub fn query_for<T: Searchable>(submit: Link) -> Self {
        let set = FieldRegistry::global().register::<T>();
        let fields = set
            .searchable_fields()
            .map(|descriptor| {
                let operators: Vec<&str> =
                    descriptor.operators().iter().map(|op| op.as_str()).collect();
                FormField {
                    name: descriptor.name.to_string(),
                    label: descriptor.name.to_string(),
                    description: Some(format!("Operators: {}", operators.join(", "))),
                    field_type: descriptor.kind.form_type().to_string(),
                    required: false,
                    secret: false,
                    min_length: None,
                    max_length: None,
                    value: None,
                }
            })
            .collect();
        Self { fields, submit }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Hypermedia for Form {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        walker.link(&mut self.submit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::FieldDescriptor;
    use crate::core::field::ValueKind;
    use crate::links::link::relation;
    use axum::http::Method;
    use serde_json::json;

    #[derive(Serialize)]
    struct PasswordGrant {
        grant_type: String,
        username: String,
        password: String,
        scope: Option<String>,
    }

    impl FormModel for PasswordGrant {
        fn form_fields() -> Vec<FormFieldSpec> {
            vec![
                FormFieldSpec::new("grant_type", "Grant type").required(),
                FormFieldSpec::new("username", "Email")
                    .description("Email address")
                    .required(),
                FormFieldSpec::new("password", "Password")
                    .required()
                    .secret()
                    .length(8, 100),
                FormFieldSpec::new("scope", "Scope"),
            ]
        }
    }

    struct Resident;

    impl Searchable for Resident {
        fn resource_name() -> &'static str {
            "form-test-residents"
        }

        fn field_descriptors() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("name", "name", ValueKind::String).searchable(),
                FieldDescriptor::new("age", "age", ValueKind::Integer).searchable(),
                FieldDescriptor::new("email", "email", ValueKind::String).sortable(),
            ]
        }
    }

    fn grant() -> PasswordGrant {
        PasswordGrant {
            grant_type: "password".to_string(),
            username: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
            scope: None,
        }
    }

    #[test]
    fn test_secret_values_are_never_echoed() {
        let submit = Link::to_form("Token", Method::POST, relation::FORM);
        let form = Form::from_model(&grant(), submit).unwrap();

        let password = form.field("password").unwrap();
        assert!(password.secret);
        assert_eq!(password.value, None);
        assert_eq!(form.field("grant_type").unwrap().value, Some(json!("password")));
        assert_eq!(form.field("scope").unwrap().value, None);

        let body = serde_json::to_string(&form.fields).unwrap();
        assert!(!body.contains("hunter22"));
    }

    #[test]
    fn test_field_shape() {
        let form = Form::for_model::<PasswordGrant>(Link::to("Token"));
        let password = serde_json::to_value(form.field("password").unwrap()).unwrap();
        assert_eq!(
            password,
            json!({
                "name": "password",
                "label": "Password",
                "type": "string",
                "required": true,
                "secret": true,
                "minLength": 8,
                "maxLength": 100
            })
        );
    }

    #[test]
    fn test_query_form_lists_searchable_fields() {
        let form = Form::query_for::<Resident>(Link::to("GetResidents"));
        let names: Vec<_> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);

        let age = form.field("age").unwrap();
        assert_eq!(age.field_type, "integer");
        assert_eq!(age.description.as_deref(), Some("Operators: eq, ne, gt, ge, lt, le"));
    }
}
