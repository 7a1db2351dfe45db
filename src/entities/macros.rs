//! Macros for reducing boilerplate when declaring hypermedia resources
//!
//! These macros generate the repetitive trait implementations each resource
//! type needs: its searchable field table, field access on the underlying
//! record, link traversal and form metadata.

/// Declare the searchable/sortable field table of an output resource
///
/// Each entry maps a wire name to the record field it reads, the value kind
/// and optional `searchable`/`sortable` flags.
///
/// # Example
/// ```rust,ignore
/// impl_searchable!(WorldRest, "worlds", {
///     "worldName" => world_name: String [searchable, sortable],
///     "tenantName" => tenant_name: String [searchable, sortable],
///     "createdAt" => created_at: DateTimeOffset [sortable],
///     "serverIp" => server_ip: String,
/// });
/// ```
#[macro_export]
macro_rules! impl_searchable {
    ($type:ty, $resource:expr, {
        $( $wire:literal => $source:ident : $kind:ident $( [ $( $flag:ident ),* $(,)? ] )? ),* $(,)?
    }) => {
        impl $crate::core::descriptor::Searchable for $type {
            fn resource_name() -> &'static str {
                $resource
            }

            fn field_descriptors() -> Vec<$crate::core::descriptor::FieldDescriptor> {
                vec![
                    $(
                        $crate::core::descriptor::FieldDescriptor::new(
                            $wire,
                            stringify!($source),
                            $crate::core::field::ValueKind::$kind,
                        )
                        $( $( .$flag() )* )?
                    ),*
                ]
            }
        }
    };
}

/// Expose record fields to compiled filters and sort plans
///
/// Every listed field must convert into a
/// [`FieldValue`](crate::core::field::FieldValue); `Option` fields become
/// `Null` when empty.
///
/// # Example
/// ```rust,ignore
/// impl_field_source!(WorldRecord { world_name, tenant_name, created_at });
/// ```
#[macro_export]
macro_rules! impl_field_source {
    ($type:ty { $( $field:ident ),* $(,)? }) => {
        impl $crate::core::descriptor::FieldSource for $type {
            fn field_value(&self, source: &str) -> Option<$crate::core::field::FieldValue> {
                $(
                    if source == stringify!($field) {
                        return Some($crate::core::field::FieldValue::from(self.$field.clone()));
                    }
                )*
                None
            }
        }
    };
}

/// Implement link traversal for a resource
///
/// List every field that is a `Link`, an `Option`/`Vec` of links, or a
/// nested hypermedia resource. Plain data fields are left out.
///
/// # Example
/// ```rust,ignore
/// impl_hypermedia!(WorldRest { self_link, residents, create_resident });
/// ```
#[macro_export]
macro_rules! impl_hypermedia {
    ($type:ty { $( $field:ident ),* $(,)? }) => {
        impl $crate::links::resolver::Hypermedia for $type {
            #[allow(unused_variables)]
            fn visit_links(
                &mut self,
                walker: &mut $crate::links::resolver::LinkWalker<'_>,
            ) -> Result<(), $crate::core::error::ResolutionError> {
                $( walker.visit(&mut self.$field)?; )*
                Ok(())
            }
        }
    };
}

/// Declare the form fields of an input model
///
/// Each entry is `name => label` plus optional flags: `required`, `secret`,
/// `description("...")`, `field_type("...")`, `length(min, max)`.
///
/// # Example
/// ```rust,ignore
/// impl_form_model!(PasswordGrantForm {
///     "grant_type" => "Grant type" [required],
///     "username" => "Email" [required, description("Email address")],
///     "password" => "Password" [required, secret, length(8, 100)],
/// });
/// ```
#[macro_export]
macro_rules! impl_form_model {
    ($type:ty {
        $( $name:literal => $label:literal
            $( [ $( $flag:ident $( ( $( $arg:expr ),* ) )? ),* $(,)? ] )?
        ),* $(,)?
    }) => {
        impl $crate::links::form::FormModel for $type {
            fn form_fields() -> Vec<$crate::links::form::FormFieldSpec> {
                vec![
                    $(
                        $crate::links::form::FormFieldSpec::new($name, $label)
                        $( $( .$flag( $( $( $arg ),* )? ) )* )?
                    ),*
                ]
            }
        }
    };
}
