//! Turns a `DeriveInput` into the model consumed by code generation.

pub mod attributes;

use darling::ast::Data;
use darling::{Error, FromDeriveInput};
use syn::{DeriveInput, Generics, Ident};

use attributes::{ContainerAttrs, FieldAttrs};

/// A declared marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerModel {
    /// The redaction marker
    Mask,
    /// Any other marker
    Tag(String),
}

/// Role of the type when passed as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleModel {
    Data,
    Error,
    ValidationContext,
}

/// One field listed in the type descriptor.
#[derive(Debug, Clone)]
pub struct FieldModel {
    pub ident: Ident,
    pub name: String,
    pub markers: Vec<MarkerModel>,
}

/// How the type reports its shape.
#[derive(Debug, Clone)]
pub enum Body {
    /// Named fields plus an optional embedded ancestor.
    Composite {
        fields: Vec<FieldModel>,
        parent: Option<Ident>,
    },
    /// Transport envelope around one field.
    Wrapped { payload: Ident },
    /// Single-field tuple struct delegating to its inner value.
    Transparent,
    /// Enum of unit variants, logged as the variant name.
    UnitEnum { variants: Vec<(Ident, String)> },
}

/// Everything code generation needs to know about the type.
#[derive(Debug, Clone)]
pub struct LoggableModel {
    pub ident: Ident,
    pub generics: Generics,
    pub type_name: String,
    pub markers: Vec<MarkerModel>,
    pub role: RoleModel,
    pub body: Body,
}

fn markers(mask: bool, tags: &[String]) -> Vec<MarkerModel> {
    let mut markers = Vec::with_capacity(tags.len() + 1);
    if mask {
        markers.push(MarkerModel::Mask);
    }
    markers.extend(tags.iter().cloned().map(MarkerModel::Tag));
    markers
}

/// Parses and validates the derive input.
pub fn parse(input: &DeriveInput) -> Result<LoggableModel, Error> {
    let attrs = ContainerAttrs::from_derive_input(input)?;

    let role = match (attrs.error, attrs.validation_context) {
        (true, true) => {
            return Err(Error::custom(
                "`error` and `validation_context` cannot be combined",
            )
            .with_span(&attrs.ident));
        }
        (true, false) => RoleModel::Error,
        (false, true) => RoleModel::ValidationContext,
        (false, false) => RoleModel::Data,
    };

    let mut container_markers = markers(attrs.mask, &attrs.tag);
    let type_name = attrs.type_name();
    let rename_rule = attrs.rename_all;

    let body = match &attrs.data {
        Data::Enum(variants) => Body::UnitEnum {
            variants: variants
                .iter()
                .map(|variant| (variant.ident.clone(), variant.variant_name(rename_rule)))
                .collect(),
        },
        Data::Struct(fields) if fields.is_tuple() => {
            // Inner field markers count as the type's own.
            if let Some(inner) = fields.fields.first() {
                container_markers.extend(markers(inner.mask, &inner.tag));
            }
            Body::Transparent
        }
        Data::Struct(fields) => struct_body(&fields.fields, rename_rule)?,
    };

    Ok(LoggableModel {
        ident: attrs.ident.clone(),
        generics: attrs.generics.clone(),
        type_name,
        markers: container_markers,
        role,
        body,
    })
}

fn struct_body(
    fields: &[FieldAttrs],
    rename_rule: Option<attributes::RenameRule>,
) -> Result<Body, Error> {
    let mut errors = Error::accumulator();
    let mut parent: Option<Ident> = None;
    let mut payload: Option<Ident> = None;
    let mut models = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };

        if field.parent && field.payload {
            errors.push(
                Error::custom("a field cannot be both `parent` and `payload`").with_span(&ident),
            );
            continue;
        }
        if field.parent {
            if parent.is_some() {
                errors.push(Error::custom("only one field can be `parent`").with_span(&ident));
            }
            parent = Some(ident);
            continue;
        }
        if field.payload {
            if payload.is_some() {
                errors.push(Error::custom("only one field can be `payload`").with_span(&ident));
            }
            payload = Some(ident);
            continue;
        }
        if field.skip {
            continue;
        }

        models.push(FieldModel {
            name: field.field_name(rename_rule),
            markers: markers(field.mask, &field.tag),
            ident,
        });
    }

    if let (Some(payload), Some(_)) = (&payload, &parent) {
        errors.push(
            Error::custom("an envelope with a `payload` cannot declare a `parent`")
                .with_span(payload),
        );
    }
    errors.finish()?;

    Ok(match payload {
        Some(payload) => Body::Wrapped { payload },
        None => Body::Composite {
            fields: models,
            parent,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn model(tokens: proc_macro2::TokenStream) -> Result<LoggableModel, Error> {
        let input: DeriveInput = syn::parse2(tokens).unwrap();
        parse(&input)
    }

    #[test]
    fn test_named_struct_is_composite() {
        let model = model(quote! {
            #[loggable(rename_all = "camelCase")]
            struct CustomerDto {
                #[loggable(mask)]
                credit_card: String,
                amount: f64,
                #[loggable(skip)]
                internal: u8,
                #[loggable(parent)]
                base: BaseDto,
            }
        })
        .unwrap();

        assert_eq!(model.type_name, "CustomerDto");
        assert_eq!(model.role, RoleModel::Data);
        match model.body {
            Body::Composite { fields, parent } => {
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["creditCard", "amount"]);
                assert_eq!(fields[0].markers, vec![MarkerModel::Mask]);
                assert!(fields[1].markers.is_empty());
                assert_eq!(parent.unwrap().to_string(), "base");
            }
            other => panic!("Expected composite, got {other:?}"),
        }
    }

    #[test]
    fn test_newtype_carries_markers() {
        let model = model(quote! {
            #[loggable(mask, tag = "pii")]
            struct CardNumber(String);
        })
        .unwrap();

        assert!(matches!(model.body, Body::Transparent));
        assert_eq!(
            model.markers,
            vec![MarkerModel::Mask, MarkerModel::Tag("pii".into())]
        );
    }

    #[test]
    fn test_unit_enum_variants() {
        let model = model(quote! {
            #[loggable(rename_all = "SCREAMING_SNAKE_CASE")]
            enum Status { Active, OnHold }
        })
        .unwrap();

        match model.body {
            Body::UnitEnum { variants } => {
                let names: Vec<_> = variants.iter().map(|(_, name)| name.as_str()).collect();
                assert_eq!(names, vec!["ACTIVE", "ON_HOLD"]);
            }
            other => panic!("Expected unit enum, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_makes_envelope() {
        let model = model(quote! {
            struct Response<T> {
                status: u16,
                #[loggable(payload)]
                body: T,
            }
        })
        .unwrap();
        assert!(matches!(model.body, Body::Wrapped { .. }));
    }

    #[test]
    fn test_error_roles() {
        let model = model(quote! {
            #[loggable(error)]
            struct Failure(String);
        })
        .unwrap();
        assert_eq!(model.role, RoleModel::Error);

        assert!(model_err(quote! {
            #[loggable(error, validation_context)]
            struct Both(String);
        }));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(model_err(quote! {
            enum Payment { Card(String), Cash }
        }));
        assert!(model_err(quote! {
            struct Pair(u8, u8);
        }));
        assert!(model_err(quote! {
            struct Twice {
                #[loggable(parent)]
                a: Base,
                #[loggable(parent)]
                b: Base,
            }
        }));
    }

    fn model_err(tokens: proc_macro2::TokenStream) -> bool {
        model(tokens).is_err()
    }
}
