//! Attribute parsing using darling.
//!
//! Defines the `#[loggable(...)]` attributes accepted on containers,
//! fields and enum variants.

use darling::ast::Data;
use darling::{FromDeriveInput, FromField, FromMeta, FromVariant};
use syn::{Generics, Ident};

/// Container-level attributes.
/// Parsed from `#[loggable(...)]` on the type definition.
#[derive(Debug, FromDeriveInput)]
#[darling(
    attributes(loggable),
    supports(struct_named, struct_newtype, enum_unit)
)]
pub struct ContainerAttrs {
    /// The identifier of the type
    pub ident: Ident,

    /// Generic parameters of the type
    pub generics: Generics,

    /// Fields or variants
    pub data: Data<VariantAttrs, FieldAttrs>,

    /// Redact values of this type when masking is requested
    #[darling(default)]
    pub mask: bool,

    /// Values of this type are errors and are never logged as arguments
    #[darling(default)]
    pub error: bool,

    /// Values of this type hold validation results and are never logged
    /// as arguments
    #[darling(default)]
    pub validation_context: bool,

    /// Rename the type in its descriptor
    #[darling(default)]
    pub rename: Option<String>,

    /// Rename all fields or variants using a case convention
    #[darling(default)]
    pub rename_all: Option<RenameRule>,

    /// Additional non-redaction markers
    #[darling(multiple)]
    pub tag: Vec<String>,
}

impl ContainerAttrs {
    /// Get the type name (renamed or original).
    pub fn type_name(&self) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| self.ident.to_string())
    }
}

/// Field-level attributes parsed from `#[loggable(...)]` on struct fields.
#[derive(Debug, Clone, FromField)]
#[darling(attributes(loggable))]
pub struct FieldAttrs {
    /// Field identifier (None for tuple struct fields)
    pub ident: Option<Ident>,

    /// Redact this field when masking is requested
    #[darling(default)]
    pub mask: bool,

    /// Leave this field out of the encoded object
    #[darling(default)]
    pub skip: bool,

    /// Rename this field
    #[darling(default)]
    pub rename: Option<String>,

    /// This field holds the embedded ancestor value
    #[darling(default)]
    pub parent: bool,

    /// This field is the payload of a transport envelope
    #[darling(default)]
    pub payload: bool,

    /// Additional non-redaction markers
    #[darling(multiple)]
    pub tag: Vec<String>,
}

impl FieldAttrs {
    /// Get the logged field name, considering rename and rename_all.
    pub fn field_name(&self, rename_rule: Option<RenameRule>) -> String {
        // Explicit rename takes precedence
        if let Some(ref name) = self.rename {
            return name.clone();
        }

        let name = self.ident.as_ref().map(unraw).unwrap_or_default();
        match rename_rule {
            Some(rule) => rule.apply(&name),
            None => name,
        }
    }
}

/// Variant-level attributes parsed from `#[loggable(...)]` on enum variants.
#[derive(Debug, Clone, FromVariant)]
#[darling(attributes(loggable))]
pub struct VariantAttrs {
    /// Variant identifier
    pub ident: Ident,

    /// Rename this variant
    #[darling(default)]
    pub rename: Option<String>,
}

impl VariantAttrs {
    /// Get the logged variant name, considering rename and rename_all.
    pub fn variant_name(&self, rename_rule: Option<RenameRule>) -> String {
        if let Some(ref name) = self.rename {
            return name.clone();
        }

        let name = unraw(&self.ident);
        match rename_rule {
            Some(rule) => rule.apply(&name),
            None => name,
        }
    }
}

fn unraw(ident: &Ident) -> String {
    use syn::ext::IdentExt;
    ident.unraw().to_string()
}

/// Rename rule for field/variant name transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromMeta)]
pub enum RenameRule {
    /// camelCase
    #[darling(rename = "camelCase")]
    CamelCase,

    /// snake_case
    #[darling(rename = "snake_case")]
    SnakeCase,

    /// PascalCase
    #[darling(rename = "PascalCase")]
    PascalCase,

    /// SCREAMING_SNAKE_CASE
    #[darling(rename = "SCREAMING_SNAKE_CASE")]
    ScreamingSnakeCase,

    /// kebab-case
    #[darling(rename = "kebab-case")]
    KebabCase,
}

impl RenameRule {
    /// Apply the rename rule to a string.
    pub fn apply(&self, name: &str) -> String {
        use convert_case::{Case, Casing};

        match self {
            RenameRule::CamelCase => name.to_case(Case::Camel),
            RenameRule::SnakeCase => name.to_case(Case::Snake),
            RenameRule::PascalCase => name.to_case(Case::Pascal),
            RenameRule::ScreamingSnakeCase => name.to_case(Case::UpperSnake),
            RenameRule::KebabCase => name.to_case(Case::Kebab),
        }
    }
}
