//! # calltrace-macros
//!
//! Procedural macros for the `calltrace` instrumentation crate.
//!
//! This crate provides `#[derive(Loggable)]`, which implements
//! `calltrace::Loggable` (and `calltrace::Composite` for named structs) from
//! the type definition and its `#[loggable(...)]` attributes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use calltrace::Loggable;
//!
//! #[derive(Loggable)]
//! #[loggable(rename_all = "camelCase")]
//! struct CustomerDto {
//!     #[loggable(mask)]
//!     credit_card: String,
//!     amount: f64,
//!     #[loggable(parent)]
//!     base: AuditedDto,
//! }
//!
//! #[derive(Loggable)]
//! #[loggable(mask)]
//! struct Pin(String);
//!
//! #[derive(Loggable)]
//! enum Status { Active, Suspended }
//! ```
//!
//! ## Supported Shapes
//!
//! - Named structs become composites: each field is listed in a static type
//!   descriptor and read back by name.
//! - Single-field tuple structs are transparent: they report the inner
//!   value's shape with the container's markers.
//! - Enums with unit variants only are logged as the variant name.
//!
//! ## Attributes
//!
//! ### Container Attributes
//!
//! - `#[loggable(mask)]` - Redact values of this type when masking is requested
//! - `#[loggable(tag = "name")]` - Attach a non-redaction marker (repeatable)
//! - `#[loggable(error)]` - Never log values of this type as arguments
//! - `#[loggable(validation_context)]` - Same, for validation result holders
//! - `#[loggable(rename = "Name")]` - Rename the type in its descriptor
//! - `#[loggable(rename_all = "camelCase")]` - Rename all fields or variants
//!
//! ### Field Attributes
//!
//! - `#[loggable(mask)]` - Redact this field when masking is requested
//! - `#[loggable(tag = "name")]` - Attach a non-redaction marker (repeatable)
//! - `#[loggable(rename = "name")]` - Rename this field
//! - `#[loggable(skip)]` - Leave this field out
//! - `#[loggable(parent)]` - Embedded ancestor whose fields are inherited
//! - `#[loggable(payload)]` - Make the struct an envelope around this field
//!
//! ### Variant Attributes
//!
//! - `#[loggable(rename = "NAME")]` - Rename this variant

use proc_macro::TokenStream;
use syn::DeriveInput;

mod codegen;
mod parser;

/// Derive macro implementing `calltrace::Loggable`.
///
/// # Example
///
/// ```rust,ignore
/// use calltrace::Loggable;
///
/// #[derive(Loggable)]
/// struct Order {
///     id: u64,
///     #[loggable(mask)]
///     card: String,
/// }
/// ```
#[proc_macro_derive(Loggable, attributes(loggable))]
pub fn derive_loggable(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match derive_loggable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

/// Internal implementation of the derive macro.
fn derive_loggable_impl(input: &DeriveInput) -> Result<proc_macro2::TokenStream, darling::Error> {
    let model = parser::parse(input)?;
    Ok(codegen::generate(&model))
}
