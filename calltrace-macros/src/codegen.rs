//! Impl block generation for `Loggable` and `Composite`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericParam, Generics, parse_quote};

use crate::parser::{Body, LoggableModel, MarkerModel, RoleModel};

/// Generates every impl block for the model.
pub fn generate(model: &LoggableModel) -> TokenStream {
    let loggable = loggable_impl(model);
    let composite = match &model.body {
        Body::Composite { .. } => composite_impl(model),
        _ => TokenStream::new(),
    };

    quote! {
        #loggable
        #composite
    }
}

/// Adds a `Loggable` bound to every type parameter.
fn bounded_generics(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::calltrace::Loggable));
        }
    }
    generics
}

fn marker_list(markers: &[MarkerModel]) -> TokenStream {
    let items = markers.iter().map(|marker| match marker {
        MarkerModel::Mask => quote!(::calltrace::Marker::Mask),
        MarkerModel::Tag(tag) => quote!(::calltrace::Marker::Tag(#tag)),
    });
    quote!(&[#(#items),*])
}

fn loggable_impl(model: &LoggableModel) -> TokenStream {
    let ident = &model.ident;
    let generics = bounded_generics(&model.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let shape = match &model.body {
        Body::Composite { .. } => quote! {
            ::calltrace::Shape::Composite(self)
        },
        Body::Wrapped { payload } => quote! {
            ::calltrace::Shape::Wrapped(&self.#payload)
        },
        Body::Transparent => quote! {
            ::calltrace::Loggable::shape(&self.0)
        },
        Body::UnitEnum { variants } => {
            let arms = variants.iter().map(|(variant, name)| {
                quote!(Self::#variant => #name,)
            });
            quote! {
                ::calltrace::Shape::Simple(::calltrace::Scalar::Text(
                    ::std::string::String::from(match *self { #(#arms)* })
                ))
            }
        }
    };

    // Newtypes without declared markers report their inner value's markers.
    let markers = if model.markers.is_empty() && matches!(model.body, Body::Transparent) {
        quote!(::calltrace::Loggable::markers(&self.0))
    } else {
        marker_list(&model.markers)
    };

    let role = match model.role {
        RoleModel::Data => quote!(::calltrace::ValueRole::Data),
        RoleModel::Error => quote!(::calltrace::ValueRole::Error),
        RoleModel::ValidationContext => quote!(::calltrace::ValueRole::ValidationContext),
    };

    quote! {
        #[automatically_derived]
        impl #impl_generics ::calltrace::Loggable for #ident #ty_generics #where_clause {
            fn shape(&self) -> ::calltrace::Shape<'_> {
                #shape
            }

            fn markers(&self) -> &'static [::calltrace::Marker] {
                #markers
            }

            fn role(&self) -> ::calltrace::ValueRole {
                #role
            }
        }
    }
}

fn composite_impl(model: &LoggableModel) -> TokenStream {
    let Body::Composite { fields, parent } = &model.body else {
        return TokenStream::new();
    };

    let ident = &model.ident;
    let generics = bounded_generics(&model.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let type_name = &model.type_name;
    let type_markers = marker_list(&model.markers);

    let descriptors = fields.iter().map(|field| {
        let name = &field.name;
        let markers = marker_list(&field.markers);
        quote!(::calltrace::FieldDescriptor::new(#name, #markers))
    });

    let arms = fields.iter().map(|field| {
        let name = &field.name;
        let member = &field.ident;
        quote! {
            #name => ::core::option::Option::Some(&self.#member as &dyn ::calltrace::Loggable),
        }
    });

    let parent_fn = parent.as_ref().map(|parent| {
        quote! {
            fn parent(&self) -> ::core::option::Option<&dyn ::calltrace::Composite> {
                ::core::option::Option::Some(&self.#parent as &dyn ::calltrace::Composite)
            }
        }
    });

    quote! {
        #[automatically_derived]
        impl #impl_generics ::calltrace::Composite for #ident #ty_generics #where_clause {
            fn descriptor(&self) -> &'static ::calltrace::TypeDescriptor {
                static DESCRIPTOR: ::calltrace::TypeDescriptor = ::calltrace::TypeDescriptor {
                    name: #type_name,
                    markers: #type_markers,
                    fields: &[#(#descriptors),*],
                };
                &DESCRIPTOR
            }

            fn field(&self, name: &str) -> ::core::option::Option<&dyn ::calltrace::Loggable> {
                match name {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #parent_fn
        }
    }
}
