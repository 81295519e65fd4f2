use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Path};

// derive_members
pub fn derive_members(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

///
/// FieldOptions
///

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    readonly: bool,
    rename: Option<String>,
}

fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("members")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("readonly") {
                options.readonly = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let name: LitStr = meta.value()?.parse()?;
                options.rename = Some(name.value());
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `readonly` or `rename = \"...\"`"))
            }
        })?;
    }

    Ok(options)
}

fn struct_methods(attrs: &[Attribute]) -> syn::Result<Option<Path>> {
    let mut methods = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("members")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("methods") {
                methods = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("expected `methods = PATH`"))
            }
        })?;
    }

    Ok(methods)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let type_label = ident.to_string();

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Members cannot be derived for generic structs",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Members can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Members can only be derived for structs with named fields",
        ));
    };

    let mut accessors = Vec::new();
    let mut descriptors = Vec::new();

    for field in &named.named {
        let options = field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let Some(field_ident) = field.ident.as_ref() else {
            return Err(Error::new_spanned(field, "unnamed field in named struct"));
        };
        let member_name = options
            .rename
            .clone()
            .unwrap_or_else(|| field_ident.to_string());

        let (tokens, descriptor) = member_accessors(ident, field_ident, &member_name, &options);
        accessors.push(tokens);
        descriptors.push(descriptor);
    }

    let methods = struct_methods(&input.attrs)?.map(|path| {
        quote! {
            fn methods(&self) -> &'static [::pagebind::member::MethodDescriptor] {
                #path
            }
        }
    });

    Ok(quote! {
        impl ::pagebind::traits::Object for #ident {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn type_name(&self) -> &'static str {
                #type_label
            }

            fn members(&self) -> &'static [::pagebind::member::MemberDescriptor] {
                #(#accessors)*

                const MEMBERS: &[::pagebind::member::MemberDescriptor] = &[#(#descriptors),*];

                MEMBERS
            }

            #methods

            fn clone_object(&self) -> ::pagebind::value::ObjectRef {
                ::pagebind::value::ObjectRef::new(::core::clone::Clone::clone(self))
            }
        }

        impl ::pagebind::traits::FieldValue for #ident {
            fn to_value(&self) -> ::pagebind::value::Value {
                ::pagebind::value::Value::object(::core::clone::Clone::clone(self))
            }

            fn to_slot(&self) -> ::pagebind::value::Slot<'_> {
                ::pagebind::value::Slot::Ref(self)
            }

            fn as_object_mut(&mut self) -> ::core::option::Option<&mut dyn ::pagebind::traits::Object> {
                ::core::option::Option::Some(self)
            }

            fn from_value(
                value: ::pagebind::value::Value,
            ) -> ::core::result::Result<Self, ::pagebind::member::MemberError> {
                match value {
                    ::pagebind::value::Value::Object(object) => object
                        .downcast_ref::<Self>()
                        .cloned()
                        .ok_or(::pagebind::member::MemberError::WrongReceiver {
                            expected: #type_label,
                            found: object.type_name(),
                        }),
                    other => ::core::result::Result::Err(
                        ::pagebind::member::MemberError::TypeMismatch {
                            expected: #type_label,
                            found: other.value_type(),
                        },
                    ),
                }
            }
        }
    })
}

// One getter, optional setter and a mutable child accessor per field, plus
// the descriptor expression that wires them together.
fn member_accessors(
    owner: &Ident,
    field: &Ident,
    member_name: &str,
    options: &FieldOptions,
) -> (TokenStream, TokenStream) {
    let get_fn = format_ident!("__get_{}", field);
    let set_fn = format_ident!("__set_{}", field);
    let child_fn = format_ident!("__child_{}", field);

    let setter = (!options.readonly).then(|| {
        quote! {
            #[allow(non_snake_case)]
            fn #set_fn(
                object: &mut dyn ::pagebind::traits::Object,
                value: ::pagebind::value::Value,
            ) -> ::core::result::Result<(), ::pagebind::member::MemberError> {
                let this = ::pagebind::member::downcast_mut::<#owner>(object)?;
                this.#field = ::pagebind::traits::FieldValue::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    let accessors = quote! {
        #[allow(non_snake_case)]
        fn #get_fn(
            object: &dyn ::pagebind::traits::Object,
        ) -> ::core::result::Result<::pagebind::value::Slot<'_>, ::pagebind::member::MemberError> {
            let this = ::pagebind::member::downcast_ref::<#owner>(object)?;
            ::core::result::Result::Ok(::pagebind::traits::FieldValue::to_slot(&this.#field))
        }

        #[allow(non_snake_case)]
        fn #child_fn(
            object: &mut dyn ::pagebind::traits::Object,
        ) -> ::core::result::Result<
            ::core::option::Option<&mut dyn ::pagebind::traits::Object>,
            ::pagebind::member::MemberError,
        > {
            let this = ::pagebind::member::downcast_mut::<#owner>(object)?;
            ::core::result::Result::Ok(::pagebind::traits::FieldValue::as_object_mut(&mut this.#field))
        }

        #setter
    };

    let with_setter = (!options.readonly).then(|| quote!(.with_setter(#set_fn)));
    let descriptor = quote! {
        ::pagebind::member::MemberDescriptor::read_only(#member_name, #get_fn)
            #with_setter
            .with_child_mut(#child_fn)
    };

    (accessors, descriptor)
}
