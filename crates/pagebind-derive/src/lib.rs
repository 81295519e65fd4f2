use proc_macro::TokenStream;

mod members;

/// Generate `Object` and `FieldValue` for a named-field struct.
///
/// Field attributes: `#[members(skip)]`, `#[members(readonly)]`,
/// `#[members(rename = "name")]`. Struct attribute:
/// `#[members(methods = PATH)]` where `PATH` names a
/// `&'static [MethodDescriptor]`.
#[proc_macro_derive(Members, attributes(members))]
pub fn derive_members(input: TokenStream) -> TokenStream {
    members::derive_members(input.into()).into()
}
