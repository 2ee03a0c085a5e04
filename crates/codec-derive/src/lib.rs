//! Derive macro for rights-scoped records.
//!
//! Procedural macros must be defined in their own crate, which is why this
//! lives here rather than in `codec`. It is re-exported as `codec::Record`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Token, parse_macro_input, parse_quote};

/// Derive `codec::Record`, `codec::Scoped` and `codec::Merge` for a struct
/// with named fields.
///
/// Wire names come from serde so that decoding and encoding agree:
///
/// - `#[serde(rename = "...")]` (or `rename(serialize = "...")`) overrides
///   the wire name; otherwise the identifier in lower_snake_case is used.
/// - `#[serde(skip)]` / `#[serde(skip_serializing)]` suppress the field on
///   output. Merge still copies it.
/// - `#[serde(flatten)]` embeds the field: its own fields are emitted at the
///   parent's level.
///
/// Policy comes from `#[scope(...)]`:
///
/// - `read = "right"`: emitted only for callers holding `right`.
/// - `write = "right"`: merged only for callers holding `right`.
/// - `omit_empty`: left out of the output when empty.
///
/// On the struct itself, `#[scope(atomic)]` makes merges replace the whole
/// value instead of recursing into its fields.
///
/// Encoding and decoding must agree on every wire name, so a field whose
/// identifier is not already lower_snake_case needs an explicit `rename`,
/// and `rename(deserialize = "...")` must match the serialized name.
///
/// Non-atomic records must implement `Default`: a record appearing where
/// the target had none (`None` becoming `Some`, a new sequence element)
/// starts from its default and has the scratch merged in.
#[proc_macro_derive(Record, attributes(scope))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    decode_rename: Option<String>,
    suppressed: bool,
    omit_empty: bool,
    read: Option<String>,
    write: Option<String>,
    embedded: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if attr.path().is_ident("scope") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("read") {
                        out.read = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("write") {
                        out.write = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("omit_empty") {
                        out.omit_empty = true;
                    } else {
                        return Err(meta.error("expected `read`, `write` or `omit_empty`"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if meta.input.peek(Token![=]) {
                            let value = string_value(&meta)?;
                            out.decode_rename = Some(value.clone());
                            out.rename = Some(value);
                        } else {
                            meta.parse_nested_meta(|inner| {
                                let value = string_value(&inner)?;
                                if inner.path.is_ident("serialize") {
                                    out.rename = Some(value);
                                } else if inner.path.is_ident("deserialize") {
                                    out.decode_rename = Some(value);
                                }
                                Ok(())
                            })?;
                        }
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                        out.suppressed = true;
                    } else if meta.path.is_ident("flatten") {
                        out.embedded = true;
                    } else {
                        skip_value(&meta)?;
                    }
                    Ok(())
                })?;
            }
        }
        Ok(out)
    }

    /// Check that serde decodes the field from the name it is emitted under.
    fn check_wire_name(&self, ident: &str) -> Result<(), String> {
        if self.suppressed || self.embedded {
            return Ok(());
        }
        let encoded = match &self.rename {
            Some(name) => name.as_str(),
            None if ident.chars().any(char::is_uppercase) => {
                return Err(format!(
                    "field `{ident}` would be emitted in lower_snake_case but decoded as `{ident}`; \
                     add `#[serde(rename = \"...\")]`"
                ));
            }
            None => ident,
        };
        let decoded = self.decode_rename.as_deref().unwrap_or(ident);
        if encoded != decoded {
            return Err(format!(
                "field `{ident}` is emitted as `{encoded}` but decoded from `{decoded}`"
            ));
        }
        Ok(())
    }

    fn spec(&self, ident: &str) -> TokenStream2 {
        let mut spec = quote!(::codec::FieldSpec::new(#ident));
        if let Some(rename) = &self.rename {
            spec = quote!(#spec.rename(#rename));
        }
        if self.suppressed {
            spec = quote!(#spec.suppressed());
        }
        if self.omit_empty {
            spec = quote!(#spec.omit_empty());
        }
        if let Some(read) = &self.read {
            spec = quote!(#spec.read(#read));
        }
        if let Some(write) = &self.write {
            spec = quote!(#spec.write(#write));
        }
        if self.embedded {
            spec = quote!(#spec.embedded());
        }
        spec
    }
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    Ok(meta.value()?.parse::<LitStr>()?.value())
}

// Consume a serde option we do not interpret.
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream2>()?;
    }
    Ok(())
}

fn parse_container(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut atomic = false;
    for attr in attrs {
        if attr.path().is_ident("scope") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("atomic") {
                    atomic = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `atomic`"))
                }
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") || meta.path.is_ident("rename_all_fields") {
                    return Err(meta.error(
                        "Record wire names follow field-level `rename`; container `rename_all` is not supported",
                    ));
                }
                skip_value(&meta)
            })?;
        }
    }
    Ok(atomic)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs",
            ));
        }
    };

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Record types must be 'static",
        ));
    }

    let atomic = parse_container(&input.attrs)?;
    let name = &input.ident;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::codec::Scoped));
        param.bounds.push(parse_quote!(::codec::Merge));
        param.bounds.push(parse_quote!('static));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut specs = Vec::with_capacity(fields.len());
    let mut views = Vec::with_capacity(fields.len());
    let mut bindings = Vec::with_capacity(fields.len());
    let mut merges = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let unraw = ident.unraw().to_string();
        attrs
            .check_wire_name(&unraw)
            .map_err(|message| syn::Error::new_spanned(ident, message))?;
        specs.push(attrs.spec(&unraw));
        views.push(quote!(&self.#ident as &dyn ::codec::Scoped));

        let scratch = format_ident!("__scratch_{}", index);
        bindings.push(quote!(#ident: #scratch));
        merges.push(quote! {
            ::codec::merge_field(&descriptors[#index], &mut self.#ident, #scratch, capabilities)?;
        });
    }

    let mut merge_generics = generics.clone();
    let merge_body = if atomic {
        quote! {
            *self = scratch;
            Ok(())
        }
    } else {
        merge_generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(Self: ::core::default::Default));
        quote! {
            let descriptors = <Self as ::codec::Record>::descriptors(self);
            let Self { #(#bindings),* } = scratch;
            #(#merges)*
            Ok(())
        }
    };
    let adopt = (!atomic).then(|| {
        quote! {
            fn adopt(
                scratch: Self,
                capabilities: &::codec::Capabilities,
            ) -> ::codec::Result<Self> {
                let mut fresh = <Self as ::core::default::Default>::default();
                ::codec::Merge::merge(&mut fresh, scratch, capabilities)?;
                Ok(fresh)
            }
        }
    });
    let (merge_impl_generics, _, merge_where_clause) = merge_generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::codec::Scoped for #name #ty_generics #where_clause {
            fn shape(&self) -> ::codec::Shape<'_> {
                ::codec::Shape::Record(self)
            }
        }

        impl #impl_generics ::codec::Record for #name #ty_generics #where_clause {
            fn field_specs() -> &'static [::codec::FieldSpec] {
                const SPECS: &[::codec::FieldSpec] = &[#(#specs),*];
                SPECS
            }

            fn descriptors(&self) -> &'static [::codec::FieldDescriptor] {
                ::codec::registry::descriptors::<Self>()
            }

            fn fields(&self) -> ::std::vec::Vec<&dyn ::codec::Scoped> {
                ::std::vec![#(#views),*]
            }
        }

        impl #merge_impl_generics ::codec::Merge for #name #ty_generics #merge_where_clause {
            #[allow(unused_variables)]
            fn merge(
                &mut self,
                scratch: Self,
                capabilities: &::codec::Capabilities,
            ) -> ::codec::Result<()> {
                #merge_body
            }

            #adopt
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(field: syn::Field) -> FieldAttrs {
        FieldAttrs::parse(&field.attrs).unwrap()
    }

    #[test]
    fn snake_case_fields_need_no_rename() {
        let field: syn::Field = parse_quote!(user_id: u64);
        assert!(attrs(field).check_wire_name("user_id").is_ok());
    }

    #[test]
    fn mixed_case_field_requires_rename() {
        let field: syn::Field = parse_quote!(userID: u64);
        assert!(attrs(field).check_wire_name("userID").is_err());

        let field: syn::Field = parse_quote!(#[serde(rename = "userID")] userID: u64);
        assert!(attrs(field).check_wire_name("userID").is_ok());
    }

    #[test]
    fn asymmetric_rename_is_rejected() {
        let field: syn::Field = parse_quote!(#[serde(rename(deserialize = "uid"))] user_id: u64);
        assert!(attrs(field).check_wire_name("user_id").is_err());

        let field: syn::Field =
            parse_quote!(#[serde(rename(serialize = "uid", deserialize = "user"))] user_id: u64);
        assert!(attrs(field).check_wire_name("user_id").is_err());

        let field: syn::Field =
            parse_quote!(#[serde(rename(serialize = "uid", deserialize = "uid"))] user_id: u64);
        assert!(attrs(field).check_wire_name("user_id").is_ok());
    }

    #[test]
    fn suppressed_and_embedded_fields_have_no_wire_name() {
        let field: syn::Field = parse_quote!(#[serde(skip)] cacheKey: u64);
        assert!(attrs(field).check_wire_name("cacheKey").is_ok());

        let field: syn::Field = parse_quote!(#[serde(flatten)] baseFields: Base);
        assert!(attrs(field).check_wire_name("baseFields").is_ok());
    }
}
