//! Record derive macro implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Fields, FieldsNamed, WherePredicate, parse_quote, parse2};

use crate::rename::RenameRule;

/// Container options parsed from `#[record(...)]` attributes.
#[derive(Debug, Clone, Default)]
struct ContainerOptions {
    rename_all: Option<RenameRule>,
    emit_nulls: bool,
}

/// Field or variant options parsed from `#[record(...)]` attributes.
#[derive(Debug, Clone, Default)]
struct MemberOptions {
    rename: Option<String>,
    skip: bool,
    display: bool,
}

/// Expand the `#[derive(Record)]` macro.
pub fn expand_record_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let options = parse_container_options(&input.attrs)?;

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_struct(&input, fields, &options),
            _ => Err(syn::Error::new_spanned(
                &input,
                "Record derive only supports structs with named fields",
            )),
        },
        Data::Enum(data) => expand_enum(&input, data, &options),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "Record derive does not support unions",
        )),
    }
}

fn expand_struct(
    input: &DeriveInput,
    fields: &FieldsNamed,
    options: &ContainerOptions,
) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let mut generics = input.generics.clone();
    let generic = generics.type_params().next().is_some();

    let mut entries = Vec::new();
    let mut bounds: Vec<WherePredicate> = Vec::new();
    for field in &fields.named {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_options = parse_member_options(&field.attrs, false)?;
        if field_options.skip {
            continue;
        }

        // explicit rename > rename_all > field name
        let ident = field_name.to_string();
        let raw = ident.strip_prefix("r#").unwrap_or(&ident);
        let key = match (&field_options.rename, options.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply(raw),
            (None, None) => raw.to_string(),
        };

        let ty = &field.ty;
        if generic {
            bounds.push(if field_options.display {
                parse_quote! { #ty: ::std::fmt::Display }
            } else {
                parse_quote! { #ty: ::parcel::ToWire }
            });
        }

        let value = if field_options.display {
            quote! {
                ::parcel::WireValue::String(::std::string::ToString::to_string(&self.#field_name))
            }
        } else {
            quote! {
                ::parcel::ToWire::to_wire(&self.#field_name)
                    .map_err(|err| ::parcel::EncodeError::field(#key, err.to_string()))?
            }
        };

        entries.push(quote! {
            (::std::string::String::from(#key), #value)
        });
    }

    if !bounds.is_empty() {
        generics.make_where_clause().predicates.extend(bounds);
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let policy = if options.emit_nulls {
        quote! { ::parcel::NullPolicy::Emit }
    } else {
        quote! { ::parcel::NullPolicy::Omit }
    };

    Ok(quote! {
        impl #impl_generics ::parcel::Record for #name #ty_generics #where_clause {
            const NULL_POLICY: ::parcel::NullPolicy = #policy;

            fn fields(
                &self,
            ) -> ::std::result::Result<
                ::std::vec::Vec<(::std::string::String, ::parcel::WireValue)>,
                ::parcel::EncodeError,
            > {
                ::std::result::Result::Ok(::std::vec![#(#entries),*])
            }
        }

        impl #impl_generics ::parcel::ToWire for #name #ty_generics #where_clause {
            fn to_wire(
                &self,
            ) -> ::std::result::Result<::parcel::WireValue, ::parcel::EncodeError> {
                ::parcel::Record::try_wire_map(self).map(::parcel::WireValue::Map)
            }
        }
    })
}

fn expand_enum(
    input: &DeriveInput,
    data: &DataEnum,
    options: &ContainerOptions,
) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if options.emit_nulls {
        return Err(syn::Error::new_spanned(
            input,
            "`emit_nulls` only applies to structs",
        ));
    }

    let with_discriminant = data
        .variants
        .iter()
        .filter(|variant| variant.discriminant.is_some())
        .count();
    let as_integer = with_discriminant > 0;
    if as_integer && with_discriminant != data.variants.len() {
        return Err(syn::Error::new_spanned(
            input,
            "Record derive needs explicit discriminants on all variants or on none",
        ));
    }

    let mut arms = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Record derive only supports enums with unit variants",
            ));
        }

        let variant_name = &variant.ident;
        let variant_options = parse_member_options(&variant.attrs, true)?;

        let value = match &variant.discriminant {
            Some((_, expr)) if variant_options.rename.is_none() => {
                quote! { ::parcel::WireValue::from((#expr) as i64) }
            }
            _ => {
                let ident = variant_name.to_string();
                let label = match (&variant_options.rename, options.rename_all) {
                    (Some(rename), _) => rename.clone(),
                    (None, Some(rule)) => rule.apply(&ident),
                    (None, None) => ident,
                };
                quote! { ::parcel::WireValue::from(#label) }
            }
        };

        arms.push(quote! { Self::#variant_name => #value });
    }

    Ok(quote! {
        impl #impl_generics ::parcel::ToWire for #name #ty_generics #where_clause {
            fn to_wire(
                &self,
            ) -> ::std::result::Result<::parcel::WireValue, ::parcel::EncodeError> {
                ::std::result::Result::Ok(match self {
                    #(#arms,)*
                })
            }
        }
    })
}

/// Parse container options from `#[record(...)]` attributes.
fn parse_container_options(attrs: &[syn::Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: syn::LitStr = meta.value()?.parse()?;
                let rule = RenameRule::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        format!(
                            "unknown rename_all value: \"{}\". Expected one of: {}",
                            value.value(),
                            RenameRule::expected()
                        ),
                    )
                })?;
                options.rename_all = Some(rule);
                Ok(())
            } else if meta.path.is_ident("emit_nulls") {
                options.emit_nulls = true;
                Ok(())
            } else {
                Err(meta.error("unknown record option, expected `rename_all` or `emit_nulls`"))
            }
        })?;
    }

    Ok(options)
}

/// Parse field or variant options from `#[record(...)]` attributes.
fn parse_member_options(attrs: &[syn::Attribute], variant: bool) -> syn::Result<MemberOptions> {
    let mut options = MemberOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") && !variant {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("display") && !variant {
                options.display = true;
                Ok(())
            } else if variant {
                Err(meta.error("unknown variant option, expected `rename`"))
            } else {
                Err(meta.error("unknown field option, expected `rename`, `skip` or `display`"))
            }
        })?;
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    fn expand(input: TokenStream) -> String {
        expand_record_derive(input).expect("expands").to_string()
    }

    fn expand_err(input: TokenStream) -> String {
        expand_record_derive(input)
            .expect_err("rejected")
            .to_string()
    }

    #[test]
    fn struct_uses_field_names() {
        let out = expand(quote! {
            struct Params {
                param1: String,
                page: Option<u32>,
            }
        });
        assert!(out.contains("\"param1\""));
        assert!(out.contains("\"page\""));
        assert!(out.contains("NullPolicy :: Omit"));
        assert!(out.contains(":: parcel :: ToWire for Params"));
    }

    #[test]
    fn rename_beats_rename_all() {
        let out = expand(quote! {
            #[record(rename_all = "camelCase")]
            struct Params {
                #[record(rename = "param1_renamed")]
                param1: String,
                page_size: u32,
            }
        });
        assert!(out.contains("\"param1_renamed\""));
        assert!(out.contains("\"pageSize\""));
        assert!(!out.contains("\"param1\""));
    }

    #[test]
    fn skip_and_emit_nulls() {
        let out = expand(quote! {
            #[record(emit_nulls)]
            struct Params {
                #[record(skip)]
                secret: String,
                note: Option<String>,
            }
        });
        assert!(!out.contains("\"secret\""));
        assert!(out.contains("NullPolicy :: Emit"));
    }

    #[test]
    fn enum_variants_as_strings() {
        let out = expand(quote! {
            #[record(rename_all = "snake_case")]
            enum Status {
                InProgress,
                #[record(rename = "finished")]
                Done,
            }
        });
        assert!(out.contains("\"in_progress\""));
        assert!(out.contains("\"finished\""));
    }

    #[test]
    fn enum_discriminants_as_integers() {
        let out = expand(quote! {
            enum Priority {
                Low = 1,
                High = 10,
            }
        });
        assert!(out.contains("(1) as i64"));
        assert!(out.contains("(10) as i64"));
    }

    #[test]
    fn generic_fields_are_bounded() {
        let out = expand(quote! {
            struct Page<T> where T: Clone {
                items: Vec<T>,
                #[record(display)]
                cursor: T,
                #[record(skip)]
                cache: Option<T>,
            }
        });
        assert!(out.contains("impl < T > :: parcel :: Record for Page < T >"));
        assert!(out.contains("T : Clone , Vec < T > : :: parcel :: ToWire"));
        assert!(out.contains("T : :: std :: fmt :: Display"));
        assert!(!out.contains("Option < T > : :: parcel :: ToWire"));
    }

    #[test]
    fn concrete_structs_get_no_extra_bounds() {
        let out = expand(quote! {
            struct Params { page: u32 }
        });
        assert!(!out.contains("where"));
    }

    #[test]
    fn rejects_tuple_structs() {
        let err = expand_err(quote! { struct Pair(u32, u32); });
        assert!(err.contains("named fields"));
    }

    #[test]
    fn rejects_mixed_discriminants() {
        let err = expand_err(quote! {
            enum Mixed { A = 1, B }
        });
        assert!(err.contains("all variants or on none"));
    }

    #[test]
    fn rejects_unknown_rule() {
        let err = expand_err(quote! {
            #[record(rename_all = "Title Case")]
            struct Params { a: u8 }
        });
        assert!(err.contains("unknown rename_all value"));
    }

    #[test]
    fn rejects_data_variants() {
        let err = expand_err(quote! {
            enum Shape { Circle(f64) }
        });
        assert!(err.contains("unit variants"));
    }
}
