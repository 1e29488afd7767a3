use darling::Error;
use darling::ast::NestedMeta;
use quote::quote;
use syn::{Data, DeriveInput, Expr, Fields, ItemStruct, Lit, Meta, Type, parse_macro_input};

use proc_macro::TokenStream;

fn newtype_field(fields: &Fields) -> Option<Type> {
    match fields {
        Fields::Unnamed(uf) if uf.unnamed.len() == 1 => Some(uf.unnamed[0].ty.clone()),
        _ => None,
    }
}

#[proc_macro_derive(RawValue)]
pub fn derive_raw_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let raw = match input.data {
        Data::Struct(ref s) => newtype_field(&s.fields),
        _ => None,
    };
    let Some(raw) = raw else {
        return TokenStream::from(
            syn::Error::new_spanned(&name, "RawValue expects a single-field tuple struct")
                .to_compile_error(),
        );
    };

    let expanded = quote! {
        impl #name {
            /// Wraps a native value as-is.
            #[inline]
            pub const fn from_raw(raw: #raw) -> Self {
                Self(raw)
            }

            /// Returns the native value.
            #[inline]
            pub const fn into_raw(self) -> #raw {
                self.0
            }
        }

        impl crate::structs::values::RawValue for #name {
            type Raw = #raw;

            #[inline]
            fn from_raw(raw: #raw) -> Self {
                Self(raw)
            }

            #[inline]
            fn into_raw(self) -> #raw {
                self.0
            }
        }

        impl From<#raw> for #name {
            #[inline]
            fn from(raw: #raw) -> Self {
                Self(raw)
            }
        }

        impl From<#name> for #raw {
            #[inline]
            fn from(value: #name) -> Self {
                value.0
            }
        }
    };

    TokenStream::from(expanded)
}

/// Declares well-known values of a newtype as associated constants.
///
/// `#[named_values(NONE = -1, YUV420P = 0, MPEG = (1, "tv"))]` adds the
/// constants, a `name()` / `from_name()` pair and a `Display` impl that falls
/// back to the raw number. Names are the lowercased constant identifiers
/// unless given explicitly, or kept as written with the `keep_case` flag.
/// `no_display` leaves the `Display` impl to the caller.
#[proc_macro_attribute]
pub fn named_values(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };

    let input = parse_macro_input!(item as ItemStruct);
    let name = &input.ident;

    if newtype_field(&input.fields).is_none() {
        return TokenStream::from(
            syn::Error::new_spanned(name, "named_values expects a single-field tuple struct")
                .to_compile_error(),
        );
    }

    let has_flag = |flag: &str| {
        args.iter()
            .any(|arg| matches!(arg, NestedMeta::Meta(Meta::Path(p)) if p.is_ident(flag)))
    };
    let keep_case = has_flag("keep_case");
    let no_display = has_flag("no_display");

    let mut idents = Vec::new();
    let mut values = Vec::new();
    let mut labels = Vec::new();

    for arg in &args {
        let nv = match arg {
            NestedMeta::Meta(Meta::NameValue(nv)) => nv,
            NestedMeta::Meta(Meta::Path(p)) if p.is_ident("keep_case") || p.is_ident("no_display") => {
                continue;
            }
            other => {
                return TokenStream::from(
                    syn::Error::new_spanned(other, "expected `NAME = value`").to_compile_error(),
                );
            }
        };

        let Some(ident) = nv.path.get_ident().cloned() else {
            return TokenStream::from(
                syn::Error::new_spanned(&nv.path, "expected a plain identifier").to_compile_error(),
            );
        };

        let (value, label) = match &nv.value {
            Expr::Tuple(t) if t.elems.len() == 2 => match &t.elems[1] {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(s) => (t.elems[0].clone(), s.value()),
                    _ => {
                        return TokenStream::from(
                            syn::Error::new_spanned(lit, "label must be a string literal")
                                .to_compile_error(),
                        );
                    }
                },
                other => {
                    return TokenStream::from(
                        syn::Error::new_spanned(other, "label must be a string literal")
                            .to_compile_error(),
                    );
                }
            },
            expr => {
                let label = if keep_case {
                    ident.to_string()
                } else {
                    ident.to_string().to_lowercase()
                };
                (expr.clone(), label)
            }
        };

        idents.push(ident);
        values.push(value);
        labels.push(label);
    }

    let display = if no_display {
        quote! {}
    } else {
        quote! {
            impl ::std::fmt::Display for #name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    match crate::structs::values::NamedValue::name(self) {
                        Some(name) => f.write_str(name),
                        None => write!(f, "{}", self.0),
                    }
                }
            }
        }
    };

    let expanded = quote! {
        #input

        #[allow(missing_docs)]
        impl #name {
            #( pub const #idents: Self = Self(#values); )*
        }

        impl crate::structs::values::NamedValue for #name {
            fn name(&self) -> Option<&'static str> {
                #( if *self == Self::#idents { return Some(#labels); } )*
                None
            }

            fn from_name(name: &str) -> Option<Self> {
                #( if name == #labels { return Some(Self::#idents); } )*
                None
            }
        }

        #display
    };

    TokenStream::from(expanded)
}
