//! Procedural macros used in the definition and implementation of getters and setters for the
//! [`RequestAttributes`] and [`ProfileSettings`] variant maps defined in certenroll.
//!
//! Each macro accepts the name of a static key (i.e., `RA_SUBJECT_CN` or `PS_PROFILE_ID`) and
//! the type of the value. The `_with_default` forms accept a default value expression as a third
//! parameter. The generated accessors are emitted as an `impl` block on the map type and are
//! named by stripping the three character prefix from the key name and lower casing the rest,
//! i.e., `RA_SUBJECT_CN` yields `get_subject_cn` and `set_subject_cn`.

use proc_macro2::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a gets_and_sets definition, i.e., the name of a value
/// stored in a variant map, the corresponding type and an optional default value. For example:
/// ```text
/// ra_gets_and_sets!(RA_SUBJECT_CN, String);
/// ps_gets_and_sets_with_default!(PS_VERIFY_PKCS10_SIGNATURE, bool, true);
/// ```
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
    default_value: Option<DefaultValue>,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        if stream.is_empty() {
            return Err(stream.error("expected a key name and a value type"));
        }

        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        let default_value = if stream.is_empty() {
            None
        } else {
            let _comma2: Token!(,) = stream.parse()?;
            Some(stream.parse()?)
        };

        Ok(Signature {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u32, etc.
fn is_string_numeric(str: &str) -> bool {
    !str.is_empty() && str.chars().all(|c| c.is_numeric())
}

/// Maps a Rust type name to the name of the variant that carries it, i.e., u32 to U32 and bool
/// to Bool. Other names are used as is.
fn variant_name(type_name: &str) -> String {
    if type_name == "bool" {
        "Bool".to_string()
    } else if is_string_numeric(&type_name[1..]) {
        type_name.to_uppercase()
    } else {
        type_name.to_string()
    }
}

/// Which map the generated accessors are added to.
struct Target {
    prefix: &'static str,
    map: &'static str,
    variants: &'static str,
}

static REQUEST_ATTRIBUTES: Target = Target {
    prefix: "RA_",
    map: "RequestAttributes",
    variants: "RequestAttributeTypes",
};

static PROFILE_SETTINGS: Target = Target {
    prefix: "PS_",
    map: "ProfileSettings",
    variants: "ProfileSettingsTypes",
};

fn gets_and_sets(target: &Target, signature: Signature) -> TokenStream {
    let flag = signature.value_name;
    let return_t = signature.value_type;

    let flag_name = flag.to_string();
    if !flag_name.starts_with(target.prefix) || flag_name.len() <= target.prefix.len() {
        abort!(
            flag,
            "key names used with {} must start with {}",
            target.map,
            target.prefix
        );
    }

    let flag_str = flag_name[target.prefix.len()..].to_lowercase();
    let getter_str = format!("get_{}", flag_str);
    let setter_str = format!("set_{}", flag_str);
    let getter = Ident::new(&getter_str, flag.span());
    let setter = Ident::new(&setter_str, flag.span());
    let variant = Ident::new(&variant_name(&return_t.to_string()), return_t.span());
    let map = Ident::new(target.map, flag.span());
    let variants = Ident::new(target.variants, flag.span());

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`{}`] instance",
        getter_str, flag, target.map
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`{}`] instance",
        setter_str, flag, target.map
    );

    let getter_fn = match signature.default_value {
        Some(default_value) => quote! {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #return_t {
                match self.0.get(#flag) {
                    Some(#variants::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
        },
        None => quote! {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#return_t> {
                match self.0.get(#flag) {
                    Some(#variants::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        },
    };

    quote! {
        impl #map {
            #getter_fn
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#flag.to_string(), #variants::#variant(v));
            }
        }
    }
}

/// Generates `get_`/`set_` methods on `RequestAttributes` for an `RA_` key. The getter returns
/// an `Option`.
#[proc_macro_error]
#[proc_macro]
pub fn ra_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    gets_and_sets(&REQUEST_ATTRIBUTES, signature).into()
}

/// Generates `get_`/`set_` methods on `RequestAttributes` for an `RA_` key. The getter returns
/// the given default when the key is absent or holds a different variant.
#[proc_macro_error]
#[proc_macro]
pub fn ra_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    if signature.default_value.is_none() {
        abort!(signature.value_name, "a default value is required");
    }
    gets_and_sets(&REQUEST_ATTRIBUTES, signature).into()
}

/// Generates `get_`/`set_` methods on `ProfileSettings` for a `PS_` key. The getter returns an
/// `Option`.
#[proc_macro_error]
#[proc_macro]
pub fn ps_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    gets_and_sets(&PROFILE_SETTINGS, signature).into()
}

/// Generates `get_`/`set_` methods on `ProfileSettings` for a `PS_` key. The getter returns the
/// given default when the key is absent or holds a different variant.
#[proc_macro_error]
#[proc_macro]
pub fn ps_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    if signature.default_value.is_none() {
        abort!(signature.value_name, "a default value is required");
    }
    gets_and_sets(&PROFILE_SETTINGS, signature).into()
}
