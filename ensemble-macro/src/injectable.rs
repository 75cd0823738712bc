use darling::FromField;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, PathArguments, Type};

/// `#[inject(...)]` options on a single field
#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    group: Option<String>,
    #[darling(default)]
    default: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    generate_injectable_impl(&input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}

fn generate_injectable_impl(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(darling::Error::custom(
                    "#[derive(Injectable)] only supports structs with named fields",
                )
                .with_span(input))
            }
        },
        _ => {
            return Err(darling::Error::custom(
                "#[derive(Injectable)] can only be applied to structs",
            )
            .with_span(input))
        }
    };

    let field_injections = fields
        .iter()
        .map(|field| field_injection(&InjectField::from_field(field)?))
        .collect::<darling::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::ensemble::Injectable for #struct_name #ty_generics #where_clause {
            fn inject(
                resolver: &dyn ::ensemble::Resolver
            ) -> ::ensemble::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#field_injections),*
                })
            }
        }
    })
}

fn field_injection(field: &InjectField) -> darling::Result<TokenStream2> {
    let field_name = &field.ident;
    let error = |message: &str| darling::Error::custom(message).with_span(&field.ty);

    if field.default {
        return Ok(quote!(#field_name: ::core::default::Default::default()));
    }

    if let Some(group) = &field.group {
        let inner = wrapped_type(&field.ty, "Vec")
            .and_then(|item| wrapped_type(item, "Arc"))
            .ok_or_else(|| error("group fields must be `Vec<Arc<T>>`"))?;
        return Ok(quote!(#field_name: resolver.resolve_group::<#inner>(#group)?));
    }

    let inner = wrapped_type(&field.ty, "Arc").ok_or_else(|| {
        error("injected fields must be `Arc<T>`; use #[inject(default)] for anything else")
    })?;

    match (inner, &field.name) {
        (Type::TraitObject(_), Some(_)) => Err(error("named trait objects are not supported")),
        (Type::TraitObject(_), None) => Ok(quote!(#field_name: resolver.resolve_dyn::<#inner>()?)),
        (_, Some(name)) => Ok(quote!(#field_name: resolver.resolve_named::<#inner>(#name)?)),
        (_, None) => Ok(quote!(#field_name: resolver.resolve::<#inner>()?)),
    }
}

/// Extract `T` from `Wrapper<T>` when the last path segment is `wrapper`
fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
