use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Type, parse_macro_input};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    generate_injectable_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn generate_injectable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "#[derive(Injectable)] only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(Injectable)] can only be applied to structs",
            ));
        }
    };

    let mut field_injections = Vec::new();
    for field in fields.iter().filter(|f| is_marked(f)) {
        if !is_inject_slot(&field.ty) {
            return Err(syn::Error::new(
                field.ty.span(),
                "#[inject] fields must have type `Inject<T>`",
            ));
        }
        let field_name = &field.ident;
        field_injections.push(quote! {
            resolver.inject(&self.#field_name);
        });
    }

    Ok(quote! {
        impl #impl_generics ::modhandler::Injectable for #struct_name #ty_generics #where_clause {
            fn inject_dependencies(&self, resolver: &mut ::modhandler::Resolver<'_>) {
                #(#field_injections)*
            }
        }
    })
}

fn is_marked(field: &Field) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident("inject"))
}

/// `Inject<T>` under any path prefix, e.g. `modhandler::Inject<T>`
fn is_inject_slot(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Inject"
                && matches!(segment.arguments, syn::PathArguments::AngleBracketed(_));
        }
    }
    false
}
