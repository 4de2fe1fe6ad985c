use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parse;
use syn::{parse_macro_input, Attribute, DeriveInput, LitStr};

struct IndexSpec {
    fields: Vec<String>,
    unique: bool,
    descending: bool,
    name: Option<String>,
}

impl IndexSpec {
    /// 未显式命名时沿用 MongoDB 的默认命名规则（field_1_other_1）
    fn index_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let direction = if self.descending { -1 } else { 1 };
        self.fields.iter().map(|f| format!("{}_{}", f, direction)).collect::<Vec<_>>().join("_")
    }
}

pub fn expand_index_model_provider(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let mut models = vec![];
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("mongo_index")) {
        match parse_index(attr) {
            Ok(spec) => models.push(index_model(&spec)),
            Err(e) => return e.to_compile_error().into(),
        }
    }

    let expanded = quote! {
        impl ::common::index_trait::MongoIndexModelProvider for #name {
            fn index_models() -> Vec<::mongodb::IndexModel> {
                vec![
                    #(#models),*
                ]
            }
        }
    };
    expanded.into()
}

fn parse_index(attr: &Attribute) -> syn::Result<IndexSpec> {
    let mut spec = IndexSpec { fields: vec![], unique: false, descending: false, name: None };
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("fields") {
            let content;
            syn::bracketed!(content in meta.input);
            let list = content.parse_terminated(<LitStr as Parse>::parse, syn::Token![,])?;
            spec.fields.extend(list.into_iter().map(|lit| lit.value()));
        } else if meta.path.is_ident("unique") {
            spec.unique = true;
        } else if meta.path.is_ident("order") {
            let content;
            syn::parenthesized!(content in meta.input);
            let lit: LitStr = content.parse()?;
            spec.descending = lit.value().eq_ignore_ascii_case("desc");
        } else if meta.path.is_ident("name") {
            let content;
            syn::parenthesized!(content in meta.input);
            let lit: LitStr = content.parse()?;
            spec.name = Some(lit.value());
        } else {
            return Err(meta.error("unsupported #[mongo_index(...)] option"));
        }
        Ok(())
    })?;
    if spec.fields.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[mongo_index] requires fields[...]"));
    }
    Ok(spec)
}

fn index_model(spec: &IndexSpec) -> TokenStream2 {
    let direction: i32 = if spec.descending { -1 } else { 1 };
    let fields = &spec.fields;
    let unique = spec.unique;
    let name = spec.index_name();
    quote! {
        ::mongodb::IndexModel::builder()
            .keys({
                let mut keys = ::mongodb::bson::Document::new();
                #( keys.insert(#fields, #direction); )*
                keys
            })
            .options(Some(
                ::mongodb::options::IndexOptions::builder()
                    .unique(#unique)
                    .name(#name.to_string())
                    .build(),
            ))
            .build()
    }
}
