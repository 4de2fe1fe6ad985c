use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

pub fn derive_query_filter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = input.ident;
    let mut field_handlers = vec![];

    let fields = match input.data {
        syn::Data::Struct(data) => data.fields,
        _ => {
            let err = syn::Error::new(struct_name.span(), "QueryFilter only supports structs");
            return err.to_compile_error().into();
        }
    };

    for field in fields {
        let field_ident = match &field.ident {
            Some(ident) => ident.clone(),
            None => continue,
        };

        let mut rename = field_ident.to_string();
        let mut query_ops = Vec::new();

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("query")) {
            let res = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("field") {
                    let val: syn::LitStr = meta.value()?.parse()?;
                    rename = val.value();
                    return Ok(());
                }
                match meta.path.get_ident().map(|i| i.to_string()).as_deref() {
                    Some(op @ ("eq" | "ne" | "gt" | "lt" | "like")) => {
                        query_ops.push(op.to_string());
                        Ok(())
                    }
                    _ => Err(meta.error("unsupported #[query(...)] attribute")),
                }
            });
            if let Err(e) = res {
                return e.to_compile_error().into();
            }
        }

        for op in query_ops {
            let handler = match op.as_str() {
                "eq" => quote! {
                    if let Some(val) = &self.#field_ident {
                        if let Ok(value) = ::mongodb::bson::to_bson(val) {
                            doc.insert(#rename, value);
                        }
                    }
                },
                // 按字面子串匹配，元字符需转义
                "like" => quote! {
                    if let Some(val) = &self.#field_ident {
                        let pattern = ::regex::escape(&val.to_string());
                        doc.insert(#rename, ::mongodb::bson::doc! { "$regex": pattern, "$options": "i" });
                    }
                },
                other => {
                    let mongo_op = format!("${}", other);
                    quote! {
                        if let Some(val) = &self.#field_ident {
                            if let Ok(value) = ::mongodb::bson::to_bson(val) {
                                let entry = doc
                                    .entry(#rename.to_string())
                                    .or_insert_with(|| ::mongodb::bson::Bson::Document(::mongodb::bson::Document::new()));
                                if let ::mongodb::bson::Bson::Document(ops) = entry {
                                    ops.insert(#mongo_op, value);
                                }
                            }
                        }
                    }
                }
            };
            field_handlers.push(handler);
        }
    }

    let expanded = quote! {
        impl #struct_name {
            pub fn to_query_doc(&self) -> ::mongodb::bson::Document {
                let mut doc = ::mongodb::bson::Document::new();
                #(#field_handlers)*
                doc
            }
        }
    };

    expanded.into()
}
