extern crate proc_macro;

mod mongo_index_macro;
mod mongo_query_macro;

use proc_macro::TokenStream;

/// 根据 `#[mongo_index(...)]` 声明生成 `MongoIndexModelProvider` 实现
///
/// ```ignore
/// #[mongo_index(fields["user_id", "role"], name("idx_user_role"))]
/// #[mongo_index(fields["user_id"], unique)]
/// ```
#[proc_macro_derive(MongoIndexModelProvider, attributes(mongo_index))]
pub fn mongo_index_model_provider(input: TokenStream) -> TokenStream {
    mongo_index_macro::expand_index_model_provider(input)
}

/// 为查询 DTO 生成 `to_query_doc()`，只拼接值为 `Some` 的字段。
/// `like` 生成不区分大小写的字面子串匹配，使用方需依赖 `regex`
#[proc_macro_derive(QueryFilter, attributes(query))]
pub fn derive_query_filter(input: TokenStream) -> TokenStream {
    mongo_query_macro::derive_query_filter(input)
}
