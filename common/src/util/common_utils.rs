/// 去掉首尾空白并丢弃空串，保持原有顺序去重
pub fn normalize_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() || out.iter().any(|t| t == token) {
            continue;
        }
        out.push(token.to_string());
    }
    out
}
