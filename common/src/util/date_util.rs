/// 当前 Unix 时间戳（秒）
pub fn now() -> i64 {
    chrono::Local::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        assert!(now() > 1_577_836_800);
    }
}
