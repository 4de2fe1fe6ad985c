use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

pub fn result() -> Value {
    serde_json::json!({"success":true})
}

pub fn result_data<T: Serialize + Debug>(data: T) -> Value {
    serde_json::json!({"success":true,"data":data})
}

pub fn result_list<T: Serialize + Debug>(list: Vec<T>) -> Value {
    let total = list.len();
    serde_json::json!({"success":true,"data":list,"total":total})
}

pub fn result_error_msg(msg: &str) -> Value {
    serde_json::json!({"success":false,"msg":msg})
}
