use serde::Serialize;

/// `/health` 响应体
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}
