//! Shared helpers used by every crate in the workspace:
//! logging setup, runtime directory checks and record id/timestamp generation.

pub mod types;
pub mod utils;
pub mod env;
pub mod ids;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok", backend: "file" };
        assert_eq!(h.status, "ok");
        assert_eq!(serde_json::to_value(&h).unwrap()["backend"], "file");
    }
}
