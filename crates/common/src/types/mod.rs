use serde::Serialize;

/// Body of the `/health` probe.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub backend: &'static str,
}
