use crate::types::HealthRes;

/// Simple health service shared by the API surfaces.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Patient ledger is alive".into(),
        }
    }
}
