use crate::messages::HealthRes;

/// Liveness check shared by every API surface.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Returns a healthy status. Performs no dependency checks.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "QuackHub is alive".into(),
        }
    }
}
