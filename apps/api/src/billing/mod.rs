// Tiers, quotas, test-mode overrides and the billing redirect endpoints.
// Payments themselves are handled by the hosted backend.

pub mod handlers;
pub mod subscription;
pub mod test_mode;
pub mod tier;
