/// Tunables shared by the cart and checkout services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// How many times a read-modify-write is replayed after losing a version race.
    pub max_conflict_retries: u32,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}
