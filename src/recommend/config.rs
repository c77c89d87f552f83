/// Utilization thresholds for the pricing heuristic, as fractions of capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationConfig {
    /// Hourly buckets above this count toward the premium-pricing hour
    pub high_threshold: f64,

    /// Hourly buckets below this count toward the discount hour
    pub low_threshold: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.8,
            low_threshold: 0.3,
        }
    }
}
