use std::collections::HashMap;

/// Provider name -> reachable, computed fresh by each health check.
pub type HealthStatus = HashMap<String, bool>;
