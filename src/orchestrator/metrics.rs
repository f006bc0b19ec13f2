use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub successes: u64,
    pub failures: u64,
    /// Calls refused by an open circuit breaker
    pub short_circuits: u64,
}

impl ProviderStats {
    pub fn success_rate(&self) -> f32 {
        let total = self.successes + self.failures;
        if total == 0 {
            0.0
        } else {
            self.successes as f32 / total as f32
        }
    }
}

/// Call outcomes keyed by provider (STT provider id or scoring backend name)
#[derive(Debug, Default, Clone, Serialize)]
pub struct Metrics {
    providers: BTreeMap<String, ProviderStats>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, provider_id: &str) -> &mut ProviderStats {
        self.providers.entry(provider_id.to_string()).or_default()
    }

    pub fn record_success(&mut self, provider_id: &str) {
        self.entry(provider_id).successes += 1;
    }

    pub fn record_failure(&mut self, provider_id: &str) {
        self.entry(provider_id).failures += 1;
    }

    pub fn record_short_circuit(&mut self, provider_id: &str) {
        self.entry(provider_id).short_circuits += 1;
    }

    pub fn stats(&self, provider_id: &str) -> ProviderStats {
        self.providers.get(provider_id).copied().unwrap_or_default()
    }

    pub fn get_success_count(&self, provider_id: &str) -> u64 {
        self.stats(provider_id).successes
    }

    pub fn get_failure_count(&self, provider_id: &str) -> u64 {
        self.stats(provider_id).failures
    }

    pub fn get_short_circuit_count(&self, provider_id: &str) -> u64 {
        self.stats(provider_id).short_circuits
    }

    pub fn get_success_rate(&self, provider_id: &str) -> f32 {
        self.stats(provider_id).success_rate()
    }

    /// Providers in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderStats)> {
        self.providers.iter().map(|(id, stats)| (id.as_str(), stats))
    }
}
