// Copyright (c) 2022 MASSA LABS <info@massa.net>

use serde::Deserialize;

/// Sequence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceConfig {
    /// name of the domain, also the worker thread name
    pub name: String,
    /// queue depth above which each submission logs a warning
    pub warning_threshold: usize,
}

impl SequenceConfig {
    /// Configuration of the sequence `name`
    pub fn new(name: &str, warning_threshold: usize) -> Self {
        SequenceConfig {
            name: name.to_string(),
            warning_threshold,
        }
    }
}
