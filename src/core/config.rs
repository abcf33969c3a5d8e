// This module implements the target configuration contract: a queryable
// capability set describing the profile version, declared capabilities,
// supported extensions and available extended-instruction-set imports of the
// emission target. The legalization and emission core performs no version
// gating of its own; it delegates every "is this form legal to emit" question
// to this struct. The default configuration models an OpenCL-flavoured
// compute profile with 64-bit integers available, which is what the demo
// binary and most tests use.

//! Target capability configuration.

use crate::spv::{Capability, ExtInstSet};
use hashbrown::HashSet;

/// Queryable capability set for the emission target.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    version: (u32, u32),
    capabilities: HashSet<Capability>,
    extensions: HashSet<String>,
    ext_inst_sets: Vec<ExtInstSet>,
}

impl TargetConfig {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            version: (major, minor),
            capabilities: HashSet::new(),
            extensions: HashSet::new(),
            ext_inst_sets: Vec::new(),
        }
    }

    /// An OpenCL-style compute profile: kernel model, physical addressing,
    /// 64-bit integers, linkage.
    pub fn opencl_compute() -> Self {
        let mut cfg = Self::new(1, 2);
        for cap in [
            Capability::Addresses,
            Capability::Kernel,
            Capability::Linkage,
            Capability::Int64,
            Capability::Float64,
        ] {
            cfg.declare_capability(cap);
        }
        cfg.add_ext_inst_set(ExtInstSet::OpenclStd);
        cfg
    }

    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        self.version >= (major, minor)
    }

    pub fn declare_capability(&mut self, cap: Capability) {
        self.capabilities.insert(cap);
    }

    pub fn declares_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }

    pub fn add_extension(&mut self, name: &str) {
        self.extensions.insert(name.to_string());
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn add_ext_inst_set(&mut self, set: ExtInstSet) {
        if !self.ext_inst_sets.contains(&set) {
            self.ext_inst_sets.push(set);
        }
    }

    pub fn available_ext_inst_set(&self, set: ExtInstSet) -> bool {
        self.ext_inst_sets.contains(&set)
    }

    pub fn ext_inst_sets(&self) -> &[ExtInstSet] {
        &self.ext_inst_sets
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::opencl_compute()
    }
}
