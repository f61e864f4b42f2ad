//! Registry document sources.

mod yaml_source;

pub use yaml_source::YamlRegistrySource;
