//! CLI commands

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result};

pub mod diff;
pub mod schema;

/// Load a JSON or YAML document
///
/// Files ending in `.json` are parsed as JSON; anything else as YAML.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "loaded input document");
    parse_document(path, &contents)
}

fn parse_document<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(contents)?)
    } else {
        serde_yaml::from_str(contents).map_err(|e| Error::yaml(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmconfig_common::model::LiveConfig;
    use vmconfig_common::EngineConfig;

    #[test]
    fn yaml_and_json_parse_to_same_value() {
        let yaml: LiveConfig = parse_document(
            Path::new("live.yaml"),
            "numCpus: 2\nmemoryMb: 2048\nextraConfig:\n  foo: bar\n",
        )
        .unwrap();
        let json: LiveConfig = parse_document(
            Path::new("live.JSON"),
            r#"{"numCpus": 2, "memoryMb": 2048, "extraConfig": {"foo": "bar"}}"#,
        )
        .unwrap();
        assert_eq!(yaml, json);
        assert_eq!(yaml.num_cpus, 2);
    }

    #[test]
    fn engine_config_from_yaml() {
        let config: EngineConfig = parse_document(
            Path::new("config.yaml"),
            "featureGates:\n  vmClassAsConfigDayNDate: true\nminCpuFreqMhz: 2100\n",
        )
        .unwrap();
        assert!(config.feature_gates.vm_class_as_config_day_n_date);
        assert_eq!(config.min_cpu_freq_mhz, 2100);
    }

    #[test]
    fn yaml_error_names_file() {
        let err = parse_document::<LiveConfig>(Path::new("broken.yaml"), "numCpus: [")
            .unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_document::<LiveConfig>(Path::new("/nonexistent/live.yaml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
