//! Host environment snapshot
//!
//! Collected once when a `Reporter` is built and cloned into every report.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use sysinfo::System;

/// Probes the host: CPU count, architecture, OS release, environment
/// variables and runtime identity.
pub fn collect() -> Map<String, Value> {
    let processor_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let environment_variables: BTreeMap<String, String> = std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect();

    let runtime_location = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut snapshot = Map::new();
    snapshot.insert("processorCount".into(), json!(processor_count));
    snapshot.insert("architecture".into(), json!(format!("{}bit", usize::BITS)));
    snapshot.insert("cpu".into(), json!(std::env::consts::ARCH));
    snapshot.insert("oSVersion".into(), json!(os_version()));
    snapshot.insert("environmentVariables".into(), json!(environment_variables));
    snapshot.insert("runtimeLocation".into(), json!(runtime_location));
    snapshot.insert("runtimeVersion".into(), json!(runtime_version()));
    snapshot
}

/// Hostname, used as the default machine name.
pub fn hostname() -> Option<String> {
    System::host_name().filter(|h| !h.is_empty())
}

/// `"<os name> <kernel release>"`, e.g. `"Linux 6.8.0"`.
fn os_version() -> String {
    let name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
    match System::kernel_version() {
        Some(release) => format!("{name} {release}"),
        None => name,
    }
}

fn runtime_version() -> String {
    format!(
        "Rust ({}-{}, {})",
        std::env::consts::ARCH,
        std::env::consts::OS,
        std::env::consts::FAMILY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_has_expected_keys() {
        let snapshot = collect();
        for key in [
            "processorCount",
            "architecture",
            "cpu",
            "oSVersion",
            "environmentVariables",
            "runtimeLocation",
            "runtimeVersion",
        ] {
            assert!(snapshot.contains_key(key), "missing {key}");
        }
        assert!(snapshot["processorCount"].as_u64().unwrap() >= 1);
        assert_eq!(snapshot["cpu"], std::env::consts::ARCH);
    }

    #[test]
    fn test_environment_variables_are_captured() {
        let snapshot = collect();
        let vars = snapshot["environmentVariables"].as_object().unwrap();
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(vars["PATH"], path);
        }
    }
}
