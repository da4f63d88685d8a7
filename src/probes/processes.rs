//! Activity probe: one of a configured set of process names is running.
//!
//! Grounded on `Processes` in the original Python daemon. Process names are
//! read from `/proc/<pid>/comm` rather than linking a process-listing crate,
//! keeping this probe dependency-free beyond the standard library.

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::{required_str, split_csv};

pub struct Processes {
    name: String,
    process_names: Vec<String>,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let raw = required_str(name, section, "processes")?;
    let process_names = split_csv(&raw);
    if process_names.is_empty() {
        return Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "processes",
            reason: "at least one process name is required".to_string(),
        });
    }
    Ok(Box::new(Processes {
        name: name.to_string(),
        process_names,
    }))
}

impl ActivityProbe for Processes {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        let entries = std::fs::read_dir("/proc")
            .map_err(|err| ProbeError::Severe(format!("cannot read /proc: {err}")))?;

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let pid = match file_name.to_str().and_then(|s| s.parse::<u32>().ok()) {
                Some(pid) => pid,
                None => continue,
            };

            let comm_path = format!("/proc/{pid}/comm");
            let comm = match std::fs::read_to_string(&comm_path) {
                Ok(comm) => comm.trim().to_string(),
                Err(_) => continue, // process exited between listing and read
            };

            if let Some(matched) = self.process_names.iter().find(|p| **p == comm) {
                return Ok(Some(format!("Process {matched} is running")));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_processes_key() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert!(create("procs", &section).is_err());
    }

    #[test]
    fn finds_current_process_by_comm() {
        // Our own test binary is always running under /proc/self.
        let section: toml::Value = toml::from_str(r#"processes = "__definitely_not_running__""#).unwrap();
        let probe = create("procs", &section).unwrap();
        assert_eq!(probe.check().unwrap(), None);
    }
}
