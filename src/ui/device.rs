// src/ui/device.rs
use pcap::Device;

/// Capture-capable interface names as reported by the local pcap stack.
pub fn available_interfaces() -> Result<Vec<String>, String> {
    Device::list()
        .map(|devices| devices.into_iter().map(|d| d.name).collect())
        .map_err(|e| format!("Failed to list devices: {}", e))
}

/// Warn when the requested interface is not in the local device list.
/// The capture tool may still accept it, so this never fails the start.
pub fn warn_if_unknown_interface(name: &str) {
    match available_interfaces() {
        Ok(devices) => {
            if !devices.iter().any(|d| d == name) {
                eprintln!(
                    "Warning: interface '{}' not found locally (known: {})",
                    name,
                    devices.join(", ")
                );
            }
        }
        Err(e) => {
            eprintln!("Warning: could not verify interface '{}': {}", name, e);
        }
    }
}
