//! Candidate endpoint generation
//!
//! Candidates come in three tiers, cheapest first: a short device-specific
//! list (emulator and loopback aliases), a curated set of common private
//! addresses, and finally whole subnet ranges enumerated host by host.
//! Priority is the list position; the probe engine honors it over response
//! speed.

use crate::device::DeviceClass;
use crate::endpoint::Endpoint;

/// Default port the backend serves on
pub const DEFAULT_PORT: u16 = 8000;

/// First host probed in a subnet scan (.0 is the network, .1 the router)
pub const SCAN_START_HOST: u8 = 2;
/// Last host probed in a subnet scan (.255 is broadcast)
pub const SCAN_END_HOST: u8 = 254;
/// How many hosts of a range are probed concurrently
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// A contiguous host range within one /24 prefix. The range carries its own
/// port so scan candidates can never disagree with the device and common
/// lists that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    pub prefix: String,
    pub port: u16,
    pub start_host: u8,
    pub end_host: u8,
}

impl ScanRange {
    pub fn new(prefix: impl Into<String>, port: u16) -> Self {
        Self {
            prefix: prefix.into(),
            port,
            start_host: SCAN_START_HOST,
            end_host: SCAN_END_HOST,
        }
    }

    /// Enumerate the range as endpoint batches of at most `batch_size`,
    /// ascending host order
    pub fn batches(&self, batch_size: usize) -> Vec<Vec<Endpoint>> {
        let hosts: Vec<Endpoint> = (self.start_host..=self.end_host)
            .map(|host| Endpoint::http(format!("{}.{}", self.prefix, host), self.port))
            .collect();

        hosts
            .chunks(batch_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    pub fn host_count(&self) -> usize {
        (self.end_host as usize).saturating_sub(self.start_host as usize) + 1
    }
}

/// Source of candidate lists, a seam so tests can count invocations
pub trait CandidateSource: Send + Sync {
    /// Short device-class-dependent list, most likely addresses first
    fn device_specific(&self, class: DeviceClass) -> Vec<Endpoint>;

    /// Curated private-network addresses tried before any brute-force scan
    fn common_addresses(&self) -> Vec<Endpoint>;

    /// Subnet prefixes to enumerate, most likely first
    fn subnet_ranges(&self) -> Vec<ScanRange>;
}

/// The built-in candidate lists
pub struct DefaultCandidates {
    port: u16,
    /// Developer-machine hint, probed before everything else in the
    /// device-specific stage. Supplied via APISCOUT_DEV_HOST or the CLI
    /// rather than baked into the lists.
    dev_hint: Option<Endpoint>,
}

impl DefaultCandidates {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            dev_hint: None,
        }
    }

    pub fn with_dev_hint(mut self, hint: Option<Endpoint>) -> Self {
        self.dev_hint = hint;
        self
    }
}

impl Default for DefaultCandidates {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

impl CandidateSource for DefaultCandidates {
    fn device_specific(&self, class: DeviceClass) -> Vec<Endpoint> {
        let mut list = Vec::new();

        if let Some(hint) = &self.dev_hint {
            list.push(hint.clone());
        }

        match class {
            // The Android emulator aliases its host as 10.0.2.2; plain
            // loopback still matters for a device with adb reverse set up.
            DeviceClass::Android => {
                list.push(Endpoint::http("10.0.2.2", self.port));
                list.push(Endpoint::http("localhost", self.port));
                list.push(Endpoint::http("127.0.0.1", self.port));
            }
            DeviceClass::Web | DeviceClass::Ios | DeviceClass::Desktop => {
                list.push(Endpoint::http("localhost", self.port));
                list.push(Endpoint::http("127.0.0.1", self.port));
            }
        }

        list
    }

    fn common_addresses(&self) -> Vec<Endpoint> {
        // Frequently-seen router and early-DHCP addresses across home and
        // office private ranges.
        [
            "192.168.1.100",
            "192.168.1.101",
            "192.168.1.2",
            "192.168.0.100",
            "192.168.0.101",
            "192.168.0.2",
            "10.0.0.100",
            "10.0.0.2",
            "10.0.0.5",
            "172.16.0.100",
            "172.16.0.2",
        ]
        .iter()
        .map(|host| Endpoint::http(*host, self.port))
        .collect()
    }

    fn subnet_ranges(&self) -> Vec<ScanRange> {
        ["192.168.1", "192.168.0", "10.0.0", "172.16.0"]
            .iter()
            .map(|prefix| ScanRange::new(*prefix, self.port))
            .collect()
    }
}
