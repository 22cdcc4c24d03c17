pub mod pshtt;
pub mod runner;
pub mod types;

pub use pshtt::{find_record, parse_report, run_pshtt, scan_domain, scans_from_report, PshttOutput, PshttRecord};
pub use runner::scan_sites;
pub use types::{Scan, ScanResult, TriState};
