// Shared test helpers: sadf fixtures, a scripted converter and scratch log trees
#![allow(dead_code)]

use sarview::config::AppConfig;
use sarview::converter::{ToolOutput, ToolRunner};
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

pub const CPU_STRUCTURED: &str = r#"{"sysstat": {"hosts": [{
    "nodename": "host-a", "file-date": "2025-01-01",
    "statistics": [
        {"timestamp": {"date": "2025-01-01", "time": "00:10:00", "utc": 1, "interval": 600},
         "cpu-load": [
            {"cpu": "-1", "user": 1.0, "nice": 0.0, "system": 2.0, "iowait": 0.5, "steal": 0.0, "idle": 96.5},
            {"cpu": "0", "user": 2.0, "nice": 0.0, "system": 1.0, "iowait": 0.0, "steal": 0.0, "idle": 97.0}
         ]},
        {"timestamp": {"date": "2025-01-01", "time": "00:20:00", "utc": 1, "interval": 600},
         "cpu-load": [
            {"cpu": "-1", "user": 3.0, "nice": 0.0, "system": 1.0, "iowait": 0.0, "steal": 0.0, "idle": 96.0},
            {"cpu": "0", "user": 4.0, "nice": 0.0, "system": 1.0, "iowait": 0.0, "steal": 0.0, "idle": 95.0}
         ]}
    ]}]}}"#;

pub const CPU_FLAT: &str = "# hostname;interval;timestamp;CPU;%user;%nice;%system;%iowait;%steal;%idle\n\
host-a;600;2025-01-01 00:10:00 UTC;-1;1.00;0.00;2.00;0.50;0.00;96.50\n\
host-a;600;2025-01-01 00:10:00 UTC;0;2.00;0.00;1.00;0.00;0.00;97.00\n\
host-a;600;2025-01-01 00:20:00 UTC;-1;3.00;0.00;1.00;0.00;0.00;96.00\n\
host-a;600;2025-01-01 00:20:00 UTC;0;4.00;0.00;1.00;0.00;0.00;95.00\n";

pub const MEMORY_STRUCTURED: &str = r#"{"sysstat": {"hosts": [{"statistics": [
    {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
     "memory": {"memfree": 1024000, "avail": 2048000, "memused": 512000, "memused-percent": 33.33,
                "buffers": 1000, "cached": 200000, "commit": 300000, "commit-percent": 12.5,
                "active": 400000, "inactive": 100000, "dirty": 64}}
]}]}}"#;

pub const MEMORY_FLAT: &str = "# hostname;interval;timestamp;kbmemfree;kbavail;kbmemused;%memused;kbbuffers;kbcached;kbcommit;%commit;kbactive;kbinact;kbdirty\n\
host-a;600;2025-01-01 00:10:00 UTC;1024000;2048000;512000;33.33;1000;200000;300000;12.50;400000;100000;64\n";

pub const DISK_STRUCTURED: &str = r#"{"sysstat": {"hosts": [{"statistics": [
    {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
     "disk": [{"disk-device": "sda", "tps": 1.0, "rkB": 4.0, "wkB": 8.0, "dkB": 0.0,
               "areq-sz": 12.0, "aqu-sz": 0.01, "await": 0.5, "util-percent": 10.0}]}
]}]}}"#;

pub const DISK_FLAT: &str = "# hostname;interval;timestamp;DEV;tps;rkB/s;wkB/s;dkB/s;areq-sz;aqu-sz;await;%util\n\
host-a;600;2025-01-01 00:10:00 UTC;sda;1.00;4.00;8.00;0.00;12.00;0.01;0.50;10.00\n";

pub const NETWORK_STRUCTURED: &str = r#"{"sysstat": {"hosts": [{"statistics": [
    {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
     "network": {"net-dev": [{"iface": "eth0", "rxpck": 12.5, "txpck": 8.0, "rxkB": 3.25, "txkB": 1.5,
                              "rxcmp": 0.0, "txcmp": 0.0, "rxmcst": 0.2, "ifutil-percent": 0.03}]}}
]}]}}"#;

pub const NETWORK_FLAT: &str = "# hostname;interval;timestamp;IFACE;rxpck/s;txpck/s;rxkB/s;txkB/s;rxcmp/s;txcmp/s;rxmcst/s;%ifutil\n\
host-a;600;2025-01-01 00:10:00 UTC;eth0;12.50;8.00;3.25;1.50;0.00;0.00;0.20;0.03\n";

pub const FILESYSTEM_STRUCTURED: &str = r#"{"sysstat": {"hosts": [{"statistics": [
    {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
     "filesystems": [{"filesystem": "/dev/sda1", "MBfsfree": 1200.5, "MBfsused": 800.0,
                      "fsused-percent": 40.0, "ufsused-percent": 45.0, "Ifree": 9000, "Iused": 1000,
                      "Iused-percent": 10.0}]}
]}]}}"#;

pub const FILESYSTEM_FLAT: &str = "# hostname;interval;timestamp;FILESYSTEM;MBfsfree;MBfsused;%fsused;%ufsused;Ifree;Iused;%Iused\n\
host-a;600;2025-01-01 00:10:00 UTC;/dev/sda1;1200.50;800.00;40.00;45.00;9000;1000;10.00\n";

pub const CPU_BUNDLE: &str = "timestamp,cpu,user,system,iowait,idle\n\
2025-01-02 00:10:00,all,5.0,1.0,0.0,94.0\n\
2025-01-02 00:10:00,0,6.0,1.0,0.0,93.0\n";

pub const MEMORY_BUNDLE: &str = "timestamp,memfree,memused,memused_pct\n\
2025-01-02 00:10:00,1000,3000,75.0\n";

/// One recorded invocation of the scripted runner.
#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Call {
    pub fn flag(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

type Script = Box<dyn Fn(&[String]) -> Result<ToolOutput, String> + Send + Sync>;

/// `ToolRunner` that answers from a script instead of spawning sadf.
pub struct FakeRunner {
    script: Script,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&[String]) -> Result<ToolOutput, String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Structured and flat runs answer with fixed results.
    pub fn fixed(structured: Result<ToolOutput, String>, flat: Result<ToolOutput, String>) -> Self {
        Self::new(move |args| match args.first().map(String::as_str) {
            Some("-j") => structured.clone(),
            _ => flat.clone(),
        })
    }

    /// Answers like a sysstat 12 sadf with the fixture of the requested domain.
    pub fn sysstat12() -> Self {
        Self::new(|args| Ok(ok(fixture_for(args, true))))
    }

    /// Answers like a sysstat 11 sadf: structured output fails, flat output works.
    pub fn sysstat11() -> Self {
        Self::new(|args| match args.first().map(String::as_str) {
            Some("-j") => Ok(failed("sadf: invalid option -- 'j'")),
            _ => Ok(ok(fixture_for(args, false))),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, flag: &str) -> usize {
        self.calls().iter().filter(|c| c.flag() == flag).count()
    }
}

impl ToolRunner for FakeRunner {
    fn program(&self) -> &str {
        "sadf"
    }

    fn run(&self, args: &[OsString], env: &[(&str, &str)]) -> Result<ToolOutput, String> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(Call {
            args: args.clone(),
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        (self.script)(&args)
    }
}

pub fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        success: true,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(stderr: &str) -> ToolOutput {
    ToolOutput {
        success: false,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Fixture text for the sar arguments after `--`.
fn fixture_for(args: &[String], structured: bool) -> &'static str {
    let sar: Vec<&str> = args
        .iter()
        .skip_while(|a| a.as_str() != "--")
        .skip(1)
        .map(String::as_str)
        .collect();
    match (sar.first().copied(), structured) {
        (Some("-r"), true) => MEMORY_STRUCTURED,
        (Some("-r"), false) => MEMORY_FLAT,
        (Some("-d"), true) => DISK_STRUCTURED,
        (Some("-d"), false) => DISK_FLAT,
        (Some("-n"), true) => NETWORK_STRUCTURED,
        (Some("-n"), false) => NETWORK_FLAT,
        (Some("-F"), true) => FILESYSTEM_STRUCTURED,
        (Some("-F"), false) => FILESYSTEM_FLAT,
        (_, true) => CPU_STRUCTURED,
        (_, false) => CPU_FLAT,
    }
}

pub fn test_config(root: &Path) -> AppConfig {
    let text = format!(
        r#"
[server]
port = 8081
host = "127.0.0.1"

[logs]
root = "{}"
"#,
        root.display().to_string().replace('\\', "/")
    );
    AppConfig::load_from_str(&text).unwrap()
}

/// Logs tree used by service and HTTP tests:
///
/// ```text
/// host-a/sa20250101
/// host-a/csv/2025-01-02/{cpu,memory}.csv
/// host-b/sa20250103
/// .hidden/
/// ```
pub fn write_logs_tree(root: &Path) {
    let a = root.join("host-a");
    fs::create_dir_all(a.join("csv").join("2025-01-02")).unwrap();
    fs::write(a.join("sa20250101"), b"binary").unwrap();
    fs::write(a.join("csv/2025-01-02/cpu.csv"), CPU_BUNDLE).unwrap();
    fs::write(a.join("csv/2025-01-02/memory.csv"), MEMORY_BUNDLE).unwrap();

    let b = root.join("host-b");
    fs::create_dir_all(&b).unwrap();
    fs::write(b.join("sa20250103"), b"binary").unwrap();

    fs::create_dir_all(root.join(".hidden")).unwrap();
}
