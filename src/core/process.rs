// ─── Process helpers ───
// Pid liveness and signal delivery through sysinfo, so lock recovery and
// interrupt forwarding behave the same on every platform.

use sysinfo::{Pid, ProcessesToUpdate, Signal, System};

fn lookup(pid: u32) -> (System, Pid) {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    (system, pid)
}

/// Whether a process with this pid currently exists.
pub fn is_running(pid: u32) -> bool {
    let (system, pid) = lookup(pid);
    system.process(pid).is_some()
}

/// Deliver `signal` to `pid`. Returns false when the process is gone or the
/// platform has no such signal.
pub fn send_signal(pid: u32, signal: Signal) -> bool {
    let (system, pid) = lookup(pid);
    system
        .process(pid)
        .and_then(|process| process.kill_with(signal))
        .unwrap_or(false)
}
