/// Answers whether a process identifier belongs to a running process.
pub trait ProcessTable: Send + Sync {
    fn is_running(&self, pid: u32) -> bool;
}

impl<F> ProcessTable for F
where
    F: Fn(u32) -> bool + Send + Sync,
{
    fn is_running(&self, pid: u32) -> bool {
        self(pid)
    }
}

/// Queries the operating system's process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessTable;

impl ProcessTable for OsProcessTable {
    #[cfg(unix)]
    fn is_running(&self, pid: u32) -> bool {
        // pid 0 and values beyond pid_t address process groups, not a process.
        let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if raw_pid <= 0 {
            return false;
        }
        // Safety: signal 0 performs the permission and existence checks only.
        let rc = unsafe { libc::kill(raw_pid, 0) };
        if rc == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    #[cfg(not(unix))]
    fn is_running(&self, pid: u32) -> bool {
        tracing::warn!("Cannot check pid {} on this platform; treating as stale", pid);
        false
    }
}
