use super::*;
use tempfile::tempdir;

fn never_running() -> Box<dyn ProcessTable> {
    Box::new(|_pid: u32| false)
}

fn always_running() -> Box<dyn ProcessTable> {
    Box::new(|_pid: u32| true)
}

#[test]
fn acquire_without_lock_file_writes_own_pid() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    let manager = LockManager::with_pid(path.clone(), 4242, always_running());

    let token = manager
        .try_acquire()
        .map_err(|err| format!("acquire failed: {}", err))?;
    let content = std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
    if content != "4242" {
        return Err(format!("Unexpected lock content: {}", content));
    }
    if token.pid() != 4242 {
        return Err("Unexpected token pid".to_owned());
    }
    manager
        .release(token)
        .map_err(|err| format!("release failed: {}", err))?;
    Ok(())
}

#[test]
fn stale_lock_is_reclaimed_and_overwritten() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    for stale_pid in ["1", "99999", "31337\n"] {
        std::fs::write(&path, stale_pid).map_err(|err| format!("write failed: {}", err))?;
        let manager = LockManager::with_pid(path.clone(), 777, never_running());
        let token = manager
            .try_acquire()
            .map_err(|err| format!("acquire over {:?} failed: {}", stale_pid, err))?;
        let content =
            std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
        if content != "777" {
            return Err(format!("Expected own pid, got {}", content));
        }
        manager
            .release(token)
            .map_err(|err| format!("release failed: {}", err))?;
    }
    Ok(())
}

#[test]
fn live_holder_makes_lock_busy() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    std::fs::write(&path, "555").map_err(|err| format!("write failed: {}", err))?;
    let manager = LockManager::with_pid(path.clone(), 777, Box::new(|pid: u32| pid == 555));

    match manager.try_acquire() {
        Err(LockError::Busy { pid: 555 }) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected busy lock".to_owned()),
    }
    let content = std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
    if content != "555" {
        return Err("Busy lock file must not be overwritten".to_owned());
    }
    Ok(())
}

#[test]
fn own_pid_recorded_counts_as_busy() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    let own = std::process::id();
    std::fs::write(&path, own.to_string()).map_err(|err| format!("write failed: {}", err))?;
    let manager = LockManager::new(path, Box::new(OsProcessTable));

    match manager.try_acquire() {
        Err(LockError::Busy { pid }) if pid == own => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected busy lock for own pid".to_owned()),
    }
}

#[test]
fn unreadable_record_is_treated_as_stale() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    std::fs::write(&path, "not-a-pid").map_err(|err| format!("write failed: {}", err))?;
    let manager = LockManager::with_pid(path, 12, always_running());
    let token = manager
        .try_acquire()
        .map_err(|err| format!("acquire failed: {}", err))?;
    manager
        .release(token)
        .map_err(|err| format!("release failed: {}", err))?;
    Ok(())
}

#[test]
fn release_is_idempotent() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");

    remove_lock_file(&path).map_err(|err| format!("release of absent file failed: {}", err))?;

    let manager = LockManager::with_pid(path.clone(), 9, never_running());
    let token = manager
        .try_acquire()
        .map_err(|err| format!("acquire failed: {}", err))?;
    manager
        .release(token)
        .map_err(|err| format!("first release failed: {}", err))?;
    remove_lock_file(&path).map_err(|err| format!("second release failed: {}", err))?;
    if path.exists() {
        return Err("Lock file should be gone".to_owned());
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn os_table_reports_zero_pid_as_not_running() {
    assert!(!OsProcessTable.is_running(0));
    assert!(OsProcessTable.is_running(std::process::id()));
}

#[test]
fn second_manager_sees_first_holder() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    let first = LockManager::with_pid(path.clone(), 1001, always_running());
    let second = LockManager::with_pid(path.clone(), 1002, always_running());

    let token = first
        .try_acquire()
        .map_err(|err| format!("first acquire failed: {}", err))?;
    match second.try_acquire() {
        Err(LockError::Busy { pid: 1001 }) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Second manager took a held lock".to_owned()),
    }
    let content = std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
    if content != "1001" {
        return Err(format!("Lock record was overwritten: {}", content));
    }
    first
        .release(token)
        .map_err(|err| format!("release failed: {}", err))?;
    Ok(())
}

#[test]
fn creating_over_a_fresh_record_reports_its_holder() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("update.pid");
    std::fs::write(&path, "2002").map_err(|err| format!("write failed: {}", err))?;

    match create_lock_file(&path, 3003) {
        Err(LockError::Busy { pid: 2002 }) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(()) => return Err("Existing lock file was replaced".to_owned()),
    }
    let content = std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
    if content != "2002" {
        return Err(format!("Lock record was overwritten: {}", content));
    }
    Ok(())
}
