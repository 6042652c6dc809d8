//! Forced release of a TCP port before binding it.
//!
//! Whatever still listens on the configured port (a stale copy of this app,
//! some unrelated dev server) gets terminated so the bind that follows can
//! succeed. The whole step is best effort: callers log failures and bind anyway.

use crate::error::reclaim::ReclaimError;

use common::ErrorLocation;

use std::fmt::Debug;
use std::panic::Location;
use std::process;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo, TcpState, get_sockets_info,
};
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};

const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(3);
const INIT_PID: u32 = 1;

/// Capability to free a port held by another process.
///
/// Injected into the control server so tests can swap the real process killer
/// for [`NoopPortReclaimer`].
pub trait PortReclaimer: Debug + Send + Sync {
    /// Terminate processes listening on `port`, returning how many were stopped.
    fn reclaim(&self, port: u16) -> Result<usize, ReclaimError>;
}

/// Reclaimer that never touches other processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPortReclaimer;

impl PortReclaimer for NoopPortReclaimer {
    fn reclaim(&self, port: u16) -> Result<usize, ReclaimError> {
        trace!("Skipping port reclaim for {port}");
        Ok(0)
    }
}

/// Reclaimer that finds listeners via the OS socket table and kills them.
///
/// Never signals this process or PID 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortReclaimer;

impl PortReclaimer for SystemPortReclaimer {
    fn reclaim(&self, port: u16) -> Result<usize, ReclaimError> {
        let pids = listening_pids(port)?;

        if pids.is_empty() {
            debug!("No process listening on port {port}");
            return Ok(0);
        }

        let mut stopped = 0;
        let mut failed = Vec::new();

        for pid in pids {
            if pid == process::id() || pid == INIT_PID {
                debug!("Not reclaiming port {port} from protected PID {pid}");
                continue;
            }

            info!("Reclaiming port {port} from PID {pid}");
            if stop_pid(pid) {
                stopped += 1;
            } else {
                failed.push(pid);
            }
        }

        if !failed.is_empty() {
            return Err(ReclaimError::Kill {
                message: format!("Could not stop PIDs {failed:?} holding port {port}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(stopped)
    }
}

#[track_caller]
fn query_tcp_sockets() -> Result<Vec<SocketInfo>, ReclaimError> {
    get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    )
    .map_err(|e| ReclaimError::NetworkQuery {
        message: format!("Failed to query network sockets: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

/// PIDs owning a listening TCP socket on `port`, deduplicated.
#[track_caller]
pub(crate) fn listening_pids(port: u16) -> Result<Vec<u32>, ReclaimError> {
    let sockets = query_tcp_sockets()?;
    let mut pids = Vec::new();

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.state == TcpState::Listen
            && tcp.local_port == port
        {
            for pid in s.associated_pids {
                if !pids.contains(&pid) {
                    trace!("Found process {pid} listening on port {port}");
                    pids.push(pid);
                }
            }
        }
    }

    Ok(pids)
}

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    sys.process(Pid::from_u32(pid)).map(f)
}

/// Stop a process by PID.
///
/// Sends SIGTERM first, falls back to SIGKILL where SIGTERM is unsupported, then
/// polls with exponential backoff until the process is gone.
///
/// # Returns
///
/// * `true` - The process was terminated
/// * `false` - The process doesn't exist, is protected, or survived the wait
pub(crate) fn stop_pid(pid: u32) -> bool {
    if pid == INIT_PID || pid == process::id() {
        warn!("Refusing to stop protected PID {pid}");
        return false;
    }

    let signalled = with_process(pid, |p| {
        if let Some(sent) = p.kill_with(Signal::Term) {
            debug!("Sent SIGTERM to PID {pid}: success={sent}");
            sent
        } else {
            let killed = p.kill();
            debug!("Sent SIGKILL to PID {pid}: success={killed}");
            killed
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    });

    if !signalled {
        return false;
    }

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(KILL_VERIFY_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        if with_process(pid, |_| true).is_none() {
            debug!("Process {pid} terminated");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Process {pid} still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => {
                warn!("Process {pid} still running after {KILL_VERIFY_MAX_ELAPSED:?}");
                return false;
            }
        }
    }
}
