// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Serial device accessed through the modem-control ioctls.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use tracing::debug;

use trigger_core::port::{ControlPort, PortError, PortFuture, PortOp, PortResult};
use trigger_core::ControlLines;

/// An open tty. Line settings (baud, parity, framing) are left untouched.
#[derive(Debug)]
pub struct TtyPort {
    file: File,
    path: String,
}

impl TtyPort {
    /// Open `path` read/write without making it our controlling terminal.
    pub fn open(path: impl AsRef<Path>) -> PortResult<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| open_error(shown.clone(), e))?;
        debug!("Opened {}", shown);
        Ok(Self {
            file,
            path: shown,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn open_error(path: String, source: io::Error) -> PortError {
    match source.raw_os_error() {
        Some(libc::ENOENT | libc::ENXIO | libc::ENODEV) => PortError::NotFound(path),
        Some(libc::EACCES | libc::EPERM) => PortError::PermissionDenied(path),
        Some(libc::EBUSY) => PortError::Busy(path),
        _ => PortError::Open { path, source },
    }
}

fn get_lines(fd: RawFd) -> io::Result<ControlLines> {
    let mut bits: libc::c_int = 0;
    // SAFETY: TIOCMGET stores one c_int through the pointer.
    let rc = unsafe { libc::ioctl(fd, libc::TIOCMGET, &mut bits as *mut libc::c_int) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(ControlLines::from_bits_retain(bits as u32))
}

fn set_lines(fd: RawFd, lines: ControlLines) -> io::Result<()> {
    let bits = lines.bits() as libc::c_int;
    // SAFETY: TIOCMSET reads one c_int through the pointer.
    let rc = unsafe { libc::ioctl(fd, libc::TIOCMSET, &bits as *const libc::c_int) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn wait_lines(fd: RawFd, mask: ControlLines) -> io::Result<()> {
    let arg = mask.inputs().bits() as libc::c_ulong;
    loop {
        // SAFETY: TIOCMIWAIT takes the line mask by value.
        let rc = unsafe { libc::ioctl(fd, libc::TIOCMIWAIT, arg) };
        if rc != -1 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn wait_lines(_fd: RawFd, _mask: ControlLines) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "TIOCMIWAIT is not available on this platform, use polling",
    ))
}

impl ControlPort for TtyPort {
    fn read_lines<'a>(&'a mut self) -> PortFuture<'a, ControlLines> {
        let result = get_lines(self.file.as_raw_fd()).map_err(|e| PortError::io(PortOp::ReadLines, e));
        Box::pin(std::future::ready(result))
    }

    fn write_lines<'a>(&'a mut self, lines: ControlLines) -> PortFuture<'a, ()> {
        let result =
            set_lines(self.file.as_raw_fd(), lines).map_err(|e| PortError::io(PortOp::WriteLines, e));
        Box::pin(std::future::ready(result))
    }

    fn wait_for_change<'a>(&'a mut self, mask: ControlLines) -> PortFuture<'a, ()> {
        Box::pin(async move {
            // The wait blocks in the driver, so it gets its own descriptor
            // and a blocking thread; the loop just awaits it.
            let file = self
                .file
                .try_clone()
                .map_err(|e| PortError::io(PortOp::WaitForChange, e))?;
            tokio::task::spawn_blocking(move || wait_lines(file.as_raw_fd(), mask))
                .await
                .map_err(|e| PortError::io(PortOp::WaitForChange, io::Error::other(e)))?
                .map_err(|e| PortError::io(PortOp::WaitForChange, e))
        })
    }
}
