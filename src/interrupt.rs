#![allow(unsafe_code)]

use std::sync::Mutex;

lazy_static! {
    static ref CLEANUP: Mutex<Option<Box<dyn Fn() + Send>>> = Mutex::new(None);
}

/// Calls `handler` on the first SIGINT or SIGTERM.
///
/// The signals are masked for the calling thread and every thread started
/// after it, and collected by a dedicated thread instead. A second signal
/// gets its default disposition back and is re-raised, which normally
/// kills the process.
#[cfg(unix)]
pub fn install_handler<F>(handler: F) -> crate::error::Result<()>
where
    F: Fn() + 'static + Send,
{
    use nix::sys::signal::{SigSet, SIGINT, SIGTERM};
    use std::thread;

    let mut mask = SigSet::empty();
    mask.add(SIGTERM);
    mask.add(SIGINT);
    mask.thread_set_mask()
        .map_err(crate::process::from_nix_error)?;

    set_handler(handler);

    thread::spawn(move || {
        let mut interrupted = false;

        loop {
            let sig = match mask.wait() {
                Ok(sig) => sig,
                Err(err) => {
                    error!("Unable to wait for signals: {}", err);
                    return;
                }
            };
            debug!("Received {:?}", sig);

            if !interrupted {
                interrupted = true;
                invoke();
                continue;
            }

            reraise(sig);
        }
    });

    Ok(())
}

#[cfg(unix)]
fn reraise(sig: nix::sys::signal::Signal) {
    use nix::sys::signal::{raise, sigaction, SaFlags, SigAction, SigHandler, SigSet};

    let default_action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe {
        let _ = sigaction(sig, &default_action);
    }

    let mut unmask = SigSet::empty();
    unmask.add(sig);
    let _ = unmask.thread_unblock();
    let _ = raise(sig);
    let _ = unmask.thread_block();
}

/// Calls `handler` on each console control event (Ctrl-C, Ctrl-Break,
/// console close).
#[cfg(windows)]
pub fn install_handler<F>(handler: F) -> crate::error::Result<()>
where
    F: Fn() + 'static + Send,
{
    use winapi::shared::minwindef::{BOOL, DWORD, TRUE};
    use winapi::um::consoleapi::SetConsoleCtrlHandler;

    unsafe extern "system" fn ctrl_handler(_: DWORD) -> BOOL {
        invoke();

        TRUE
    }

    set_handler(handler);

    let installed = unsafe { SetConsoleCtrlHandler(Some(ctrl_handler), TRUE) };
    if installed == 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(())
}

fn invoke() {
    match CLEANUP.lock() {
        Ok(guard) => {
            if let Some(ref handler) = *guard {
                handler()
            }
        }
        Err(_) => error!("Interrupt handler lock poisoned"),
    }
}

fn set_handler<F>(handler: F)
where
    F: Fn() + 'static + Send,
{
    match CLEANUP.lock() {
        Ok(mut guard) => *guard = Some(Box::new(handler)),
        Err(poisoned) => *poisoned.into_inner() = Some(Box::new(handler)),
    }
}
