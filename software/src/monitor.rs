// Inbound data is opaque text meant for display. It is polled on a fixed
// cadence and each poll only takes what the port already buffered.

use log::warn;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::control::Controller;
use crate::settings::POLL_INTERVAL;

pub fn poll_once<W: Write>(controller: &mut Controller, out: &mut W) {
    match controller.poll_inbound() {
        Ok(Some(text)) => {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
        Ok(None) => {}
        Err(e) => warn!("Serial read error: {}", e),
    }
}

/// Polls for `duration`, used to catch replies after one-shot commands.
pub fn listen<W: Write>(controller: &mut Controller, duration: Duration, out: &mut W) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
        poll_once(controller, out);
    }
}

/// Background poller for the console. Takes the controller lock only for
/// the duration of one poll, so an upload in progress delays it.
pub fn spawn(controller: Arc<Mutex<Controller>>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(POLL_INTERVAL);
            let Ok(mut ctl) = controller.lock() else {
                warn!("Controller lock poisoned, stopping monitor");
                break;
            };
            poll_once(&mut ctl, &mut std::io::stdout());
        }
    })
}
