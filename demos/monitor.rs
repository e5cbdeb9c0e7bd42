//! Print decoded controller actions for an evdev node.
//!
//! ```text
//! cargo run --example monitor -- /dev/input/event5 [layout.toml]
//! ```

use deck_input::{ActionLogger, ControllerSet, EvdevSession, Layout};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let device = args
        .next()
        .ok_or("usage: monitor <device> [layout.toml]")?;
    let layout = match args.next() {
        Some(path) => Layout::load(path)?,
        None => Layout::default(),
    };

    let mut set = ControllerSet::new();
    set.add(EvdevSession::open_with_layout(&device, &layout)?);
    set.bind_deck(Arc::new(ActionLogger::new("left")))?;
    set.bind_deck(Arc::new(ActionLogger::new("right")))?;

    let mut fds = Vec::new();
    loop {
        set.poll_descriptors(&mut fds)?;
        if fds.is_empty() {
            break;
        }
        let n = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, 1000) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err.into());
        }
        for (index, err) in set.dispatch(&fds) {
            tracing::error!(index, %err, "controller dropped");
        }
    }

    set.release_all();
    Ok(())
}
