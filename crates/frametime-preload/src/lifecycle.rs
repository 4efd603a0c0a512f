//! Load and unload hooks
//!
//! The dynamic loader runs `attach` before the host's `main` and `detach`
//! after it returns (or on `exit`). Attach either publishes a fully
//! resolved shim or terminates the process.

use frametime_core::error::FrameResult;
use frametime_core::{die, kdebug, kinfo, kprint, kwarn, TimingEngine};

use crate::config::ShimConfig;
use crate::entry_points::EntryPoints;
use crate::platform_linux::LinuxClock;
use crate::resolver;
use crate::sink::FileSink;
use crate::state::{self, Shim};

/// Build and publish the shim from `config`
pub fn try_attach(config: ShimConfig) -> FrameResult<&'static Shim> {
    config.validate()?;
    config.log_summary();

    let sink = FileSink::create(&config.output_path)?;
    resolver::real_dlsym()?;
    let entry_points = EntryPoints::resolve()?;
    let engine = TimingEngine::new(config.engine_config(), LinuxClock::new());

    let shim = match state::install(Shim::new(entry_points, engine, sink)) {
        Ok(shim) => shim,
        Err(_) => {
            kwarn!("attach ran twice; keeping the first instance");
            state::shim()
        }
    };
    kinfo!(
        "attached: {} timing, writing to {}",
        if config.gpu_timing { "GPU" } else { "CPU" },
        config.output_path
    );
    Ok(shim)
}

/// Process attach: configure from the environment, die on any failure
pub fn attach() {
    kprint::init();
    if let Err(e) = try_attach(ShimConfig::from_env()) {
        die!("{}", e);
    }
}

/// Process detach: close the log exactly once
pub fn detach() {
    match state::try_shim() {
        Some(shim) => {
            shim.finish();
            kdebug!("detached");
        }
        None => kdebug!("detach without attach"),
    }
}

#[cfg_attr(test, allow(dead_code))]
extern "C" fn on_load() {
    attach();
}

#[cfg_attr(test, allow(dead_code))]
extern "C" fn on_unload() {
    detach();
}

// Test binaries link this crate as an rlib; they must not attach
#[cfg(not(test))]
#[link_section = ".init_array"]
#[used]
static INIT: extern "C" fn() = on_load;

#[cfg(not(test))]
#[link_section = ".fini_array"]
#[used]
static FINI: extern "C" fn() = on_unload;
