//! Panic handler that leaves the display in a closed state.
//!
//! This module provides a custom panic hook that:
//! - Logs the panic location and message plus the live loop statistics
//! - Closes the registered display so the screen is not left mid-frame
//! - Preserves the original panic behavior after cleanup
//!
//! Panic hooks must be `'static`, so the display and the statistics callback
//! live in a global registry.

use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::sync::{Mutex, OnceLock};

use crate::display::Display;
use crate::live::LoopStatsSnapshot;

static PANIC_REGISTRY: OnceLock<Mutex<PanicRegistry>> = OnceLock::new();

#[derive(Default)]
struct PanicRegistry {
    display: Option<Display>,
    stats_callback: Option<Box<dyn Fn() -> LoopStatsSnapshot + Send + Sync>>,
}

/// Initialize the panic handler.
///
/// Call once early in startup; it chains to the previously installed hook.
pub fn init() {
    let _ = PANIC_REGISTRY.get_or_init(|| Mutex::new(PanicRegistry::default()));

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        handle_panic(info);
        original_hook(info);
    }));
}

/// Register the display to close on panic.
pub fn register_display(display: Display) {
    if let Some(registry) = PANIC_REGISTRY.get() {
        if let Ok(mut guard) = registry.lock() {
            guard.display = Some(display);
        }
    }
}

/// Forget the registered display after a normal shutdown.
pub fn unregister_display() {
    if let Some(registry) = PANIC_REGISTRY.get() {
        if let Ok(mut guard) = registry.lock() {
            guard.display = None;
        }
    }
}

/// Set the callback used to capture loop statistics on panic.
pub fn set_stats_callback<F>(callback: F)
where
    F: Fn() -> LoopStatsSnapshot + Send + Sync + 'static,
{
    if let Some(registry) = PANIC_REGISTRY.get() {
        if let Ok(mut guard) = registry.lock() {
            guard.stats_callback = Some(Box::new(callback));
        }
    }
}

fn handle_panic(info: &PanicHookInfo<'_>) {
    // Logging may be broken, write to stderr directly
    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "━━━ regiontrack panic ━━━");
    if let Some(location) = info.location() {
        let _ = writeln!(
            stderr,
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    if let Some(message) = info.payload().downcast_ref::<&str>() {
        let _ = writeln!(stderr, "Message: {}", message);
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        let _ = writeln!(stderr, "Message: {}", message);
    }

    let Some(registry) = PANIC_REGISTRY.get() else {
        return;
    };
    // A panic while the registry is held must not deadlock the hook
    let Ok(guard) = registry.try_lock() else {
        let _ = writeln!(stderr, "Panic registry busy; skipping cleanup");
        return;
    };

    if let Some(ref callback) = guard.stats_callback {
        let snapshot = callback();
        let _ = writeln!(stderr, "Ticks:            {}", snapshot.ticks);
        let _ = writeln!(stderr, "Renders:          {}", snapshot.renders);
        let _ = writeln!(stderr, "Region changes:   {}", snapshot.region_changes);
        let _ = writeln!(stderr, "Transient errors: {}", snapshot.transient_errors);
        let _ = writeln!(stderr, "Display failures: {}", snapshot.display_failures);
    }

    match guard.display {
        Some(ref display) => {
            let closed = display.close();
            let _ = writeln!(
                stderr,
                "Display: {}",
                if closed { "closed" } else { "already closed" }
            );
        }
        None => {
            let _ = writeln!(stderr, "Display: none registered");
        }
    }

    let _ = stderr.flush();
}
