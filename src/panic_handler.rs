use std::io::{self, Write};
use std::panic;

/// Install the process panic hook.
///
/// Debug builds get `better_panic` backtraces; release builds write a
/// `human_panic` crash report. Either way stdout is flushed first so partial
/// command output is not interleaved with the report. The render worker exits
/// on its own once its channels disconnect.
pub fn initialize_panic_handler() {
    if cfg!(debug_assertions) {
        better_panic::install();
    } else {
        human_panic::setup_panic!();
    }

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = io::stdout().flush();
        log::error!("panic: {panic_info}");

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
