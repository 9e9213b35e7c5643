//! Console logging for the browser.

/// Install the panic hook and a `tracing` subscriber writing to the console.
///
/// Debug builds log at `DEBUG`, release builds at `INFO`. Safe to call more
/// than once; later calls leave the first subscriber in place.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub fn init_logging() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    console_error_panic_hook::set_once();

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}

/// No-op on non-WASM targets.
#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub fn init_logging() {}
