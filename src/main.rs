use template_studio::App;

fn main() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) { log::Level::Debug } else { log::Level::Info };
    let _ = console_log::init_with_level(level);
    log::info!("template studio {}", env!("CARGO_PKG_VERSION"));
    leptos::mount::mount_to_body(App);
}
