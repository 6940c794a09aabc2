//! Thin entrypoint for the copytool CLI; see `lib.rs` for the layout.

fn main() {
    std::process::exit(pilot_cli::run());
}
