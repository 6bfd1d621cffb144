fn main() {
    if let Err(err) = click_dashboard::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
