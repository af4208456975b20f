fn main() {
    let args: Vec<String> = std::env::args().collect();
    match garrison::run(&args) {
        Ok(service) => {
            garrison::telemetry::logging::log_game(&format!(
                "garrison service ready, {} garrisons loaded",
                service.loaded()
            ));
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
