fn main() {
    if let Err(err) = transmission_gate::cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
