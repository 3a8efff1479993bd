fn main() {
    if let Err(err) = flowband::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
