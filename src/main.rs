fn main() {
    if let Err(err) = parkwatch_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
