fn main() {
    if let Err(err) = table_forge::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
