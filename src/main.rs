fn main() {
    if let Err(err) = sales_insights::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
