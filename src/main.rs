fn main() -> Result<(), Box<dyn std::error::Error>> {
    bankchat::cli::main()
}
