fn main() -> Result<(), Box<dyn std::error::Error>> {
    stride::runtime::run()
}
