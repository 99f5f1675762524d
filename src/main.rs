fn main() -> anyhow::Result<()> {
    sleeplog::cli::run()
}
