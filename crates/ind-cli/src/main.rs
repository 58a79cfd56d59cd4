fn main() -> anyhow::Result<()> {
    ind_cli::run()
}
