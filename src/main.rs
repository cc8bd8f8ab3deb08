fn main() -> anyhow::Result<()> {
    renderware::cli::run_cli()
}
