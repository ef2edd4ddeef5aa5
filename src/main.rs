fn main() -> anyhow::Result<()> {
    memegen::run()?;
    Ok(())
}
