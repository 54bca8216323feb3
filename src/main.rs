use anyhow::Result;

fn main() -> Result<()> {
    remake::cli::run()?;
    Ok(())
}
