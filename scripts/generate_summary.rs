use anyhow::{Context, Result};
use obesity_dashboard::config::DEFAULT_OUTPUT_PATH;
use obesity_dashboard::services::report;
use std::path::Path;

fn main() -> Result<()> {
    // 检查数据文件是否存在
    let path = Path::new(DEFAULT_OUTPUT_PATH);
    if !path.exists() {
        anyhow::bail!("数据文件不存在，请先运行 'cargo run -- update'");
    }

    let document = report::load_document(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    print!("{}", report::render_report(&document, 5));
    println!("Update completed successfully!");

    Ok(())
}
