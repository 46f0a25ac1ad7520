use anyhow::Context;
use pressroom_core::paths;
use std::path::Path;

pub fn run(root: &Path, port: u16) -> anyhow::Result<()> {
    if !paths::is_initialized(root) {
        anyhow::bail!(
            "no pressroom data directory at {} (run `pressroom init` first)",
            root.display()
        );
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(pressroom_server::serve(root.to_path_buf(), port))
}
