use anyhow::Result;

use ziggurat_bridge::engine::HostLog;
use ziggurat_bridge::logging::init_logging;
use ziggurat_bridge::window::{Runtime, RuntimeConfig};

mod engine;

use engine::SandboxEngine;

fn main() -> Result<()> {
    init_logging();

    let engine = SandboxEngine::new(48, 32, HostLog);

    Runtime::run(
        RuntimeConfig {
            title: "ziggurat viewer".to_string(),
            ..Default::default()
        },
        engine,
    )
}
