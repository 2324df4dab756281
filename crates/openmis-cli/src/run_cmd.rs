//! run 子命令 - 执行一次完整的分布式 MIS 运行

use anyhow::Result;
use tracing::info;

use openmis_core::ProtocolConfig;
use openmis_graph::load_graph;
use openmis_runtime::MisRuntime;

pub async fn run(
    graph_path: &str,
    start: Option<String>,
    policy: &str,
    seed: Option<u64>,
    capacity: usize,
    json: bool,
) -> Result<()> {
    let graph = load_graph(graph_path)?;

    let mut config = ProtocolConfig::default()
        .with_selection(policy.parse()?)
        .with_channel_capacity(capacity);
    if let Some(start) = start {
        config = config.with_start_vertex(start);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let result = MisRuntime::new(graph).with_config(config).run().await?;
    info!("run {} finished in {} ms", result.run_id, result.elapsed_ms);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "MIS of {} vertices found in {} rounds ({} ms):",
            result.vertex_count,
            result.rounds(),
            result.elapsed_ms
        );
        println!("  {}", result.vertex_ids().join(", "));
    }
    Ok(())
}
