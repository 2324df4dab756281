//! check 子命令 - 校验图描述文件

use anyhow::Result;

use openmis_graph::load_graph;

pub fn run(graph_path: &str) -> Result<()> {
    let graph = load_graph(graph_path)?;
    println!(
        "graph ok: {} vertices, {} edges, connected",
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(())
}
