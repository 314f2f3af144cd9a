//! Similarity matrix and graph analysis.
//!
//! snploc similarity --input sims_010.json --input sims_025.json \
//!     [--matrix-out m.tsv --edges-out e.tsv]
//!
//! Prints the connectivity/clique report the exploratory scripts used to
//! produce; TSV exports replace the interactive plots.

use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use snploc_core::simgraph::{self, LabelMode, SimilarityGraph, SimilarityMatrix};

#[derive(Args)]
pub struct SimilarityArgs {
    /// Similarity JSON file (repeatable)
    #[arg(long, required = true)]
    input: Vec<PathBuf>,

    /// Distance cutoff for graph edges
    #[arg(long, default_value = "1.0")]
    cutoff: f64,

    /// Label nodes by the first whitespace token of the record name
    #[arg(long)]
    first_token_labels: bool,

    /// Write the dense matrix TSV (single --input only)
    #[arg(long)]
    matrix_out: Option<PathBuf>,

    /// Write the graph edge list TSV (single --input only)
    #[arg(long)]
    edges_out: Option<PathBuf>,
}

pub fn run(args: SimilarityArgs) -> Result<()> {
    if args.input.len() > 1 && (args.matrix_out.is_some() || args.edges_out.is_some()) {
        anyhow::bail!("--matrix-out/--edges-out require a single --input");
    }

    let label_mode = if args.first_token_labels {
        LabelMode::FirstToken
    } else {
        LabelMode::Full
    };

    let mut graphs = Vec::new();
    for path in &args.input {
        let matrix = SimilarityMatrix::load(path)?;
        info!(
            "{}: {} records, max similarity {:.4}",
            path.display(),
            matrix.n(),
            matrix.max_similarity()
        );

        if let Some(ref out) = args.matrix_out {
            let file = std::fs::File::create(out)?;
            let mut writer = BufWriter::new(file);
            matrix.write_tsv(&mut writer)?;
            info!("Matrix written to {}", out.display());
        }

        let graph = SimilarityGraph::from_matrix(&matrix, label_mode, args.cutoff);

        if let Some(ref out) = args.edges_out {
            let file = std::fs::File::create(out)?;
            let mut writer = BufWriter::new(file);
            graph.write_edge_list(&mut writer)?;
            info!("Edge list written to {}", out.display());
        }

        graphs.push((path.display().to_string(), graph));
    }

    for (name, graph) in &graphs {
        println!("=> Analyzing connectivity {}", name);
        print_connectivity(graph);

        let core = graph.without_isolates();
        let cliques = core.maximal_cliques();
        println!("=> Analyzing cliques {}", name);
        println!("{} maximal cliques found", cliques.len());
        for (i, clique) in cliques.iter().enumerate() {
            let labels: Vec<&str> = clique.iter().map(|&n| core.labels()[n].as_str()).collect();
            println!(".. [{}] {} nodes: {}", i + 1, clique.len(), labels.join(", "));
        }
        println!();
    }

    if graphs.len() > 1 {
        let only_graphs: Vec<SimilarityGraph> =
            graphs.iter().map(|(_, g)| g.clone()).collect();
        if simgraph::same_isolates(&only_graphs) {
            println!("All similarity files produce the same set of isolated nodes");
        } else {
            println!("Isolated node sets differ between similarity files");
        }
    }

    Ok(())
}

fn print_connectivity(graph: &SimilarityGraph) {
    let components = graph.connected_components();
    let isolated = components.iter().filter(|c| c.len() == 1).count();
    let connected: Vec<&Vec<usize>> = components.iter().filter(|c| c.len() > 1).collect();

    println!(
        "{} nodes, {} edges",
        graph.n_nodes(),
        graph.n_edges()
    );
    println!("{} connected components", components.len());
    println!("{} isolated components", isolated);
    println!("{} not isolated components:", connected.len());
    for (i, nodes) in connected.iter().enumerate() {
        println!(".. [{}] {} nodes", i + 1, nodes.len());
    }
}
