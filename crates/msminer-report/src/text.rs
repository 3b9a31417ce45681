use colored::Colorize;

use msminer_core::analysis::TopologyAnalysis;
use msminer_core::keywords::Category;
use msminer_core::metrics::GraphMetrics;

/// Format analyses of every located descriptor for terminal output.
pub fn format_report(analyses: &[TopologyAnalysis]) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "msminer - Topology Analysis".bold()));
    out.push_str(&format!("{}\n", "=".repeat(40)));

    if analyses.is_empty() {
        out.push_str(&format!(
            "\n{}\n\n",
            "No topology descriptors found.".yellow().bold()
        ));
        return out;
    }

    for analysis in analyses {
        out.push_str(&format_analysis(analysis));
    }
    out.push('\n');
    out
}

/// Format a single descriptor analysis.
pub fn format_analysis(analysis: &TopologyAnalysis) -> String {
    let mut out = String::new();

    let title = analysis.path.as_deref().unwrap_or("<descriptor>");
    out.push_str(&format!("\n{}\n{}\n", title.bold(), "-".repeat(40)));

    if analysis.service_count == 0 {
        out.push_str(&format!("  {}\n", "No services declared.".yellow()));
        return out;
    }

    out.push_str(&format!(
        "{}: {} services\n",
        "Summary".bold(),
        analysis.service_count
    ));

    for service in &analysis.services {
        let kind = if service.is_infrastructure() {
            "infra".blue().to_string()
        } else {
            "micro".green().to_string()
        };
        let tags: Vec<String> = service
            .category_matches
            .iter()
            .map(|(category, keyword)| format!("{category}:{keyword}"))
            .collect();
        out.push_str(&format!("  [{kind}] {}", service.name));
        if !service.image_identifier.is_empty() {
            out.push_str(&format!(" ({})", service.image_identifier));
        }
        if !tags.is_empty() {
            out.push_str(&format!(" {}", tags.join(", ").dimmed()));
        }
        out.push('\n');
        if !service.declared_dependencies.is_empty() {
            out.push_str(&format!(
                "      -> {}\n",
                service.declared_dependencies.join(", ")
            ));
        }
    }

    let dbs = analysis.database_names();
    if !dbs.is_empty() {
        let shared = if analysis.shared_database {
            "shared".red().bold().to_string()
        } else {
            "not shared".green().to_string()
        };
        out.push_str(&format!(
            "{}: {} ({shared})\n",
            "Databases".bold(),
            dbs.join(", ")
        ));
    }

    out.push_str(&format_graph("Full graph", &analysis.full_graph_metrics));
    out.push_str(&format_graph(
        "Microservice graph",
        &analysis.microservice_graph_metrics,
    ));

    let languages: Vec<&str> = analysis
        .services
        .iter()
        .filter_map(|s| s.matched(Category::Language))
        .collect();
    if !languages.is_empty() {
        out.push_str(&format!("{}: {}\n", "Runtimes".bold(), languages.join(", ")));
    }

    out
}

fn format_graph(label: &str, metrics: &GraphMetrics) -> String {
    let path = match metrics.longest_path_length.as_finite() {
        Some(n) => n.to_string(),
        None => "inf".red().to_string(),
    };
    let acyclic = if metrics.is_acyclic {
        "acyclic".green().to_string()
    } else {
        "cyclic".red().to_string()
    };
    format!(
        "{}: {} nodes, {} edges, avg deps {:.2}, {acyclic}, longest path {path}\n",
        label.bold(),
        metrics.node_count,
        metrics.edge_count,
        metrics.avg_out_degree,
    )
}
