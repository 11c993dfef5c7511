// src/commands/list.rs
//! Installed addon listing

use addonctl::{DependencyAnalyzer, PackRelationship, Server};
use anyhow::{Context, Result};
use std::path::Path;

/// List installed packs, optionally grouped or as a dependency tree
pub fn cmd_list(
    server_root: &Path,
    json: bool,
    grouped: bool,
    tree: bool,
    standalone_only: bool,
    roots_only: bool,
) -> Result<()> {
    let server = Server::open(server_root)
        .with_context(|| format!("failed to open server at {}", server_root.display()))?;

    if grouped || tree || standalone_only || roots_only {
        return list_with_dependencies(&server, json, grouped, tree, standalone_only, roots_only);
    }

    if json {
        let packs = server
            .installed_packs_with_dependencies()
            .context("failed to list installed packs")?;
        println!("{}", serde_json::to_string_pretty(&packs)?);
        return Ok(());
    }

    let packs = server
        .installed_packs()
        .context("failed to list installed packs")?;

    if packs.is_empty() {
        println!("No addons installed.");
        return Ok(());
    }

    println!(
        "{:<30} {:<38} {:<10} {}",
        "NAME", "UUID", "VERSION", "TYPE"
    );
    for pack in &packs {
        let name = if pack.name.is_empty() {
            "(unknown)"
        } else {
            pack.name.as_str()
        };
        println!(
            "{:<30} {:<38} {:<10} {}",
            name,
            pack.pack_id,
            pack.version.to_string(),
            pack.pack_type
        );
    }
    println!("\n{} pack(s) installed", packs.len());

    Ok(())
}

fn list_with_dependencies(
    server: &Server,
    json: bool,
    grouped: bool,
    tree: bool,
    standalone_only: bool,
    roots_only: bool,
) -> Result<()> {
    let analyzer = DependencyAnalyzer::new(server);
    let analysis = analyzer.analyze().context("dependency analysis failed")?;

    for warning in &analysis.warnings {
        eprintln!("WARNING: {}", warning);
    }

    let group = &analysis.group;

    if json {
        let payload = serde_json::json!({
            "root_packs": section(&group.root_packs),
            "dependent_packs": section(&group.dependent_packs),
            "standalone_packs": section(&group.standalone_packs),
            "circular_groups": group
                .circular_groups
                .iter()
                .map(|cycle| section(cycle))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if standalone_only {
        print_section("Standalone packs", &group.standalone_packs);
        return Ok(());
    }
    if roots_only {
        print_section("Root packs", &group.root_packs);
        return Ok(());
    }

    if tree {
        let tree_map = DependencyAnalyzer::dependency_tree(group);
        for (root_id, children) in &tree_map {
            let label = group
                .all_packs()
                .find(|rel| rel.pack.pack_id == *root_id)
                .map(|rel| rel.pack.name.clone())
                .unwrap_or_else(|| root_id.clone());
            println!("{} ({})", label, root_id);
            for child in children {
                println!("  └─ {} ({})", child.pack.name, child.pack.pack_id);
            }
        }
        if !group.circular_groups.is_empty() {
            println!("\nCircular dependencies:");
            for cycle in &group.circular_groups {
                let names: Vec<&str> = cycle.iter().map(|r| r.pack.name.as_str()).collect();
                println!("  {} (cycle)", names.join(" -> "));
            }
        }
        return Ok(());
    }

    if grouped {
        print_section("Root packs", &group.root_packs);
        print_section("Dependent packs", &group.dependent_packs);
        print_section("Standalone packs", &group.standalone_packs);
        if !group.circular_groups.is_empty() {
            println!("Circular groups:");
            for cycle in &group.circular_groups {
                let names: Vec<&str> = cycle.iter().map(|r| r.pack.name.as_str()).collect();
                println!("  {}", names.join(" -> "));
            }
            println!();
        }
    }

    Ok(())
}

fn print_section(title: &str, packs: &[PackRelationship]) {
    println!("{}:", title);
    if packs.is_empty() {
        println!("  (none)");
    }
    for rel in packs {
        println!(
            "  {} ({}, v{})",
            rel.pack.name, rel.pack.pack_id, rel.pack.version
        );
        for dep in &rel.dependencies {
            println!("    depends on: {}", dep);
        }
        for missing in &rel.missing_dependencies {
            println!("    missing dependency: {}", missing);
        }
    }
    println!();
}

fn section(packs: &[PackRelationship]) -> Vec<serde_json::Value> {
    packs
        .iter()
        .map(|rel| {
            serde_json::json!({
                "pack": rel.pack,
                "dependencies": rel.dependencies,
                "dependents": rel.dependents,
                "missing_dependencies": rel.missing_dependencies,
                "modules": rel.modules,
            })
        })
        .collect()
}
