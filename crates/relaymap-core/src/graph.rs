//! Graphviz DOT emission for a resolved deployment.
//!
//! The emitter only reads; it assumes a well-formed relay table and leaves
//! layout and rasterization to an external Graphviz engine. Relay iteration
//! is sorted by name so renders are reproducible whatever order the table
//! arrived in.

use std::fmt::Write as _;

use crate::models::Deployment;

/// How leaf endpoints are represented under each relay. Exactly one mode is
/// active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    /// One vertex per group value, labeled with the bucket count.
    #[default]
    Summary,
    /// One vertex per member leaf; group-value vertices are suppressed.
    Detail,
    /// Relay vertices and edges only.
    RelaysOnly,
}

/// Quote a DOT identifier, escaping embedded quotes and backslashes.
fn quoted(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 2);
    out.push('"');
    for ch in id.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Emit the deployment as Graphviz DOT source.
///
/// Relays are red `box3d` vertices labeled with their unique-endpoint count,
/// each with an edge to its parent. The root's conventional self-edge is
/// suppressed rather than drawn as a cycle. Dangling parents still get their
/// edge, which renders as an unadorned vertex for the unseen node.
pub fn emit_dot(deployment: &Deployment, mode: GroupMode) -> String {
    let config = &deployment.config;
    let mut dot = String::new();

    let _ = writeln!(
        dot,
        "digraph {} {{",
        quoted(&format!("{}:{}", config.server, config.port))
    );
    dot.push_str("    concentrate=true;\n");
    dot.push_str("    fontsize=14;\n");
    dot.push_str("    ratio=auto;\n");
    dot.push_str("    rankdir=BT;\n");
    dot.push_str("    node [fontsize=\"10.0\", fontname=\"Arial\"];\n");

    let mut names: Vec<&String> = deployment.relays.keys().collect();
    names.sort();

    for name in names {
        let node = &deployment.relays[name];
        let _ = writeln!(
            dot,
            "    {} [color=red, shape=box3d, root={}, label={}];",
            quoted(name),
            node.is_root(),
            quoted(&format!(
                "{} - {} unique endpoints",
                name, node.unique_endpoints
            ))
        );
        if node.parent != *name {
            let _ = writeln!(
                dot,
                "    {} -> {} [penwidth=1.5];",
                quoted(name),
                quoted(&node.parent)
            );
        }

        match mode {
            GroupMode::RelaysOnly => {}
            GroupMode::Detail => {
                for bucket in node.groups.values() {
                    for member in &bucket.members {
                        let _ = writeln!(
                            dot,
                            "    {} [color=blue, shape=component];",
                            quoted(&member.name)
                        );
                        let _ = writeln!(
                            dot,
                            "    {} -> {} [penwidth=1.5];",
                            quoted(&member.name),
                            quoted(name)
                        );
                    }
                }
            }
            GroupMode::Summary => {
                for (value, bucket) in &node.groups {
                    let _ = writeln!(
                        dot,
                        "    {} [color=green, shape=box, label={}];",
                        quoted(value),
                        quoted(&format!(
                            "{} {} - {} endpoints",
                            config.group_property, value, bucket.count
                        ))
                    );
                    let _ = writeln!(
                        dot,
                        "    {} -> {} [penwidth=1.5];",
                        quoted(value),
                        quoted(name)
                    );
                }
            }
        }
    }

    dot.push_str("}\n");
    dot
}
