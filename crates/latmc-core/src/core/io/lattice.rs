//! Reading and writing one lattice as a file triplet keyed by a path prefix:
//! `{prefix}_info.dat` (node count and box), `{prefix}_crds.dat`
//! (coordinates), `{prefix}_net.dat` / `{prefix}_dual.dat` / `{prefix}_aux.dat`
//! (adjacency lists, one node per line, whitespace separated).

use super::IoError;
use crate::core::models::{Network, NetworkKind, Node};
use nalgebra::{Point2, Vector2};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    prefix.with_file_name(name)
}

fn read_to_string(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| IoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: std::str::FromStr>(token: &str, path: &Path, line: usize) -> Result<T, IoError> {
    token.parse().map_err(|_| IoError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("invalid value '{token}'"),
    })
}

/// Reads one adjacency list per line. `max_id` bounds same-lattice
/// references; cross-lattice (dual) references are bounded by the caller
/// once the partner network's size is known.
fn read_id_lists(
    path: &Path,
    num_nodes: usize,
    max_id: Option<usize>,
    required: bool,
) -> Result<Vec<Vec<usize>>, IoError> {
    if !required && !path.exists() {
        return Ok(vec![Vec::new(); num_nodes]);
    }
    let content = read_to_string(path)?;
    let mut lists = Vec::with_capacity(num_nodes);
    for (index, line) in content.lines().enumerate() {
        let mut ids = Vec::new();
        for token in line.split_whitespace() {
            let id: usize = parse(token, path, index + 1)?;
            if let Some(limit) = max_id {
                if id >= limit {
                    return Err(IoError::NodeOutOfRange {
                        path: path.to_path_buf(),
                        id,
                        count: limit,
                    });
                }
            }
            ids.push(id);
        }
        lists.push(ids);
    }
    if lists.len() != num_nodes {
        return Err(IoError::RecordCount {
            path: path.to_path_buf(),
            expected: num_nodes,
            got: lists.len(),
        });
    }
    Ok(lists)
}

/// Loads a network from its file triplet. The aux file may be absent, in
/// which case every aux list is empty.
pub fn read_network(prefix: &Path, kind: NetworkKind) -> Result<Network, IoError> {
    let info_path = suffixed(prefix, "_info.dat");
    let info = read_to_string(&info_path)?;
    let mut lines = info.lines();
    let num_nodes: usize = {
        let line = lines.next().unwrap_or_default();
        parse(line.trim(), &info_path, 1)?
    };
    let dims_line = lines.next().unwrap_or_default();
    let mut tokens = dims_line.split_whitespace();
    let lx: f64 = parse(tokens.next().unwrap_or_default(), &info_path, 2)?;
    let ly: f64 = parse(tokens.next().unwrap_or_default(), &info_path, 2)?;

    let crds_path = suffixed(prefix, "_crds.dat");
    let crds = read_to_string(&crds_path)?;
    let mut coords = Vec::with_capacity(num_nodes);
    for (index, line) in crds.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let x: f64 = parse(tokens.next().unwrap_or_default(), &crds_path, index + 1)?;
        let y: f64 = parse(tokens.next().unwrap_or_default(), &crds_path, index + 1)?;
        coords.push(Point2::new(x, y));
    }
    if coords.len() != num_nodes {
        return Err(IoError::RecordCount {
            path: crds_path,
            expected: num_nodes,
            got: coords.len(),
        });
    }

    let net_lists = read_id_lists(&suffixed(prefix, "_net.dat"), num_nodes, Some(num_nodes), true)?;
    let dual_lists = read_id_lists(&suffixed(prefix, "_dual.dat"), num_nodes, None, true)?;
    let aux_lists = read_id_lists(&suffixed(prefix, "_aux.dat"), num_nodes, None, false)?;

    let mut network = Network::new(kind, Vector2::new(lx, ly));
    for (id, ((coord, net_cnxs), (dual_cnxs, aux_cnxs))) in coords
        .into_iter()
        .zip(net_lists)
        .zip(dual_lists.into_iter().zip(aux_lists))
        .enumerate()
    {
        let mut node = Node::with_coord(id, coord);
        node.net_cnxs = net_cnxs;
        node.dual_cnxs = dual_cnxs;
        node.aux_cnxs = aux_cnxs;
        network.nodes.push(node);
    }
    network.refresh_descriptors();
    Ok(network)
}

/// Writes a network as its file triplet (aux lists included).
pub fn write_network(network: &Network, prefix: &Path) -> Result<(), IoError> {
    let write = |suffix: &str, content: String| -> Result<(), IoError> {
        let path = suffixed(prefix, suffix);
        let mut file = fs::File::create(&path).map_err(|source| IoError::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(content.as_bytes()).map_err(|source| IoError::Io {
            path,
            source,
        })
    };

    write(
        "_info.dat",
        format!(
            "{}\n{:.8} {:.8}\n",
            network.nodes.len(),
            network.dimensions.x,
            network.dimensions.y
        ),
    )?;

    let mut crds = String::new();
    let mut net = String::new();
    let mut dual = String::new();
    let mut aux = String::new();
    let join = |ids: &[usize]| {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };
    for node in &network.nodes {
        crds.push_str(&format!("{:.8} {:.8}\n", node.coord.x, node.coord.y));
        net.push_str(&join(&node.net_cnxs));
        net.push('\n');
        dual.push_str(&join(&node.dual_cnxs));
        dual.push('\n');
        aux.push_str(&join(&node.aux_cnxs));
        aux.push('\n');
    }
    write("_crds.dat", crds)?;
    write("_net.dat", net)?;
    write("_dual.dat", dual)?;
    write("_aux.dat", aux)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::build;

    #[test]
    fn write_then_read_preserves_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let (base, ring) = build::hexagonal_crystal(2, 4).unwrap();
        let prefix_a = dir.path().join("test_A");
        let prefix_b = dir.path().join("test_B");
        write_network(&base, &prefix_a).unwrap();
        write_network(&ring, &prefix_b).unwrap();

        let loaded_a = read_network(&prefix_a, NetworkKind::Base).unwrap();
        let loaded_b = read_network(&prefix_b, NetworkKind::Ring).unwrap();
        assert_eq!(loaded_a.nodes.len(), base.nodes.len());
        assert_eq!(loaded_b.nodes.len(), ring.nodes.len());
        for (orig, read) in base.nodes.iter().zip(&loaded_a.nodes) {
            assert_eq!(orig.net_cnxs, read.net_cnxs);
            assert_eq!(orig.dual_cnxs, read.dual_cnxs);
            assert!((orig.coord - read.coord).norm() < 1e-6);
        }
        assert_eq!(loaded_a.node_distribution, base.node_distribution);
        assert_eq!(loaded_b.edge_distribution, ring.edge_distribution);
    }

    #[test]
    fn missing_aux_file_yields_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _) = build::hexagonal_crystal(2, 4).unwrap();
        let prefix = dir.path().join("bare_A");
        write_network(&base, &prefix).unwrap();
        fs::remove_file(suffixed(&prefix, "_aux.dat")).unwrap();
        let loaded = read_network(&prefix, NetworkKind::Base).unwrap();
        assert!(loaded.nodes.iter().all(|n| n.aux_cnxs.is_empty()));
    }

    #[test]
    fn out_of_range_neighbour_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _) = build::hexagonal_crystal(2, 4).unwrap();
        let prefix = dir.path().join("broken_A");
        write_network(&base, &prefix).unwrap();
        fs::write(suffixed(&prefix, "_net.dat"), "999 1 2\n").unwrap();
        assert!(read_network(&prefix, NetworkKind::Base).is_err());
    }
}
