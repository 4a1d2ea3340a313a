//! Square edge network shared by every strategy run.
//!
//! A `SIDE × SIDE` grid of base stations spaced `SPACING` apart, each linked
//! to its grid neighbours and hosting a small cloudlet.  The four corner
//! stations also link to a backhaul hub that hosts the central cloud.

use anyhow::Result;

use mec_core::{NodeId, Vec2};
use mec_network::NetworkBuilder;
use mec_resource::{CloudNetwork, CloudSpec};

pub const SIDE:              usize = 4;
pub const SPACING:           f64   = 10.0;
pub const CLOUDLET_CAPACITY: f64   = 4.0;

/// Build the grid and its clouds.  The central cloud is `CloudId(0)`.
pub fn build_network() -> Result<CloudNetwork> {
    let mut b = NetworkBuilder::new();

    let mut stations: Vec<NodeId> = Vec::with_capacity(SIDE * SIDE);
    for row in 0..SIDE {
        for col in 0..SIDE {
            let pos = Vec2::new(col as f64 * SPACING, row as f64 * SPACING);
            // Outer ring stations have a slower radio link.
            let edge = row == 0 || col == 0 || row == SIDE - 1 || col == SIDE - 1;
            let bs = if edge { b.add_base_station(pos, 2.0)? } else { b.add_default_base_station(pos) };
            stations.push(bs);
        }
    }

    let at = |row: usize, col: usize| stations[row * SIDE + col];
    for row in 0..SIDE {
        for col in 0..SIDE {
            if col + 1 < SIDE {
                b.add_unit_link(at(row, col), at(row, col + 1))?;
            }
            if row + 1 < SIDE {
                b.add_unit_link(at(row, col), at(row + 1, col))?;
            }
        }
    }

    let centre = (SIDE - 1) as f64 * SPACING / 2.0;
    let hub = b.add_node(Some(Vec2::new(centre, centre)));
    for corner in [at(0, 0), at(0, SIDE - 1), at(SIDE - 1, 0), at(SIDE - 1, SIDE - 1)] {
        b.add_link(corner, hub, 2.0)?;
    }

    let mut specs = vec![CloudSpec::central(hub)];
    specs.extend(stations.iter().map(|&bs| CloudSpec::cloudlet(bs, CLOUDLET_CAPACITY)));
    Ok(CloudNetwork::new(b.build(), &specs)?)
}
